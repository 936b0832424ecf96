//! Text-generation adapters.

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatibleGenerator;
pub use scripted::{RecordedCall, ScriptedGenerator};
