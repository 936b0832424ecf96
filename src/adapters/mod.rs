//! Infrastructure adapters for external systems.

pub mod generators;
pub mod sqlite;
