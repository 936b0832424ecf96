//! Domain layer for the post-treatment report pipeline.
//!
//! This module contains the visit/report models, the ports to external
//! capabilities (text generation, visit store, report store) and the error type.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
