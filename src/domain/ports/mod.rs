//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - TextGenerator: the external text-generation capability
//! - VisitStore: read access to recorded visits
//! - ReportStore: report persistence
//!
//! The pipeline services only depend on these traits, so tests can inject
//! doubles without any process-wide stubbing.

pub mod report_store;
pub mod text_generator;
pub mod visit_store;

pub use report_store::ReportStore;
pub use text_generator::TextGenerator;
pub use visit_store::VisitStore;
