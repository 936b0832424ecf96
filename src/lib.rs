//! salon-report - post-treatment reports for wellness salon visits
//!
//! Turns a visit's before/after HRV measurements and self-reported wellbeing
//! into a customer-facing report plus one concrete next action, using an
//! external text-generation backend under a strict output contract with a
//! bounded retry and deterministic fallbacks.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): the report pipeline and its stages
//! - **Adapters** (`adapters`): SQLite stores and text-generation backends
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use salon_report::adapters::generators::OpenAiCompatibleGenerator;
//! use salon_report::adapters::sqlite::{create_migrated_test_pool, SqliteReportRepository, SqliteVisitRepository};
//! use salon_report::{Config, GenerateReportRequest, ReportPipeline};
//!
//! let config = Config::default();
//! let pool = create_migrated_test_pool().await?;
//! let pipeline = ReportPipeline::new(
//!     Arc::new(SqliteVisitRepository::new(pool.clone())),
//!     Arc::new(SqliteReportRepository::new(pool)),
//!     Arc::new(OpenAiCompatibleGenerator::new(config.generation.clone())?),
//!     &config,
//! );
//! let outcome = pipeline.generate_report(&GenerateReportRequest::for_customer(customer_id)).await;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, FallbackData, GenerateReportRequest, PersistenceStatus, ReportInput, ReportOutcome, ReportRecord,
    VisitRecord,
};
pub use domain::ports::{ReportStore, TextGenerator, VisitStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::ReportPipeline;
