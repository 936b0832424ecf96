//! Domain models.

pub mod config;
pub mod generation;
pub mod measurement;
pub mod report;
pub mod report_input;
pub mod visit;

pub use config::{
    Config, DatabaseConfig, DuplicatePhasePolicy, FallbackConfig, GenerationConfig, LoggingConfig,
    NormalizerConfig, Strictness, ValidationConfig,
};
pub use generation::{AttemptSummary, ContractVariant, ExtractionStrategy};
pub use measurement::{Measurement, Phase, SelfReport};
pub use report::{
    FallbackData, GenerateReportRequest, InputUsage, PersistenceStatus, ReportOutcome, ReportRecord,
};
pub use report_input::{ComputedDeltas, InterpretationNote, PreviousSnapshot, ReportInput, TodaySnapshot};
pub use visit::{MeasurementRow, NormalizedVisit, SelfReportRow, VisitRecord};
