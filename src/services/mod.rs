//! Report pipeline services, leaf-first.

pub mod fallback_action;
pub mod generation_client;
pub mod input_assembler;
pub mod numeric;
pub mod output_extraction;
pub mod prompt_contract;
pub mod report_gateway;
pub mod report_pipeline;
pub mod report_validator;
pub mod retry_controller;
pub mod visit_normalizer;
pub mod visit_resolver;

pub use fallback_action::{build_fallback_next_action, fallback_report, FallbackActionGenerator, FallbackCategory};
pub use generation_client::GenerationClient;
pub use output_extraction::{extract, ExtractedOutput};
pub use prompt_contract::PromptContract;
pub use report_gateway::{ReportGateway, SavedReport};
pub use report_pipeline::ReportPipeline;
pub use report_validator::{ReportValidator, Verdict, Violation};
pub use retry_controller::{ControllerOutcome, ControllerState, RetryController};
pub use visit_normalizer::VisitNormalizer;
pub use visit_resolver::{Resolution, VisitResolver};
