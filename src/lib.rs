// src/lib.rs
pub mod extractors;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod storage;
pub mod utils;

pub use pipeline::{evaluate_text, process_file};
pub use report::{Bureau, EvaluationMode, EvaluationResult, ExtractedFields, FlagSet, Status};
pub use utils::{AppError, FailureReason};
