// src/report/mod.rs
pub mod models;
pub mod source;

// Re-export key report types for convenience
pub use models::{
    Bureau,
    BureauReport,
    EvaluationMode,
    EvaluationResult,
    ExtractedFields,
    FlagSet,
    LateCounts,
    Status,
};
pub use source::{load_document, TextSource};
