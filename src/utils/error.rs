// src/utils/error.rs
use serde::Serialize;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Could not read report file: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Report is not valid UTF-8 text: {0}")]
    Encoding(String),

    #[error("Unsupported report format: {0}")]
    Unsupported(String),

    #[error("Failed to decode PDF: {0}")]
    Pdf(String),

    #[error("No text could be extracted from {0}")]
    NoText(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Invalid section anchor: {0}")]
    InvalidAnchor(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Client log is locked by another process: {0}")]
    Locked(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report extraction failed: {0}")]
    Source(#[from] SourceError),

    #[error("Extraction setup failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Stable reason codes reported for a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    SourceUnreadable,
    SourceUnsupported,
    SourceNoText,
    StorageFailed,
    ConfigInvalid,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::SourceUnreadable => "source_unreadable",
            FailureReason::SourceUnsupported => "source_unsupported",
            FailureReason::SourceNoText => "source_no_text",
            FailureReason::StorageFailed => "storage_failed",
            FailureReason::ConfigInvalid => "config_invalid",
        }
    }
}

impl AppError {
    pub fn reason(&self) -> FailureReason {
        match self {
            AppError::Config(_) | AppError::Extraction(_) => FailureReason::ConfigInvalid,
            AppError::Source(SourceError::Io(_))
            | AppError::Source(SourceError::Encoding(_))
            | AppError::Source(SourceError::Pdf(_)) => FailureReason::SourceUnreadable,
            AppError::Source(SourceError::Unsupported(_)) => FailureReason::SourceUnsupported,
            AppError::Source(SourceError::NoText(_)) => FailureReason::SourceNoText,
            AppError::Storage(_) => FailureReason::StorageFailed,
        }
    }
}
