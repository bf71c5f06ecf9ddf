// src/utils/mod.rs
pub mod error;
pub mod logging;

pub use error::{AppError, FailureReason}; // Re-export main error type for convenience
