// src/extractors/mod.rs
pub mod fields;
pub mod section;

// Re-export key extraction types for convenience
pub use fields::{extract_fields, extract_name};
pub use section::{split_bureaus, AnchorHit, Section, SectionSplitter};
