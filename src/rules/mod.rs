// src/rules/mod.rs
pub mod evaluator;
pub mod qualification;

pub use evaluator::{evaluate_bureau, evaluate_document_scope, evaluate_global, summarize, Rule, RuleScope};
pub use qualification::{evaluate_qualification, Check};
