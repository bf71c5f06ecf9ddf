// src/pipeline.rs
//! Core entry point: Document Text in, EvaluationResult out.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;

use crate::extractors::{extract_fields, extract_name, split_bureaus};
use crate::report::models::{BureauReport, EvaluationMode, EvaluationResult, Status};
use crate::report::source::load_document;
use crate::rules::{evaluate_bureau, evaluate_document_scope, evaluate_global, evaluate_qualification, summarize};
use crate::storage::{ClientLog, ClientRecord};
use crate::utils::error::AppError;

/// Evaluates one report's text. Never fails: missing fields fall back to defaults.
pub fn evaluate_text(text: &str, as_of: NaiveDate, mode: EvaluationMode) -> EvaluationResult {
    let subject = extract_name(text);
    let document = extract_fields(text, as_of);
    let sections = split_bureaus(text);

    // Without sections the per-bureau table has nothing to run on, so the
    // document-wide table decides the status.
    let resolved = match mode {
        EvaluationMode::Global => EvaluationMode::Global,
        _ if sections.is_empty() => {
            if mode == EvaluationMode::PerBureau {
                tracing::warn!("No bureau sections found, falling back to global rules");
            }
            EvaluationMode::Global
        }
        _ => EvaluationMode::PerBureau,
    };
    tracing::info!(
        "Evaluating report for '{}' in {:?} mode ({} bureau section(s) found)",
        subject,
        resolved,
        sections.len()
    );

    let mut bureaus = BTreeMap::new();

    let (global_flags, status, issues) = if resolved == EvaluationMode::Global {
        let flags = evaluate_global(&document);
        let (status, issues) = summarize(&flags);
        (flags, status, issues)
    } else {
        let mut issues = Vec::new();
        for (bureau, section) in &sections {
            let fields = extract_fields(section.text, as_of);
            let flags = evaluate_bureau(&fields);
            issues.extend(flags.set_names().map(|rule| format!("{}: {}", bureau, rule)));
            let qualification = evaluate_qualification(&fields);
            tracing::debug!("{}: {} flag(s) raised", bureau, flags.set_names().count());

            bureaus.insert(
                *bureau,
                BureauReport { start: section.start, end: section.end, fields, flags, qualification },
            );
        }

        let flags = evaluate_document_scope(&document);
        issues.extend(flags.set_names().map(str::to_string));

        let any_flag = flags.any_set() || bureaus.values().any(|b| b.flags.any_set());
        (flags, Status::from_red_flag(any_flag), issues)
    };

    tracing::info!("Status for '{}': {} ({} issue(s))", subject, status, issues.len());

    EvaluationResult {
        subject,
        processed_on: as_of,
        mode: resolved,
        document,
        global_flags,
        bureaus,
        status,
        issues,
    }
}

/// Loads, evaluates and (optionally) records one report file.
///
/// Extraction or storage failures abort the invocation; nothing is persisted
/// for a report that could not be read.
pub fn process_file(
    path: &Path,
    as_of: NaiveDate,
    mode: EvaluationMode,
    log: Option<&ClientLog>,
) -> Result<EvaluationResult, AppError> {
    let text = load_document(path)?;
    let result = evaluate_text(&text, as_of, mode);

    if let Some(log) = log {
        log.append(&ClientRecord::from_result(&result))?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::models::Bureau;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_no_anchors_gives_deterministic_failure() {
        let result = evaluate_text("scanned cover page only", as_of(), EvaluationMode::Auto);
        assert_eq!(result.mode, EvaluationMode::Global);
        assert_eq!(result.subject, "Unknown");
        assert_eq!(result.status, Status::NeedsImprovement);
        assert!(result.issues.contains(&"Credit Score".to_string()));
        assert!(result.bureaus.is_empty());
    }

    #[test]
    fn test_per_bureau_labels_issues() {
        let text = "Name\nJANE DOE\n\
                    TransUnion\nCredit Score: 745\nOpen Accounts: 6\nBalances: $100\nCredit Limit: $1,000\nDate Opened: 01/01/2010\n\
                    Experian\nCredit Score: 690\nOpen Accounts: 6\n30: 1\nBalances: $100\nCredit Limit: $1,000\nDate Opened: 01/01/2010\n";
        let result = evaluate_text(text, as_of(), EvaluationMode::PerBureau);

        assert_eq!(result.subject, "Jane Doe");
        assert_eq!(result.mode, EvaluationMode::PerBureau);
        assert_eq!(result.bureaus.len(), 2);
        assert!(!result.bureaus[&Bureau::TransUnion].flags.any_set());
        assert_eq!(result.issues, vec!["Experian: Late Payments", "Experian: Credit Score"]);
        assert_eq!(result.status, Status::NeedsImprovement);
        assert_eq!(result.global_flags.get("Low Credit Age"), Some(false));
    }

    #[test]
    fn test_huge_late_counts_still_evaluate() {
        let result = evaluate_text("30: 4294967295\n60: 1\n", as_of(), EvaluationMode::Global);
        assert_eq!(result.document.late_payments.total(), u32::MAX);
        assert_eq!(result.global_flags.get("Late Payments"), Some(true));
    }

    #[test]
    fn test_per_bureau_mode_without_sections_uses_global_rules() {
        // Old account, so only the score, open-account and utilization rules can fail.
        let result = evaluate_text("Date Opened: 01/01/2000\n", as_of(), EvaluationMode::PerBureau);

        assert_eq!(result.mode, EvaluationMode::Global);
        assert!(result.bureaus.is_empty());
        assert_eq!(result.document.credit_score, None);
        assert_eq!(result.global_flags.get("Low Credit Age"), Some(false));
        assert!(result.issues.contains(&"Credit Score".to_string()));
        assert!(result.issues.contains(&"High Utilization".to_string()));
        assert!(result.issues.contains(&"Low Open Accounts".to_string()));
        assert_eq!(result.status, Status::NeedsImprovement);
    }
}
