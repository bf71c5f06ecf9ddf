// src/report/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// The credit bureaus whose sections appear in a merged report.
/// Ordering follows the usual layout of a tri-merge report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bureau {
    TransUnion,
    Experian,
    Equifax,
}

impl Bureau {
    pub const ALL: [Bureau; 3] = [Bureau::TransUnion, Bureau::Experian, Bureau::Equifax];

    /// Text that marks the start of this bureau's section (matched case-insensitively).
    pub fn anchor(&self) -> &'static str {
        match self {
            Bureau::TransUnion => "TransUnion",
            Bureau::Experian => "Experian",
            Bureau::Equifax => "Equifax",
        }
    }
}

impl fmt::Display for Bureau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor())
    }
}

/// Worst-case late payment counts per delinquency bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LateCounts {
    pub days_30: u32,
    pub days_60: u32,
    pub days_90: u32,
}

impl LateCounts {
    /// Sum of all buckets, capped at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.days_30
            .saturating_add(self.days_60)
            .saturating_add(self.days_90)
    }
}

/// Values pulled out of one scope of report text (a bureau section or the whole document).
///
/// Every field has a total default; a label that never matches leaves the default in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedFields {
    /// `None` when no score is printed. Rules treat this as failing.
    pub credit_score: Option<u16>,
    pub late_payments: LateCounts,
    pub derogatory: u32,
    pub inquiries: u32,
    pub open_accounts: u32,
    pub total_balance: u64,
    pub total_limit: u64,
    /// Percentage, rounded to one decimal. 100.0 when no credit limit was found.
    pub utilization: f64,
    pub oldest_account: NaiveDate,
    pub credit_age_years: f64,
    pub bankruptcies: Option<u32>,
    pub new_accounts: Option<u32>,
}

impl ExtractedFields {
    pub const UNKNOWN_UTILIZATION: f64 = 100.0;

    /// The field values used when nothing in the text matches.
    pub fn defaults(as_of: NaiveDate) -> Self {
        Self {
            credit_score: None,
            late_payments: LateCounts::default(),
            derogatory: 0,
            inquiries: 0,
            open_accounts: 0,
            total_balance: 0,
            total_limit: 0,
            utilization: Self::UNKNOWN_UTILIZATION,
            oldest_account: as_of,
            credit_age_years: 0.0,
            bankruptcies: None,
            new_accounts: None,
        }
    }
}

/// Ordered rule name -> bool mapping.
///
/// For rule flags `true` means the rule failed; for qualification checks `true` means it passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    entries: Vec<(&'static str, bool)>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: bool) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn any_set(&self) -> bool {
        self.entries.iter().any(|(_, v)| *v)
    }

    /// Names whose value is `true`, in insertion order.
    pub fn set_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().filter(|(_, v)| *v).map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(n, v)| (*n, *v)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Status {
    pub fn from_red_flag(any_flagged: bool) -> Self {
        if any_flagged {
            Status::NeedsImprovement
        } else {
            Status::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Good => "Good",
            Status::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the rule table is applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationMode {
    /// One flat rule set over document-wide fields.
    Global,
    /// Rules applied to each located bureau section.
    PerBureau,
    /// Per-bureau when any bureau section is found, global otherwise.
    Auto,
}

/// Fields, flags and qualification checks for one bureau section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BureauReport {
    pub start: usize,
    pub end: usize,
    pub fields: ExtractedFields,
    pub flags: FlagSet,
    pub qualification: FlagSet,
}

/// The complete outcome of evaluating one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub subject: String,
    pub processed_on: NaiveDate,
    /// Resolved mode, never `Auto`.
    pub mode: EvaluationMode,
    pub document: ExtractedFields,
    pub global_flags: FlagSet,
    pub bureaus: BTreeMap<Bureau, BureauReport>,
    pub status: Status,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_set_keeps_insertion_order() {
        let mut flags = FlagSet::new();
        flags.insert("Late Payments", false);
        flags.insert("High Utilization", true);
        flags.insert("Credit Score", true);
        flags.insert("Late Payments", true);

        assert_eq!(flags.len(), 3);
        assert!(flags.any_set());
        assert_eq!(
            flags.set_names().collect::<Vec<_>>(),
            vec!["Late Payments", "High Utilization", "Credit Score"]
        );
        assert_eq!(flags.get("Low Credit Age"), None);
    }

    #[test]
    fn test_flag_set_serializes_as_ordered_map() {
        let mut flags = FlagSet::new();
        flags.insert("Too Many Inquiries", false);
        flags.insert("Credit Score", true);
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, r#"{"Too Many Inquiries":false,"Credit Score":true}"#);
    }

    #[test]
    fn test_late_total_saturates() {
        let late = LateCounts { days_30: u32::MAX, days_60: 1, days_90: 7 };
        assert_eq!(late.total(), u32::MAX);
        let late = LateCounts { days_30: 2, days_60: 1, days_90: 0 };
        assert_eq!(late.total(), 3);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(Status::from_red_flag(false).as_str(), "Good");
        assert_eq!(Status::from_red_flag(true).to_string(), "Needs Improvement");
        assert_eq!(
            serde_json::to_string(&Status::NeedsImprovement).unwrap(),
            r#""Needs Improvement""#
        );
    }

    #[test]
    fn test_defaults_use_worst_case_values() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let fields = ExtractedFields::defaults(today);
        assert_eq!(fields.credit_score, None);
        assert_eq!(fields.utilization, 100.0);
        assert_eq!(fields.oldest_account, today);
        assert_eq!(fields.credit_age_years, 0.0);
        assert_eq!(fields.late_payments.total(), 0);
    }
}
