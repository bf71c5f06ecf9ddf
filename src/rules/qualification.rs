// src/rules/qualification.rs
use crate::report::models::{ExtractedFields, FlagSet};

const MIN_SCORE: u16 = 730;
const MIN_OPEN_ACCOUNTS: u32 = 5;
const MAX_UTILIZATION: f64 = 30.0;

/// Stricter per-bureau checks. Unlike risk rules, `true` means the check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Score730,
    FiveOpenAccounts,
    NoInquiries,
    UtilizationUnder30,
    NoBankruptcies,
    NoNewAccounts,
    SeasonedCardWithLimit,
}

impl Check {
    pub const TABLE: [Check; 7] = [
        Check::Score730,
        Check::FiveOpenAccounts,
        Check::NoInquiries,
        Check::UtilizationUnder30,
        Check::NoBankruptcies,
        Check::NoNewAccounts,
        Check::SeasonedCardWithLimit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Check::Score730 => "Score 730+",
            Check::FiveOpenAccounts => "5+ Open Accounts",
            Check::NoInquiries => "No Inquiries",
            Check::UtilizationUnder30 => "Utilization Under 30%",
            Check::NoBankruptcies => "No Bankruptcies",
            Check::NoNewAccounts => "No New Accounts",
            Check::SeasonedCardWithLimit => "Seasoned Card With Limit",
        }
    }

    /// `None` when the text carries no signal for this check.
    pub fn outcome(&self, fields: &ExtractedFields) -> Option<bool> {
        match self {
            Check::Score730 => Some(fields.credit_score.map_or(false, |s| s >= MIN_SCORE)),
            Check::FiveOpenAccounts => Some(fields.open_accounts >= MIN_OPEN_ACCOUNTS),
            Check::NoInquiries => Some(fields.inquiries == 0),
            Check::UtilizationUnder30 => Some(fields.utilization < MAX_UTILIZATION),
            Check::NoBankruptcies => fields.bankruptcies.map(|n| n == 0),
            Check::NoNewAccounts => fields.new_accounts.map(|n| n == 0),
            // Needs per-tradeline card age and limit, which the extractor does not produce.
            Check::SeasonedCardWithLimit => None,
        }
    }
}

/// Checks with a signal in `fields`; the rest are left out of the set.
pub fn evaluate_qualification(fields: &ExtractedFields) -> FlagSet {
    let mut passed = FlagSet::new();
    for check in Check::TABLE.iter() {
        match check.outcome(fields) {
            Some(ok) => passed.insert(check.label(), ok),
            None => tracing::trace!("No signal for '{}', check omitted", check.label()),
        }
    }
    passed
}
