// src/rules/evaluator.rs
use crate::report::models::{ExtractedFields, FlagSet, Status};

// --- Thresholds ---
const MAX_UTILIZATION: f64 = 30.0;
const MAX_INQUIRIES: u32 = 3;
const MIN_OPEN_ACCOUNTS: u32 = 3;
const MIN_CREDIT_AGE_YEARS: f64 = 3.0;
const MIN_CREDIT_SCORE: u16 = 700;

/// Where a rule is evaluated in per-bureau mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Bureau,
    Document,
}

/// One row of the risk rule table. A rule "fails" when its red-flag condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    LatePayments,
    DerogatoryItems,
    HighUtilization,
    TooManyInquiries,
    LowOpenAccounts,
    LowCreditAge,
    CreditScore,
}

impl Rule {
    /// The rule table, in reporting order.
    pub const TABLE: [Rule; 7] = [
        Rule::LatePayments,
        Rule::DerogatoryItems,
        Rule::HighUtilization,
        Rule::TooManyInquiries,
        Rule::LowOpenAccounts,
        Rule::LowCreditAge,
        Rule::CreditScore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Rule::LatePayments => "Late Payments",
            Rule::DerogatoryItems => "Negative/Derogatory Items",
            Rule::HighUtilization => "High Utilization",
            Rule::TooManyInquiries => "Too Many Inquiries",
            Rule::LowOpenAccounts => "Low Open Accounts",
            Rule::LowCreditAge => "Low Credit Age",
            Rule::CreditScore => "Credit Score",
        }
    }

    pub fn scope(&self) -> RuleScope {
        match self {
            Rule::LowCreditAge => RuleScope::Document,
            _ => RuleScope::Bureau,
        }
    }

    pub fn fails(&self, fields: &ExtractedFields) -> bool {
        match self {
            Rule::LatePayments => fields.late_payments.total() > 0,
            Rule::DerogatoryItems => fields.derogatory > 0,
            Rule::HighUtilization => fields.utilization > MAX_UTILIZATION,
            Rule::TooManyInquiries => fields.inquiries > MAX_INQUIRIES,
            Rule::LowOpenAccounts => fields.open_accounts < MIN_OPEN_ACCOUNTS,
            Rule::LowCreditAge => fields.credit_age_years < MIN_CREDIT_AGE_YEARS,
            // Unknown score is treated as failing.
            Rule::CreditScore => fields.credit_score.map_or(true, |s| s < MIN_CREDIT_SCORE),
        }
    }
}

fn evaluate<'a>(rules: impl Iterator<Item = &'a Rule>, fields: &ExtractedFields) -> FlagSet {
    let mut flags = FlagSet::new();
    for rule in rules {
        flags.insert(rule.label(), rule.fails(fields));
    }
    flags
}

/// Every rule against document-wide fields.
pub fn evaluate_global(fields: &ExtractedFields) -> FlagSet {
    evaluate(Rule::TABLE.iter(), fields)
}

/// Rules scoped to a single bureau section.
pub fn evaluate_bureau(fields: &ExtractedFields) -> FlagSet {
    evaluate(Rule::TABLE.iter().filter(|r| r.scope() == RuleScope::Bureau), fields)
}

/// Rules scoped to the whole document when bureaus are evaluated separately.
pub fn evaluate_document_scope(fields: &ExtractedFields) -> FlagSet {
    evaluate(Rule::TABLE.iter().filter(|r| r.scope() == RuleScope::Document), fields)
}

/// Names of failed rules in table order, and the resulting status.
pub fn summarize(flags: &FlagSet) -> (Status, Vec<String>) {
    let issues: Vec<String> = flags.set_names().map(str::to_string).collect();
    (Status::from_red_flag(!issues.is_empty()), issues)
}
