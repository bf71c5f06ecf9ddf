// src/extractors/fields.rs

// --- Imports ---
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::report::models::{ExtractedFields, LateCounts};

// --- Regex Patterns for Field Labels (Lazy Static) ---

// Name patterns, tried in order until one matches
static NAME_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Name\s*\n(.*?)\n",        // Label on its own line, value on the next
        r"Consumer Name:\s*(.+)",
        r"Name:\s*(.+)",
    ]
    .iter()
    .filter_map(|pat| Regex::new(pat).ok())
    .collect()
});

static LATE_30_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"30:\s*(\d+)").expect("Failed to compile LATE_30_RE"));
static LATE_60_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"60:\s*(\d+)").expect("Failed to compile LATE_60_RE"));
static LATE_90_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"90:\s*(\d+)").expect("Failed to compile LATE_90_RE"));

static DEROGATORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Derogatory:\s*\n?(\d+)").expect("Failed to compile DEROGATORY_RE")
});

// The count may follow other text on the same line, e.g. "Inquiries (2 years): Hard 4"
static INQUIRIES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Inquiries\s*\(2 years\):\s*\n?.*?(\d+)").expect("Failed to compile INQUIRIES_RE")
});

static OPEN_ACCOUNTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Open Accounts:\s*\n?(\d+)").expect("Failed to compile OPEN_ACCOUNTS_RE")
});

static BALANCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Balances?:\s*\$?([\d,]+)").expect("Failed to compile BALANCE_RE")
});

static LIMIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Credit Limit:\s*\$?([\d,]+)").expect("Failed to compile LIMIT_RE")
});

static DATE_OPENED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Date Opened:\s*\n?(\d{1,2}/\d{1,2}/\d{4})").expect("Failed to compile DATE_OPENED_RE")
});

static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Credit Score|FICO Score|Score):\s*\n?(\d{3})\b").expect("Failed to compile SCORE_RE")
});

static BANKRUPTCIES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Bankruptcies:\s*\n?(\d+)").expect("Failed to compile BANKRUPTCIES_RE")
});

static NEW_ACCOUNTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"New Accounts[^:\n]*:\s*\n?(\d+)").expect("Failed to compile NEW_ACCOUNTS_RE")
});

// --- Constants ---
const DEFAULT_NAME: &str = "Unknown";
const DATE_OPENED_FORMAT: &str = "%m/%d/%Y";
const SCORE_RANGE: std::ops::RangeInclusive<u16> = 300..=850;
const DAYS_PER_YEAR: f64 = 365.0;

// --- Helpers ---

/// Captured group 1 of every match.
fn captures<'r, 't>(re: &'r Regex, text: &'t str) -> impl Iterator<Item = &'t str> + 'r
where
    't: 'r,
{
    re.captures_iter(text).filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Parses a number that may carry thousands separators ("12,500").
/// Tokens that overflow are treated as non-matches.
fn parse_amount(token: &str) -> Option<u64> {
    let digits: String = token.chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}

fn max_count(re: &Regex, text: &str) -> Option<u32> {
    captures(re, text).filter_map(|t| t.parse::<u32>().ok()).max()
}

fn sum_amounts(re: &Regex, text: &str) -> u64 {
    captures(re, text)
        .filter_map(parse_amount)
        .fold(0u64, |acc, v| acc.saturating_add(v))
}

/// Round to one decimal place, exact halves to the even digit.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// First letter of each word upper case, the rest lower case.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

// --- Field extractors ---

/// The subject's name, title-cased, or "Unknown".
pub fn extract_name(text: &str) -> String {
    for re in NAME_RE.iter() {
        if let Some(raw) = captures(re, text).map(str::trim).find(|s| !s.is_empty()) {
            return title_case(raw);
        }
    }
    DEFAULT_NAME.to_string()
}

/// Worst-case count in each delinquency bucket.
pub fn extract_late_payments(text: &str) -> LateCounts {
    LateCounts {
        days_30: max_count(&LATE_30_RE, text).unwrap_or(0),
        days_60: max_count(&LATE_60_RE, text).unwrap_or(0),
        days_90: max_count(&LATE_90_RE, text).unwrap_or(0),
    }
}

/// First score in the plausible 300-850 range.
pub fn extract_credit_score(text: &str) -> Option<u16> {
    captures(&SCORE_RE, text)
        .filter_map(|t| t.parse::<u16>().ok())
        .find(|score| SCORE_RANGE.contains(score))
}

/// Oldest "Date Opened" across all tradelines. Impossible dates are skipped.
pub fn extract_oldest_account(text: &str) -> Option<NaiveDate> {
    captures(&DATE_OPENED_RE, text)
        .filter_map(|t| NaiveDate::parse_from_str(t, DATE_OPENED_FORMAT).ok())
        .min()
}

/// Balance as a percentage of limit. Unknown (100.0) when no limit was found.
pub fn utilization(total_balance: u64, total_limit: u64) -> f64 {
    if total_limit == 0 {
        return ExtractedFields::UNKNOWN_UTILIZATION;
    }
    round1(100.0 * total_balance as f64 / total_limit as f64)
}

/// Years between the oldest account and `as_of`, to one decimal.
pub fn credit_age_years(oldest: NaiveDate, as_of: NaiveDate) -> f64 {
    let days = (as_of - oldest).num_days();
    round1(days as f64 / DAYS_PER_YEAR)
}

/// Pulls every field out of `text`. Pure: identical input gives identical output.
pub fn extract_fields(text: &str, as_of: NaiveDate) -> ExtractedFields {
    let total_balance = sum_amounts(&BALANCE_RE, text);
    let total_limit = sum_amounts(&LIMIT_RE, text);
    let oldest_account = extract_oldest_account(text).unwrap_or(as_of);

    let fields = ExtractedFields {
        credit_score: extract_credit_score(text),
        late_payments: extract_late_payments(text),
        derogatory: max_count(&DEROGATORY_RE, text).unwrap_or(0),
        inquiries: max_count(&INQUIRIES_RE, text).unwrap_or(0),
        open_accounts: max_count(&OPEN_ACCOUNTS_RE, text).unwrap_or(0),
        total_balance,
        total_limit,
        utilization: utilization(total_balance, total_limit),
        oldest_account,
        credit_age_years: credit_age_years(oldest_account, as_of),
        bankruptcies: max_count(&BANKRUPTCIES_RE, text),
        new_accounts: max_count(&NEW_ACCOUNTS_RE, text),
    };

    tracing::trace!("Extracted fields from {} bytes: {:?}", text.len(), fields);
    fields
}
