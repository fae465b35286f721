//! Named repair steps applied to raw lines and blocks before field mapping.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INTEREST_MARKER: Regex = Regex::new(r"(?i)\bint\.?\s?pd\b").unwrap();
    static ref DIGIT_RUN_RANGE: Regex = Regex::new(r"\d{8}\s*to\s*\d{2}\s*-").unwrap();

    // 30- - 092025
    static ref BROKEN_HYPHEN_DATE: Regex = Regex::new(
        r"(^|[^\d.,])(\d{2})-\s*-\s*(\d{2})(\d{4})($|[^\d.,])"
    ).unwrap();
    // 01072025
    static ref DIGIT_RUN_DATE: Regex = Regex::new(
        r"(^|[^\d.,])(\d{2})(\d{2})(\d{4})($|[^\d.,])"
    ).unwrap();
    // 30 - 09 - 2025, 30--09-2025
    static ref SPACED_DATE: Regex = Regex::new(
        r"(\d{2})\s*-\s*-?\s*(\d{2})\s*-\s*(\d{4})"
    ).unwrap();
    static ref RANGE_JOINER: Regex = Regex::new(r"(\d{4})\s*to\s*(\d{2})").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-{2,}").unwrap();
}

/// Institution-specific repair strategy, looked up by schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Interest-posting blocks whose period dates arrive as digit runs and
    /// broken hyphen sequences ("01072025 to 30- - 092025").
    InterestDates,
}

impl Repair {
    pub fn name(&self) -> &'static str {
        match self {
            Repair::InterestDates => "interest-dates",
        }
    }

    /// Whether this repair should touch the given text at all.
    pub fn applies(&self, text: &str) -> bool {
        match self {
            Repair::InterestDates => {
                INTEREST_MARKER.is_match(text) || DIGIT_RUN_RANGE.is_match(text)
            }
        }
    }

    /// Apply the repair when it applies; otherwise return the text untouched.
    pub fn run(&self, text: &str) -> String {
        if !self.applies(text) {
            return text.to_string();
        }
        match self {
            Repair::InterestDates => repair_interest_dates(text),
        }
    }
}

/// Apply every repair in order.
pub fn apply_all(repairs: &[Repair], text: &str) -> String {
    repairs
        .iter()
        .fold(text.to_string(), |acc, repair| repair.run(&acc))
}

/// Normalize malformed interest-period dates into `DD-MM-YYYY to DD-MM-YYYY`.
pub fn repair_interest_dates(text: &str) -> String {
    let mut out = BROKEN_HYPHEN_DATE
        .replace_all(text, "${1}${2}-${3}-${4}${5}")
        .into_owned();
    out = DIGIT_RUN_DATE
        .replace_all(&out, "${1}${2}-${3}-${4}${5}")
        .into_owned();
    out = SPACED_DATE.replace_all(&out, "$1-$2-$3").into_owned();
    out = RANGE_JOINER.replace_all(&out, "$1 to $2").into_owned();
    HYPHEN_RUN.replace_all(&out, "-").into_owned()
}
