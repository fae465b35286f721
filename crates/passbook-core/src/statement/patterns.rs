//! Shared regex patterns for statement recognition.
//!
//! Institution-specific tables live in `institutions.rs`; the ones here are
//! used by more than one stage.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Date anchors, matched at the start of a line or cell
    pub static ref DATE_NUMERIC_START: Regex = Regex::new(
        r"^\d{1,2}[-/ ]\d{1,2}[-/ ]\d{2,4}"
    ).unwrap();

    pub static ref DATE_NUMERIC_LOOSE: Regex = Regex::new(
        r"^\d{1,2}[-/]\d{1,2}[-/]\d{2,4}"
    ).unwrap();

    pub static ref DATE_DASHED: Regex = Regex::new(
        r"^\d{2}-\d{2}-\d{4}"
    ).unwrap();

    pub static ref DATE_SLASHED: Regex = Regex::new(
        r"^\d{2}/\d{2}/\d{4}"
    ).unwrap();

    pub static ref DATE_DAY_MON_YEAR: Regex = Regex::new(
        r"^\d{1,2} [A-Za-z]{3} \d{4}"
    ).unwrap();

    pub static ref DATE_TIME_START: Regex = Regex::new(
        r"^\d{2}-\d{2}-\d{4}\s+\d{2}:\d{2}:\d{2}"
    ).unwrap();

    // Whole-token shapes used while peeling structural tokens
    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"^\d{1,2}[-/]\d{1,2}[-/]\d{2,4}$"
    ).unwrap();

    pub static ref TIME_TOKEN: Regex = Regex::new(
        r"^\d{2}:\d{2}(:\d{2})?$"
    ).unwrap();

    pub static ref DIGITS_TOKEN: Regex = Regex::new(
        r"^\d+$"
    ).unwrap();

    pub static ref CHEQUE_LABEL: Regex = Regex::new(
        r"(?i)^(chq|cheque|chq\.?no|ref)[:.]?$"
    ).unwrap();

    // Amount shapes
    pub static ref DECIMAL_AMOUNT: Regex = Regex::new(
        r"(?i)^-?\d[\d,]*\.\d{2}(cr|dr)?$"
    ).unwrap();

    pub static ref NUMERIC_AMOUNT: Regex = Regex::new(
        r"(?i)^-?\d+(\.\d{1,2})?(cr|dr)?$"
    ).unwrap();

    pub static ref CANONICAL_DECIMAL: Regex = Regex::new(
        r"^\d+(\.\d+)?$"
    ).unwrap();

    pub static ref BALANCE_CELL: Regex = Regex::new(
        r"(?i)^-?\s*[0-9,]+(\.\d{1,2})?\s*(cr|dr)?$"
    ).unwrap();

    pub static ref SHORT_CHEQUE_CELL: Regex = Regex::new(
        r"^\d{3,6}$"
    ).unwrap();

    pub static ref BRANCH_DIGITS: Regex = Regex::new(
        r"\b\d{2,6}\b"
    ).unwrap();

    // Classification
    pub static ref TXN_HEADER_PHRASE: Regex = Regex::new(
        r"(?is)txn\s*date.*debit.*credit.*balance"
    ).unwrap();

    pub static ref HEADER_KEYWORD: Regex = Regex::new(
        r"(?i)\b(date|txn|description|debit|particulars|narration)\b"
    ).unwrap();

    // Whitespace
    pub static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();

    pub static ref CELL_GAP: Regex = Regex::new(r"\t+| {2,}").unwrap();
}

/// Collapse every whitespace run into a single space and trim.
pub fn squash_whitespace(text: &str) -> String {
    MULTI_SPACE.replace_all(text.trim(), " ").into_owned()
}
