//! Boilerplate line detection.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PAGE_OF: Regex = Regex::new(r"(?i)\bpage\s*(no\.?)?\s*\d+\s*(of|/)\s*\d+").unwrap();
    static ref WEB_ADDRESS: Regex = Regex::new(r"(?i)\bwww\.|https?://").unwrap();
    static ref REGISTRATION: Regex = Regex::new(r"(?i)\b(registration|regn?\.?)\s*no\b").unwrap();
}

/// Case-insensitive phrases that mark a line as header/footer content on any
/// statement.
const BASE_PHRASES: &[&str] = &[
    "confidential",
    "statement generated on",
    "this is a system generated",
    "this is a computer generated",
    "do not reply",
    "for any queries",
    "customer service",
    "end of statement",
    "helpline",
    "contact us",
    "email us at",
    "issued by",
];

/// A single boilerplate rule.
#[derive(Debug, Clone)]
pub enum NoiseRule {
    /// Case-insensitive substring.
    Contains(String),
    /// Regex matched anywhere in the line.
    Pattern(Regex),
}

impl NoiseRule {
    pub fn contains(phrase: &str) -> Self {
        NoiseRule::Contains(phrase.to_lowercase())
    }

    pub fn pattern(regex: &Regex) -> Self {
        NoiseRule::Pattern(regex.clone())
    }

    fn matches(&self, line: &str, lower: &str) -> bool {
        match self {
            NoiseRule::Contains(phrase) => lower.contains(phrase.as_str()),
            NoiseRule::Pattern(re) => re.is_match(line),
        }
    }
}

/// Classifies lines as boilerplate or transactional content.
#[derive(Debug, Clone)]
pub struct LineNoiseFilter {
    rules: Vec<NoiseRule>,
}

impl LineNoiseFilter {
    /// Create a filter from an explicit rule list.
    pub fn new(rules: Vec<NoiseRule>) -> Self {
        Self { rules }
    }

    /// The rules every statement shares: page numbers, disclaimers, web and
    /// contact lines, registration numbers.
    pub fn base() -> Self {
        let mut rules: Vec<NoiseRule> = BASE_PHRASES.iter().map(|p| NoiseRule::contains(p)).collect();
        rules.push(NoiseRule::pattern(&PAGE_OF));
        rules.push(NoiseRule::pattern(&WEB_ADDRESS));
        rules.push(NoiseRule::pattern(&REGISTRATION));
        Self { rules }
    }

    /// Base rules plus institution-specific extras.
    pub fn with_extra(extra: &[NoiseRule]) -> Self {
        let mut filter = Self::base();
        filter.rules.extend(extra.iter().cloned());
        filter
    }

    pub fn push(&mut self, rule: NoiseRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when the line is boilerplate and must never enter a block.
    pub fn is_boilerplate(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.rules.iter().any(|rule| rule.matches(line, &lower))
    }
}

impl Default for LineNoiseFilter {
    fn default() -> Self {
        Self::base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_rules() {
        let filter = LineNoiseFilter::base();
        assert!(filter.is_boilerplate("Page 2 of 7"));
        assert!(filter.is_boilerplate("Page No. 3 / 9"));
        assert!(filter.is_boilerplate("This is a system generated statement"));
        assert!(filter.is_boilerplate("Visit www.examplebank.in for details"));
        assert!(filter.is_boilerplate("**** END OF STATEMENT ****"));
        assert!(filter.is_boilerplate("Registration No: U65190"));
        assert!(!filter.is_boilerplate("01-04-2025 NEFT-HDFC-ACME LTD 1,000.00 5,000.00"));
    }

    #[test]
    fn test_extra_rules() {
        let legend = Regex::new(r"(?i)^VPS/IPS\s*-").unwrap();
        let filter = LineNoiseFilter::with_extra(&[
            NoiseRule::contains("Legends for transactions"),
            NoiseRule::pattern(&legend),
        ]);
        assert!(filter.is_boilerplate("LEGENDS FOR TRANSACTIONS IN YOUR ACCOUNT"));
        assert!(filter.is_boilerplate("VPS/IPS - Debit card transaction"));
        assert!(filter.len() > LineNoiseFilter::base().len());
    }
}
