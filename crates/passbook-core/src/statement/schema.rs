//! Institution schemas and the registry that looks them up.
//!
//! A schema is data: anchors, column positions, token-peeling order,
//! boilerplate and named repairs. One generic mapper consumes it.

use regex::Regex;
use std::fmt;

use super::amount::AmountShape;
use super::blocks::SectionRules;
use super::noise::{LineNoiseFilter, NoiseRule};
use super::repair::Repair;
use crate::error::{PassbookError, Result};

/// Which side of the ledger an amount belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Debit,
    Credit,
}

/// Kind of raw content a layout maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Table,
    Text,
    Ocr,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Table => "table",
            SourceKind::Text => "text",
            SourceKind::Ocr => "ocr",
        })
    }
}

/// Column positions for one table width.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Smallest row width this map applies to.
    pub min_width: usize,
    pub transaction_date: usize,
    pub value_date: Option<usize>,
    pub cheque: Option<usize>,
    pub branch: Option<usize>,
    pub description: usize,
    pub debit: usize,
    pub credit: usize,
    pub balance: usize,
}

/// Ruled-table layout read by fixed column index.
#[derive(Debug, Clone)]
pub struct PositionalLayout {
    pub anchor: Regex,
    /// Anchor rows with fewer cells are rejected.
    pub min_cells: usize,
    /// Header, total and legend rows specific to this layout.
    pub skip_rows: Vec<NoiseRule>,
    /// Candidate maps, widest first. The first whose `min_width` fits wins.
    pub columns: Vec<ColumnMap>,
    /// Pull the first 2-6 digit run out of the branch cell.
    pub branch_digits: bool,
}

impl PositionalLayout {
    pub fn column_map(&self, width: usize) -> Option<&ColumnMap> {
        self.columns.iter().find(|map| width >= map.min_width)
    }
}

/// Current-account layout with auto-sweep and reverse-sweep columns.
///
/// The balance is the right-most balance-shaped cell; amount cells left of it
/// are read from the right as reverse sweep, auto sweep, deposits and
/// withdrawals.
#[derive(Debug, Clone)]
pub struct SweepLayout {
    pub anchor: Regex,
    pub skip_rows: Vec<NoiseRule>,
}

#[derive(Debug, Clone)]
pub enum TableLayout {
    Positional(PositionalLayout),
    Sweep(SweepLayout),
}

impl TableLayout {
    pub fn anchor(&self) -> &Regex {
        match self {
            TableLayout::Positional(layout) => &layout.anchor,
            TableLayout::Sweep(layout) => &layout.anchor,
        }
    }

    pub fn skip_rows(&self) -> &[NoiseRule] {
        match self {
            TableLayout::Positional(layout) => &layout.skip_rows,
            TableLayout::Sweep(layout) => &layout.skip_rows,
        }
    }
}

/// Structural token peeled from the front of a line after the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peel {
    /// `hh:mm[:ss]`, appended to the transaction date.
    Time,
    /// A second date token.
    ValueDate,
    /// Digit run of the given length range.
    Branch { min: usize, max: usize },
    /// Digit run of the given length range.
    Cheque { min: usize, max: usize },
    /// `Chq`/`Ref` label followed by the number.
    LabelledCheque,
}

/// Slot an amount occupies in a column-ordered amount run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Debit,
    Credit,
    Balance,
}

/// How the amounts collected from a block turn into debit/credit/balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountLayout {
    /// Amounts are labelled by position, assigned from the right. `-`
    /// placeholders count as slots.
    Columns(Vec<Slot>),
    /// Only the balance is trusted; debit/credit come from balance deltas.
    Reconcile,
}

/// Which lines of a block feed the amount scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountScope {
    AnchorLine,
    Block,
}

/// Free-text or OCR layout mapped by token scanning.
#[derive(Debug, Clone)]
pub struct TokenScanLayout {
    pub anchor: Regex,
    pub sections: SectionRules,
    pub skip_lines: Vec<NoiseRule>,
    /// Characters replaced by spaces before anything else sees the line.
    pub strip_chars: Vec<char>,
    /// Patterns removed from lines before tokenizing (currency prefixes).
    pub strip_patterns: Vec<Regex>,
    pub peel: Vec<Peel>,
    pub amount_shape: AmountShape,
    pub amount_scope: AmountScope,
    pub amounts: AmountLayout,
    /// Blocks with fewer amount tokens (placeholders included) are rejected.
    pub required_amounts: usize,
    pub close_on_page_break: bool,
}

impl TokenScanLayout {
    /// A layout with the given anchor and every other knob at its plainest.
    pub fn reconciling(anchor: &Regex, shape: AmountShape) -> Self {
        Self {
            anchor: anchor.clone(),
            sections: SectionRules::default(),
            skip_lines: Vec::new(),
            strip_chars: Vec::new(),
            strip_patterns: Vec::new(),
            peel: Vec::new(),
            amount_shape: shape,
            amount_scope: AmountScope::AnchorLine,
            amounts: AmountLayout::Reconcile,
            required_amounts: 1,
            close_on_page_break: false,
        }
    }

    /// Apply the character and pattern stripping rules to one raw line.
    pub fn clean_line(&self, line: &str) -> String {
        let mut out: String = line
            .chars()
            .map(|c| if self.strip_chars.contains(&c) { ' ' } else { c })
            .collect();
        for pattern in &self.strip_patterns {
            out = pattern.replace_all(&out, " ").into_owned();
        }
        out
    }
}

/// Configuration for one statement layout family.
#[derive(Debug, Clone)]
pub struct InstitutionSchema {
    pub key: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Boilerplate shared by every source kind of this institution.
    pub noise: Vec<NoiseRule>,
    pub table: Option<TableLayout>,
    pub text: Option<TokenScanLayout>,
    pub ocr: Option<TokenScanLayout>,
    /// Transaction-type keywords, the authoritative debit/credit tie-break.
    pub type_keywords: Vec<(Regex, Side)>,
    pub repairs: Vec<Repair>,
    /// Trailing header/footer fragments cut from descriptions.
    pub description_scrubs: Vec<Regex>,
    /// Rewrite transaction and value dates as `dd-MM-yyyy`.
    pub canonical_dates: bool,
    /// OCR pages whose text layer is too thin during the text strategy.
    pub ocr_backfill: bool,
}

impl InstitutionSchema {
    /// An empty schema; institution builders fill in what they need.
    pub fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            name,
            aliases: &[],
            noise: Vec::new(),
            table: None,
            text: None,
            ocr: None,
            type_keywords: Vec::new(),
            repairs: Vec::new(),
            description_scrubs: Vec::new(),
            canonical_dates: false,
            ocr_backfill: false,
        }
    }

    /// Base boilerplate rules plus this institution's and the given extras.
    pub fn noise_filter(&self, extra: &[NoiseRule]) -> LineNoiseFilter {
        let mut filter = LineNoiseFilter::with_extra(&self.noise);
        for rule in extra {
            filter.push(rule.clone());
        }
        filter
    }

    pub fn token_layout(&self, kind: SourceKind) -> Option<&TokenScanLayout> {
        match kind {
            SourceKind::Text => self.text.as_ref(),
            SourceKind::Ocr => self.ocr.as_ref(),
            SourceKind::Table => None,
        }
    }

    pub fn supports(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Table => self.table.is_some(),
            SourceKind::Text => self.text.is_some(),
            SourceKind::Ocr => self.ocr.is_some(),
        }
    }

    pub fn supported_sources(&self) -> Vec<SourceKind> {
        [SourceKind::Table, SourceKind::Text, SourceKind::Ocr]
            .into_iter()
            .filter(|kind| self.supports(*kind))
            .collect()
    }

    /// Side named by the first matching transaction-type keyword.
    pub fn keyword_side(&self, text: &str) -> Option<Side> {
        self.type_keywords
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, side)| *side)
    }

    fn answers_to(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(key))
    }
}

/// Lookup table of institution schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<InstitutionSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in institution.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for schema in super::institutions::all() {
            registry.register(schema);
        }
        registry
    }

    /// Add a schema, replacing any schema registered under the same key.
    pub fn register(&mut self, schema: InstitutionSchema) {
        self.schemas.retain(|existing| existing.key != schema.key);
        self.schemas.push(schema);
    }

    /// Look up a schema by key or alias, case-insensitively.
    pub fn get(&self, key: &str) -> Result<&InstitutionSchema> {
        let key = key.trim();
        self.schemas
            .iter()
            .find(|schema| schema.answers_to(key))
            .ok_or_else(|| PassbookError::UnsupportedInstitution(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstitutionSchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_alias_is_case_insensitive() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(registry.get("KVB").unwrap().key, "kvb");
        assert_eq!(registry.get("Karur Vysya Bank").unwrap().key, "kvb");
        assert_eq!(registry.get(" canara ").unwrap().key, "canara");
    }

    #[test]
    fn test_unknown_key_is_unsupported() {
        let registry = SchemaRegistry::builtin();
        match registry.get("hdfc") {
            Err(PassbookError::UnsupportedInstitution(key)) => assert_eq!(key, "hdfc"),
            other => panic!("expected unsupported institution, got {:?}", other.map(|s| s.key)),
        }
    }

    #[test]
    fn test_register_replaces_same_key() {
        let mut registry = SchemaRegistry::new();
        registry.register(InstitutionSchema::new("demo", "Demo Bank"));
        let mut replacement = InstitutionSchema::new("demo", "Demo Bank v2");
        replacement.ocr_backfill = true;
        registry.register(replacement);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("demo").unwrap().ocr_backfill);
    }

    #[test]
    fn test_every_builtin_has_a_fallback_layout() {
        for schema in SchemaRegistry::builtin().iter() {
            assert!(schema.supports(SourceKind::Ocr), "{} lacks an OCR layout", schema.key);
            assert!(schema.supports(SourceKind::Text), "{} lacks a text layout", schema.key);
        }
    }

    #[test]
    fn test_clean_line() {
        let anchor = Regex::new(r"^\d").unwrap();
        let mut layout = TokenScanLayout::reconciling(&anchor, AmountShape::Numeric);
        layout.strip_chars = vec!['|', '='];
        layout.strip_patterns = vec![Regex::new(r"INR").unwrap()];
        assert_eq!(layout.clean_line("01|A=INR5"), "01 A  5");
    }
}
