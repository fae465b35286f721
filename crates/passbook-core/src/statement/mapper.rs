//! Generic field mapping driven by [`InstitutionSchema`] data.
//!
//! Table rows are read by column position (or by the sweep layout). Text and
//! OCR blocks are token-scanned: the anchor is stripped, structural tokens
//! are peeled from the front in schema order, amount-shaped tokens are
//! collected, and whatever remains is the description.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::amount::{self, AmountShape, format_amount};
use super::blocks::{RowBlock, TextBlock};
use super::patterns::{
    BALANCE_CELL, BRANCH_DIGITS, CHEQUE_LABEL, DATE_TOKEN, DIGITS_TOKEN, SHORT_CHEQUE_CELL,
    TIME_TOKEN, squash_whitespace,
};
use super::repair;
use super::schema::{
    AmountLayout, AmountScope, InstitutionSchema, Peel, PositionalLayout, Side, Slot, SweepLayout,
    TableLayout, TokenScanLayout,
};
use crate::error::ExtractionError;
use crate::models::transaction::or_absent;
use crate::models::{ABSENT, TransactionRecord};

type MapResult<T> = std::result::Result<T, ExtractionError>;

/// A text block mapped onto a record, possibly awaiting reconciliation.
#[derive(Debug, Clone)]
pub struct MappedBlock {
    pub record: TransactionRecord,
    /// Amount tokens in source order, for reconciled layouts.
    pub amounts: Vec<String>,
    pub needs_reconcile: bool,
    /// Flattened block text, used for keyword tie-breaks.
    pub context: String,
}

/// One scanned token.
enum Token<'t> {
    Amount(&'t str),
    Placeholder(&'t str),
    Word(&'t str),
}

/// Output of the amount scan.
#[derive(Debug, Default)]
struct Scan {
    /// `None` marks a `-` placeholder slot.
    amounts: Vec<Option<String>>,
    words: Vec<String>,
}

impl Scan {
    fn real_amounts(&self) -> usize {
        self.amounts.iter().filter(|a| a.is_some()).count()
    }
}

/// Maps reconstructed blocks onto [`TransactionRecord`]s for one institution.
pub struct FieldMapper<'a> {
    schema: &'a InstitutionSchema,
    drop_zero: bool,
}

impl<'a> FieldMapper<'a> {
    pub fn new(schema: &'a InstitutionSchema) -> Self {
        Self {
            schema,
            drop_zero: true,
        }
    }

    /// Whether a parsed zero debit/credit is stored as absent.
    pub fn with_drop_zero(mut self, drop_zero: bool) -> Self {
        self.drop_zero = drop_zero;
        self
    }

    pub fn schema(&self) -> &InstitutionSchema {
        self.schema
    }

    /// Map a table row block.
    pub fn map_row(&self, block: &RowBlock, layout: &TableLayout) -> MapResult<TransactionRecord> {
        let record = match layout {
            TableLayout::Positional(positional) => self.map_positional(block, positional)?,
            TableLayout::Sweep(sweep) => self.map_sweep(block, sweep)?,
        };
        Ok(self.finish(record, &block.text()))
    }

    fn map_positional(&self, block: &RowBlock, layout: &PositionalLayout) -> MapResult<TransactionRecord> {
        let row = &block.anchor;
        if row.len() < layout.min_cells {
            return Err(ExtractionError::field(format!(
                "row has {} cells, layout needs {}",
                row.len(),
                layout.min_cells
            )));
        }

        let map = layout
            .column_map(row.len())
            .ok_or_else(|| ExtractionError::field("no column map fits row width"))?;

        let cell = |index: usize| cell_at(row, index);
        let optional = |index: Option<usize>| index.map(|i| cell_at(row, i)).unwrap_or("");

        let date = cell(map.transaction_date);
        if !layout.anchor.is_match(date) {
            return Err(ExtractionError::field(format!("date cell {:?} is not a date", date)));
        }

        let mut record = TransactionRecord::new(date);
        record.value_date = or_absent(optional(map.value_date));
        record.cheque_or_ref_no = or_absent(optional(map.cheque));

        let branch = optional(map.branch);
        record.branch_code = if layout.branch_digits {
            BRANCH_DIGITS
                .find(branch)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| ABSENT.to_string())
        } else {
            or_absent(branch)
        };

        let description = [cell(map.description), &block.continuation_text()]
            .iter()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        record.description = self.clean_description(&description);

        record.debit = amount::normalize_or_absent(cell(map.debit));
        record.credit = amount::normalize_or_absent(cell(map.credit));
        record.balance = amount::normalize_signed_or_absent(cell(map.balance));

        if record.description == ABSENT
            && record.debit == ABSENT
            && record.credit == ABSENT
            && record.balance == ABSENT
        {
            return Err(ExtractionError::field("row carries no transaction data"));
        }

        Ok(record)
    }

    fn map_sweep(&self, block: &RowBlock, layout: &SweepLayout) -> MapResult<TransactionRecord> {
        let cells: Vec<&str> = block
            .anchor
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();

        let date = *cells.first().ok_or_else(|| ExtractionError::field("empty row"))?;
        if !layout.anchor.is_match(date) || cells.len() < 2 {
            return Err(ExtractionError::field(format!("row {:?} has no date cell", date)));
        }

        let balance_idx = (1..cells.len())
            .rev()
            .find(|&i| BALANCE_CELL.is_match(&cells[i].replace(char::is_whitespace, "")))
            .unwrap_or(cells.len() - 1);

        let cheque_idx = (1..balance_idx).find(|&i| SHORT_CHEQUE_CELL.is_match(&cells[i].replace(',', "")));

        let numeric: Vec<usize> = (2..balance_idx)
            .filter(|&i| Some(i) != cheque_idx)
            .filter(|&i| BALANCE_CELL.is_match(&cells[i].replace(char::is_whitespace, "")))
            .collect();

        // Right to left: reverse sweep, auto sweep, deposits, withdrawals
        let mut columns = [Decimal::ZERO; 4];
        for (slot, &i) in numeric.iter().rev().take(4).enumerate() {
            columns[slot] = amount::parse_decimal(cells[i]).unwrap_or_default();
        }
        let [reverse_sweep, auto_sweep, deposits, withdrawals] = columns;

        let desc_end = [numeric.first().copied(), cheque_idx]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(balance_idx)
            .min(balance_idx);
        let mut description = cells[1..desc_end.max(1)].join(" ");
        let continuation = block.continuation_text();
        if !continuation.is_empty() {
            description = format!("{} {}", description, continuation);
        }

        let mut record = TransactionRecord::new(date);
        record.cheque_or_ref_no = cheque_idx
            .map(|i| cells[i].replace(',', ""))
            .unwrap_or_else(|| ABSENT.to_string());
        record.description = self.clean_description(&description);

        let debit = withdrawals + auto_sweep;
        let credit = deposits + reverse_sweep;
        if debit > Decimal::ZERO {
            record.debit = format_amount(debit);
        }
        if credit > Decimal::ZERO {
            record.credit = format_amount(credit);
        }
        record.balance = amount::normalize_signed_or_absent(cells[balance_idx]);

        Ok(record)
    }

    /// Map a text or OCR block. Lines must already be cleaned and repaired
    /// the way the reconstructor saw them.
    pub fn map_text(&self, block: &TextBlock, layout: &TokenScanLayout) -> MapResult<MappedBlock> {
        let anchor_line = squash_whitespace(&block.anchor);
        let found = layout
            .anchor
            .find(&anchor_line)
            .ok_or_else(|| ExtractionError::field("block does not start with a date anchor"))?;

        let mut record = TransactionRecord::new(squash_whitespace(found.as_str()));
        let rest = &anchor_line[found.end()..];
        let mut tokens: Vec<&str> = rest.split_whitespace().collect();
        let consumed = self.peel(&mut record, &tokens, &layout.peel);
        tokens.drain(..consumed);

        let continuation = match layout.amount_scope {
            AmountScope::AnchorLine => block.continuation_text(),
            AmountScope::Block => repair::apply_all(&self.schema.repairs, &block.continuation_text()),
        };

        let scan = match layout.amount_scope {
            AmountScope::AnchorLine => {
                let mut scan = scan_tokens(&tokens, layout.amount_shape, &layout.amounts);
                if !continuation.is_empty() {
                    scan.words.push(continuation.clone());
                }
                scan
            }
            AmountScope::Block => {
                tokens.extend(continuation.split_whitespace());
                scan_tokens(&tokens, layout.amount_shape, &layout.amounts)
            }
        };

        record.description = self.clean_description(&scan.words.join(" "));
        let context = squash_whitespace(&format!("{} {}", anchor_line, continuation));

        if scan.real_amounts() == 0 {
            return Err(ExtractionError::NoAmounts);
        }
        if scan.amounts.len() < layout.required_amounts {
            return Err(ExtractionError::field(format!(
                "found {} amounts, layout needs {}",
                scan.amounts.len(),
                layout.required_amounts
            )));
        }

        match &layout.amounts {
            AmountLayout::Reconcile => Ok(MappedBlock {
                record,
                amounts: scan.amounts.into_iter().flatten().collect(),
                needs_reconcile: true,
                context,
            }),
            AmountLayout::Columns(slots) => {
                self.assign_slots(&mut record, &scan.amounts, slots, &context);
                let record = self.finish(record, &context);
                Ok(MappedBlock {
                    record,
                    amounts: Vec::new(),
                    needs_reconcile: false,
                    context,
                })
            }
        }
    }

    /// Peel structural tokens from the front in schema order. Returns how
    /// many tokens were consumed.
    fn peel(&self, record: &mut TransactionRecord, tokens: &[&str], steps: &[Peel]) -> usize {
        let mut idx = 0;
        for step in steps {
            let Some(token) = tokens.get(idx) else { break };
            match *step {
                Peel::Time => {
                    if TIME_TOKEN.is_match(token) {
                        record.transaction_date = format!("{} {}", record.transaction_date, token);
                        idx += 1;
                    }
                }
                Peel::ValueDate => {
                    if DATE_TOKEN.is_match(token) {
                        record.value_date = token.to_string();
                        idx += 1;
                    }
                }
                Peel::Branch { min, max } => {
                    if digit_run(token, min, max) {
                        record.branch_code = token.to_string();
                        idx += 1;
                    }
                }
                Peel::Cheque { min, max } => {
                    if digit_run(token, min, max) {
                        record.cheque_or_ref_no = token.to_string();
                        idx += 1;
                    }
                }
                Peel::LabelledCheque => {
                    if let Some((number, used)) = labelled_cheque(&tokens[idx..]) {
                        record.cheque_or_ref_no = number;
                        idx += used;
                    }
                }
            }
        }
        idx
    }

    /// Fill debit/credit/balance from a column-ordered amount run.
    fn assign_slots(&self, record: &mut TransactionRecord, amounts: &[Option<String>], slots: &[Slot], context: &str) {
        let store = |record: &mut TransactionRecord, slot: Slot, value: &Option<String>| {
            let raw = value.as_deref().unwrap_or(ABSENT);
            match slot {
                Slot::Debit => record.debit = amount::normalize_or_absent(raw),
                Slot::Credit => record.credit = amount::normalize_or_absent(raw),
                Slot::Balance => record.balance = amount::normalize_signed_or_absent(raw),
            }
        };

        if amounts.len() >= slots.len() {
            let tail = &amounts[amounts.len() - slots.len()..];
            for (slot, value) in slots.iter().zip(tail) {
                store(record, *slot, value);
            }
            return;
        }

        // Short run: the last amount is the balance, the one before it is
        // an undifferentiated movement.
        let mut iter = amounts.iter().rev();
        if let Some(last) = iter.next() {
            store(record, slots.last().copied().unwrap_or(Slot::Balance), last);
        }
        if let Some(moved) = iter.next() {
            let slot = match self.schema.keyword_side(context) {
                Some(Side::Credit) => Slot::Credit,
                _ => Slot::Debit,
            };
            store(record, slot, moved);
        }
    }

    /// Apply a reconciled debit/credit/balance and finish the record.
    pub fn apply_reconciled(&self, mut block: MappedBlock, reconciled: super::reconcile::Reconciled) -> TransactionRecord {
        block.record.debit = reconciled.debit;
        block.record.credit = reconciled.credit;
        block.record.balance = reconciled.balance;
        self.finish(block.record, &block.context)
    }

    /// Zero suppression, debit/credit exclusivity, date canonicalization and
    /// voucher classification.
    pub fn finish(&self, mut record: TransactionRecord, context: &str) -> TransactionRecord {
        if self.drop_zero {
            if amount::is_zero(&record.debit) {
                record.debit = ABSENT.to_string();
            }
            if amount::is_zero(&record.credit) {
                record.credit = ABSENT.to_string();
            }
        }

        if record.has_debit() && record.has_credit() {
            match self.schema.keyword_side(context) {
                Some(Side::Credit) => record.debit = ABSENT.to_string(),
                _ => record.credit = ABSENT.to_string(),
            }
            debug!(
                "{} {}: both debit and credit present, kept {}",
                self.schema.key,
                record.transaction_date,
                if record.has_credit() { "credit" } else { "debit" }
            );
        }

        if self.schema.canonical_dates {
            if let Some(date) = canonical_date(&record.transaction_date) {
                record.transaction_date = date;
            }
            if let Some(date) = canonical_date(&record.value_date) {
                record.value_date = date;
            }
        }

        record.classify_voucher();
        record
    }

    fn clean_description(&self, raw: &str) -> String {
        let mut text = squash_whitespace(raw);
        for scrub in &self.schema.description_scrubs {
            text = scrub.replace_all(&text, "").into_owned();
        }
        or_absent(&squash_whitespace(&text))
    }
}

/// Split tokens into amounts and description words. `-` placeholders count
/// as amount slots only inside a run that also holds a real amount, and only
/// for column layouts.
fn scan_tokens(tokens: &[&str], shape: AmountShape, layout: &AmountLayout) -> Scan {
    let keep_placeholders = matches!(layout, AmountLayout::Columns(_));
    let classified: Vec<Token<'_>> = tokens
        .iter()
        .map(|t| {
            if *t == "-" || *t == "--" {
                Token::Placeholder(t)
            } else if shape.matches(t) {
                Token::Amount(t)
            } else {
                Token::Word(t)
            }
        })
        .collect();

    let mut scan = Scan::default();
    let mut run: Vec<&Token<'_>> = Vec::new();

    let flush = |run: &mut Vec<&Token<'_>>, scan: &mut Scan| {
        let has_amount = run.iter().any(|t| matches!(t, Token::Amount(_)));
        for token in run.drain(..) {
            match token {
                Token::Amount(raw) => scan.amounts.push(Some(raw.to_string())),
                Token::Placeholder(raw) if !has_amount => scan.words.push(raw.to_string()),
                Token::Placeholder(_) if keep_placeholders => scan.amounts.push(None),
                Token::Placeholder(_) | Token::Word(_) => {}
            }
        }
    };

    for token in &classified {
        match token {
            Token::Word(word) => {
                flush(&mut run, &mut scan);
                scan.words.push(word.to_string());
            }
            _ => run.push(token),
        }
    }
    flush(&mut run, &mut scan);
    scan
}

fn cell_at(row: &[String], index: usize) -> &str {
    row.get(index).map(|c| c.trim()).unwrap_or("")
}

fn digit_run(token: &str, min: usize, max: usize) -> bool {
    DIGITS_TOKEN.is_match(token) && (min..=max).contains(&token.len())
}

/// `Chq 123456`, `Chq: 123456` or `Chq:123456`.
fn labelled_cheque(tokens: &[&str]) -> Option<(String, usize)> {
    let first = tokens.first()?;
    if CHEQUE_LABEL.is_match(first) {
        let number = tokens.get(1)?;
        if DIGITS_TOKEN.is_match(number) {
            return Some((number.to_string(), 2));
        }
        return None;
    }

    let (label, number) = first.split_once([':', '.'])?;
    if CHEQUE_LABEL.is_match(label) && DIGITS_TOKEN.is_match(number) {
        return Some((number.to_string(), 1));
    }
    None
}

/// Rewrite `dd/MM/yyyy`, `dd-MM-yyyy` or `dd MMM yyyy` as `dd-MM-yyyy`.
pub fn canonical_date(raw: &str) -> Option<String> {
    let normalized = squash_whitespace(&raw.replace('-', "/"));
    if normalized.is_empty() || normalized == "/" {
        return None;
    }

    ["%d/%m/%Y", "%d %b %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
        .map(|date| date.format("%d-%m-%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoucherKind;
    use crate::statement::institutions;
    use crate::statement::reconcile::Reconciler;
    use pretty_assertions::assert_eq;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn text_block(anchor: &str, continuation: &[&str]) -> TextBlock {
        TextBlock {
            anchor: anchor.to_string(),
            continuation: continuation.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_canara_positional_row() {
        let schema = institutions::canara();
        let layout = schema.table.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = RowBlock {
            anchor: row(&["01-04-2025", "01-04-2025", "", "NEFT CR ACME", "BR 1234 MAIN", "", "2,500.00", "12,500.00"]),
            continuation: vec![row(&["", "", "", "SALARY APR", "", "", "", ""])],
        };

        let record = mapper.map_row(&block, &layout).unwrap();
        assert_eq!(record.transaction_date, "01-04-2025");
        assert_eq!(record.branch_code, "1234");
        assert_eq!(record.cheque_or_ref_no, "-");
        assert_eq!(record.description, "NEFT CR ACME SALARY APR");
        assert_eq!(record.debit, "-");
        assert_eq!(record.credit, "2500.00");
        assert_eq!(record.balance, "12500.00");
        assert_eq!(record.voucher_kind, VoucherKind::Receipt);
    }

    #[test]
    fn test_short_row_degrades_to_absent() {
        let schema = institutions::city_union();
        let layout = schema.table.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = RowBlock {
            anchor: row(&["02/04/2025", "ATM WDL", "", "1,000.00"]),
            continuation: vec![],
        };

        let record = mapper.map_row(&block, &layout).unwrap();
        assert_eq!(record.debit, "1000.00");
        assert_eq!(record.credit, "-");
        assert_eq!(record.balance, "-");
        assert_eq!(record.voucher_kind, VoucherKind::Payment);
    }

    #[test]
    fn test_sbi_canonical_dates() {
        let schema = institutions::sbi();
        let layout = schema.table.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = RowBlock {
            anchor: row(&["3 Apr 2025", "03/04/2025", "BY TRANSFER", "", "", "750.00", "4,750.00"]),
            continuation: vec![],
        };

        let record = mapper.map_row(&block, &layout).unwrap();
        assert_eq!(record.transaction_date, "03-04-2025");
        assert_eq!(record.value_date, "03-04-2025");
        assert_eq!(record.credit, "750.00");
    }

    #[test]
    fn test_icici_sweep_row() {
        let schema = institutions::icici();
        let layout = schema.table.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = RowBlock {
            anchor: row(&["04-04-2025", "CLG/ACME", "004512", "10,000.00", "0.00", "2,000.00", "0.00", "48,000.00"]),
            continuation: vec![],
        };

        let record = mapper.map_row(&block, &layout).unwrap();
        assert_eq!(record.cheque_or_ref_no, "004512");
        assert_eq!(record.description, "CLG/ACME");
        // withdrawals 10,000 + auto sweep 2,000
        assert_eq!(record.debit, "12000.00");
        assert_eq!(record.credit, "-");
        assert_eq!(record.balance, "48000.00");
    }

    #[test]
    fn test_kvb_peels_in_order() {
        let schema = institutions::kvb();
        let layout = schema.ocr.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = text_block(
            "01-04-2025 10:22:01 01-04-2025 1234 000000123456 UPI/ACME 500.00 9,500.00",
            &["PAYMENT FOR INVOICE"],
        );

        let mapped = mapper.map_text(&block, &layout).unwrap();
        assert_eq!(mapped.record.transaction_date, "01-04-2025 10:22:01");
        assert_eq!(mapped.record.value_date, "01-04-2025");
        assert_eq!(mapped.record.branch_code, "1234");
        assert_eq!(mapped.record.cheque_or_ref_no, "000000123456");
        assert_eq!(mapped.record.description, "UPI/ACME PAYMENT FOR INVOICE");
        assert_eq!(mapped.amounts, vec!["500.00".to_string(), "9,500.00".to_string()]);
        assert!(mapped.needs_reconcile);
    }

    #[test]
    fn test_branch_before_amount_is_positional() {
        let schema = institutions::kvb();
        let layout = schema.ocr.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        // No value date: the 4-digit token right after the anchor is the branch.
        let block = text_block("01-04-2025 10:22:01 4321 ATM 2000 7500", &[]);

        let mapped = mapper.map_text(&block, &layout).unwrap();
        assert_eq!(mapped.record.branch_code, "4321");
        assert_eq!(mapped.amounts, vec!["2000".to_string(), "7500".to_string()]);
    }

    #[test]
    fn test_indusind_columns_with_placeholder() {
        let schema = institutions::indusind();
        let layout = schema.text.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = text_block("05 Apr 2025 Transfer Credit SALARY - APR - 5,000.00 6,000.00", &[]);

        let mapped = mapper.map_text(&block, &layout).unwrap();
        assert!(!mapped.needs_reconcile);
        assert_eq!(mapped.record.debit, "-");
        assert_eq!(mapped.record.credit, "5000.00");
        assert_eq!(mapped.record.balance, "6000.00");
        assert_eq!(mapped.record.description, "Transfer Credit SALARY - APR");
    }

    #[test]
    fn test_indusind_interest_block_is_receipt() {
        let schema = institutions::indusind();
        let layout = schema.text.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = text_block("30 Sep 2025 Int.Pd", &["01072025 to 30- - 092025", "125.00 10,125.00"]);

        let mapped = mapper.map_text(&block, &layout).unwrap();
        assert_eq!(mapped.record.credit, "125.00");
        assert_eq!(mapped.record.balance, "10125.00");
        assert_eq!(mapped.record.description, "Int.Pd 01-07-2025 to 30-09-2025");
        assert_eq!(mapped.record.voucher_kind, VoucherKind::Receipt);
    }

    #[test]
    fn test_indian_bank_two_amounts_default_to_debit() {
        let schema = institutions::indian_bank();
        let layout = schema.text.clone().unwrap();
        let mapper = FieldMapper::new(&schema);

        let line = layout.clean_line("07 Apr 2025 UPI/ZOMATO INR 450.00 INR 9,050.00");
        let mapped = mapper.map_text(&text_block(&line, &[]), &layout).unwrap();
        assert_eq!(mapped.record.debit, "450.00");
        assert_eq!(mapped.record.credit, "-");

        let line = layout.clean_line("08 Apr 2025 NEFT CREDIT ACME INR 1,000.00 INR 10,050.00");
        let mapped = mapper.map_text(&text_block(&line, &[]), &layout).unwrap();
        assert_eq!(mapped.record.credit, "1000.00");
        assert_eq!(mapped.record.debit, "-");
    }

    #[test]
    fn test_canara_text_labelled_cheque() {
        let schema = institutions::canara();
        let layout = schema.text.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = text_block("10/04/2025 Chq: 556677 CHQ PAID 2,000.00 8,000.00", &[]);

        let mapped = mapper.map_text(&block, &layout).unwrap();
        assert_eq!(mapped.record.cheque_or_ref_no, "556677");
        assert_eq!(mapped.record.debit, "2000.00");
        assert_eq!(mapped.record.balance, "8000.00");
    }

    #[test]
    fn test_block_without_amounts_is_rejected() {
        let schema = institutions::kvb();
        let layout = schema.text.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let block = text_block("01-04-2025 10:00:00 OPENING NOTE", &[]);

        assert!(matches!(mapper.map_text(&block, &layout), Err(ExtractionError::NoAmounts)));
    }

    #[test]
    fn test_tie_break_prefers_keyword_then_debit() {
        let schema = institutions::indusind();
        let mapper = FieldMapper::new(&schema);

        let mut record = TransactionRecord::new("01 Apr 2025");
        record.debit = "10.00".to_string();
        record.credit = "20.00".to_string();
        let kept = mapper.finish(record.clone(), "Transfer Credit");
        assert_eq!((kept.debit.as_str(), kept.credit.as_str()), ("-", "20.00"));

        let kept = mapper.finish(record, "Cash");
        assert_eq!((kept.debit.as_str(), kept.credit.as_str()), ("10.00", "-"));
        assert_eq!(kept.voucher_kind, VoucherKind::Payment);
    }

    #[test]
    fn test_reconciled_apply() {
        let schema = institutions::kvb();
        let layout = schema.ocr.clone().unwrap();
        let mapper = FieldMapper::new(&schema);
        let mut reconciler = Reconciler::new();

        let blocks = [
            text_block("01-04-2025 09:00:00 OPENING 1000.00", &[]),
            text_block("02-04-2025 09:00:00 ATM 1500.00", &[]),
        ];
        let records: Vec<_> = blocks
            .iter()
            .map(|b| mapper.map_text(b, &layout).unwrap())
            .map(|mapped| {
                let reconciled = reconciler.step(&mapped.amounts);
                mapper.apply_reconciled(mapped, reconciled)
            })
            .collect();

        assert_eq!(records[1].credit, "500.00");
        assert_eq!(records[1].voucher_kind, VoucherKind::Receipt);
    }

    #[test]
    fn test_canonical_date() {
        assert_eq!(canonical_date("01/04/2025"), Some("01-04-2025".to_string()));
        assert_eq!(canonical_date("1 Apr 2025"), Some("01-04-2025".to_string()));
        assert_eq!(canonical_date("01-04-2025"), Some("01-04-2025".to_string()));
        assert_eq!(canonical_date("-"), None);
        assert_eq!(canonical_date("soon"), None);
    }
}
