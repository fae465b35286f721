//! Reconstruction of per-transaction blocks from flat lines or table rows.
//!
//! A block opens on a line (or row) whose start matches the date anchor and
//! collects every following non-boilerplate line until the next anchor, a
//! section-end marker, or the end of input. Content seen before the first
//! anchor has nowhere to go and is dropped.

use regex::Regex;
use tracing::trace;

use super::noise::LineNoiseFilter;
use super::patterns::squash_whitespace;
use super::repair::{self, Repair};

/// Raw content believed to belong to exactly one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBlock<T> {
    /// The line or row carrying the date anchor.
    pub anchor: T,
    /// Continuation content, in source order.
    pub continuation: Vec<T>,
}

pub type TextBlock = TransactionBlock<String>;
pub type RowBlock = TransactionBlock<Vec<String>>;

impl TextBlock {
    /// Anchor and continuation lines joined with single spaces.
    pub fn text(&self) -> String {
        let mut out = self.anchor.clone();
        for line in &self.continuation {
            out.push(' ');
            out.push_str(line);
        }
        out
    }

    pub fn continuation_text(&self) -> String {
        self.continuation.join(" ")
    }
}

impl RowBlock {
    /// Non-empty cells of every continuation row, joined with spaces.
    pub fn continuation_text(&self) -> String {
        self.continuation
            .iter()
            .flat_map(|row| row.iter())
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All cells of the block flattened into one line.
    pub fn text(&self) -> String {
        let mut parts = vec![row_text(&self.anchor)];
        parts.push(self.continuation_text());
        squash_whitespace(&parts.join(" "))
    }
}

/// What happens after a section-end marker closes the open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEnd {
    /// Wait for the next section start (or keep going if the schema has none).
    Resume,
    /// Ignore everything after the marker.
    Stop,
}

#[derive(Debug, Clone)]
pub struct SectionMarker {
    pub pattern: Regex,
    pub action: SectionEnd,
}

impl SectionMarker {
    pub fn resume(pattern: &Regex) -> Self {
        Self {
            pattern: pattern.clone(),
            action: SectionEnd::Resume,
        }
    }

    pub fn stop(pattern: &Regex) -> Self {
        Self {
            pattern: pattern.clone(),
            action: SectionEnd::Stop,
        }
    }
}

/// Where the transaction section of a statement begins and ends.
///
/// With no start markers the section is open from the first line.
#[derive(Debug, Clone, Default)]
pub struct SectionRules {
    pub start: Vec<Regex>,
    pub end: Vec<SectionMarker>,
}

impl SectionRules {
    fn starts(&self, line: &str) -> bool {
        self.start.iter().any(|re| re.is_match(line))
    }

    fn ends(&self, line: &str) -> Option<SectionEnd> {
        self.end
            .iter()
            .find(|marker| marker.pattern.is_match(line))
            .map(|marker| marker.action)
    }
}

/// Turns line or row sequences into [`TransactionBlock`]s.
pub struct BlockReconstructor<'a> {
    anchor: &'a Regex,
    noise: &'a LineNoiseFilter,
    sections: Option<&'a SectionRules>,
    repairs: &'a [Repair],
    close_on_page_break: bool,
}

/// Tracks the open block and section state across lines.
struct Assembler<T> {
    blocks: Vec<TransactionBlock<T>>,
    open: Option<TransactionBlock<T>>,
    in_section: bool,
    stopped: bool,
    discarded: usize,
}

impl<T> Assembler<T> {
    fn new(in_section: bool) -> Self {
        Self {
            blocks: Vec::new(),
            open: None,
            in_section,
            stopped: false,
            discarded: 0,
        }
    }

    fn close(&mut self) {
        if let Some(block) = self.open.take() {
            self.blocks.push(block);
        }
    }

    fn open_with(&mut self, anchor: T) {
        self.close();
        self.open = Some(TransactionBlock {
            anchor,
            continuation: Vec::new(),
        });
    }

    fn continue_with(&mut self, item: T) {
        match self.open.as_mut() {
            Some(block) => block.continuation.push(item),
            None => self.discarded += 1,
        }
    }

    fn finish(mut self) -> (Vec<TransactionBlock<T>>, usize) {
        self.close();
        (self.blocks, self.discarded)
    }
}

impl<'a> BlockReconstructor<'a> {
    pub fn new(anchor: &'a Regex, noise: &'a LineNoiseFilter) -> Self {
        Self {
            anchor,
            noise,
            sections: None,
            repairs: &[],
            close_on_page_break: false,
        }
    }

    pub fn with_sections(mut self, sections: &'a SectionRules) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Repairs run on each line before it is stored. A line that only
    /// looks like an anchor after repair opens a block only when none is open.
    pub fn with_repairs(mut self, repairs: &'a [Repair]) -> Self {
        self.repairs = repairs;
        self
    }

    pub fn with_page_breaks(mut self, close: bool) -> Self {
        self.close_on_page_break = close;
        self
    }

    fn section_open_initially(&self) -> bool {
        self.sections.is_none_or(|s| s.start.is_empty())
    }

    /// Route one item through section, noise and anchor checks, in that order.
    fn feed<T>(&self, asm: &mut Assembler<T>, line: &str, item: T, anchor_text: &str) {
        if asm.stopped {
            return;
        }

        if let Some(sections) = self.sections {
            if !asm.in_section {
                if sections.starts(line) {
                    trace!("section start: {}", line);
                    asm.in_section = true;
                }
                return;
            }

            if let Some(action) = sections.ends(line) {
                trace!("section end ({:?}): {}", action, line);
                asm.close();
                match action {
                    SectionEnd::Stop => asm.stopped = true,
                    SectionEnd::Resume => asm.in_section = sections.start.is_empty(),
                }
                return;
            }
        }

        if self.noise.is_boilerplate(line) {
            return;
        }

        if self.anchor.is_match(anchor_text) {
            asm.open_with(item);
        } else {
            asm.continue_with(item);
        }
    }

    /// Squashed source line and its repaired form.
    fn prepare_line(&self, raw: &str) -> Option<(String, String)> {
        let line = squash_whitespace(raw);
        if line.is_empty() {
            return None;
        }
        let repaired = repair::apply_all(self.repairs, &line);
        Some((line, repaired))
    }

    /// Reconstruct text blocks from a single flat line sequence.
    pub fn reconstruct_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<TextBlock> {
        self.reconstruct_pages(&[lines])
    }

    /// Reconstruct text blocks from lines grouped by page.
    pub fn reconstruct_pages<S: AsRef<str>, P: AsRef<[S]>>(&self, pages: &[P]) -> Vec<TextBlock> {
        let mut asm = Assembler::new(self.section_open_initially());

        for page in pages {
            for raw in page.as_ref() {
                if let Some((source, line)) = self.prepare_line(raw.as_ref()) {
                    let anchor_text = if asm.open.is_some() { &source } else { &line };
                    self.feed(&mut asm, &line, line.clone(), anchor_text);
                }
            }
            if self.close_on_page_break {
                asm.close();
            }
        }

        let (blocks, discarded) = asm.finish();
        if discarded > 0 {
            trace!("discarded {} lines before the first anchor", discarded);
        }
        blocks
    }

    /// Reconstruct row blocks. The anchor is tested against the first
    /// non-empty cell; boilerplate and section rules see the joined row.
    pub fn reconstruct_rows(&self, rows: &[Vec<String>]) -> Vec<RowBlock> {
        let mut asm = Assembler::new(self.section_open_initially());

        for row in rows {
            let cells: Vec<String> = row.iter().map(|c| squash_whitespace(c)).collect();
            let joined = row_text(&cells);
            if joined.is_empty() {
                continue;
            }
            let first = cells
                .iter()
                .find(|c| !c.is_empty())
                .cloned()
                .unwrap_or_default();
            self.feed(&mut asm, &joined, cells, &first);
        }

        let (blocks, discarded) = asm.finish();
        if discarded > 0 {
            trace!("discarded {} rows before the first anchor", discarded);
        }
        blocks
    }
}

/// Non-empty cells joined with single spaces.
pub fn row_text(row: &[String]) -> String {
    row.iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::patterns::{DATE_DASHED, DATE_DAY_MON_YEAR, DATE_SLASHED};
    use pretty_assertions::assert_eq;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_anchor_opens_and_continuation_appends() {
        let noise = LineNoiseFilter::base();
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise);
        let blocks = reconstructor.reconstruct_lines(&[
            "01-04-2025 UPI/PAY 100.00 900.00",
            "  ACME   STORES ",
            "02-04-2025 NEFT 50.00 950.00",
        ]);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "01-04-2025 UPI/PAY 100.00 900.00 ACME STORES");
        assert_eq!(blocks[1].continuation.len(), 0);
    }

    #[test]
    fn test_preamble_is_discarded() {
        let noise = LineNoiseFilter::base();
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise);
        let blocks = reconstructor.reconstruct_lines(&[
            "Account Holder: A N OTHER",
            "Date Particulars Amount Balance",
            "01-04-2025 Opening 1,000.00",
        ]);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "01-04-2025 Opening 1,000.00");
    }

    #[test]
    fn test_boilerplate_dropped_without_closing_block() {
        let noise = LineNoiseFilter::base();
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise);
        let blocks = reconstructor.reconstruct_lines(&[
            "01-04-2025 IMPS 100.00 900.00",
            "Page 1 of 3",
            "REF 7781",
        ]);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].continuation, vec!["REF 7781".to_string()]);
    }

    #[test]
    fn test_section_end_closes_and_resumes() {
        let noise = LineNoiseFilter::base();
        let start = Regex::new(r"(?i)date.*type.*description").unwrap();
        let end = Regex::new(r"(?i)^page\b|computer generated").unwrap();
        let sections = SectionRules {
            start: vec![start],
            end: vec![SectionMarker::resume(&end)],
        };
        let reconstructor = BlockReconstructor::new(&DATE_DAY_MON_YEAR, &noise).with_sections(&sections);

        let blocks = reconstructor.reconstruct_lines(&[
            "05 Apr 2025 ignored before header",
            "Date Type Description Debit Credit Balance",
            "05 Apr 2025 Transfer Credit SALARY - 5,000.00 6,000.00",
            "APRIL",
            "Page 1",
            "footer text that must not attach",
            "Date Type Description Debit Credit Balance",
            "06 Apr 2025 ACH Debit LIC 300.00 - 5,700.00",
        ]);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].continuation, vec!["APRIL".to_string()]);
        assert!(blocks[1].continuation.is_empty());
    }

    #[test]
    fn test_stop_marker_ignores_rest() {
        let noise = LineNoiseFilter::base();
        let footer = Regex::new(r"(?i)sincerely").unwrap();
        let sections = SectionRules {
            start: vec![],
            end: vec![SectionMarker::stop(&footer)],
        };
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise).with_sections(&sections);

        let blocks = reconstructor.reconstruct_lines(&[
            "01-04-2025 A 1.00 2.00",
            "Sincerely",
            "02-04-2025 B 1.00 3.00",
        ]);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_repair_turns_digit_run_into_anchor() {
        let noise = LineNoiseFilter::base();
        let repairs = [Repair::InterestDates];
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise).with_repairs(&repairs);

        let blocks = reconstructor.reconstruct_lines(&["01072025 to 30- - 092025 Int.Pd 125.00 10,125.00"]);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].anchor.starts_with("01-07-2025 to 30-09-2025"));
    }

    #[test]
    fn test_repaired_period_stays_with_open_block() {
        let noise = LineNoiseFilter::base();
        let repairs = [Repair::InterestDates];
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise).with_repairs(&repairs);

        let blocks = reconstructor.reconstruct_lines(&[
            "30-09-2025 Int.Pd 125.00 9,125.00",
            "01072025 to 30- - 092025",
            "01-10-2025 ATM 25.00 9,100.00",
        ]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].continuation, vec!["01-07-2025 to 30-09-2025"]);
    }

    #[test]
    fn test_page_break_closes_block() {
        let noise = LineNoiseFilter::base();
        let reconstructor = BlockReconstructor::new(&DATE_DASHED, &noise).with_page_breaks(true);
        let pages = vec![
            vec!["01-04-2025 A 1.00 2.00"],
            vec!["carry over header", "02-04-2025 B 1.00 3.00"],
        ];
        let blocks = reconstructor.reconstruct_pages(&pages);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].continuation.is_empty());
        assert!(blocks[1].continuation.is_empty());
    }

    #[test]
    fn test_rows_merge_continuation() {
        let noise = LineNoiseFilter::base();
        let reconstructor = BlockReconstructor::new(&DATE_SLASHED, &noise);
        let rows = vec![
            cells(&["Date", "Value Date", "Particulars"]),
            cells(&["01/04/2025", "01/04/2025", "NEFT IN", "", "", "", "", "1,000.00", "6,000.00"]),
            cells(&["", "", "ACME CORP", "", "", "", "", "", ""]),
            cells(&["", "", "", "", "", "", "", "", ""]),
        ];
        let blocks = reconstructor.reconstruct_rows(&rows);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].continuation_text(), "ACME CORP");
        assert_eq!(blocks[0].anchor[2], "NEFT IN");
    }
}
