//! Table detection over a text layer that preserves column spacing.
//!
//! Cells are separated by tabs or runs of two or more spaces. A table is a
//! run of lines with enough cells; its columns are the cell spans of the
//! widest row, and every other row's cells are placed in the column they
//! overlap most, so a missing debit keeps its empty slot.

use tracing::trace;

use super::Table;
use crate::statement::patterns::CELL_GAP;

/// A cell and its character span within the line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    start: usize,
    end: usize,
    text: String,
}

/// Finds column-aligned tables in page text.
#[derive(Debug, Clone)]
pub struct LayoutTableDetector {
    min_cells: usize,
    min_rows: usize,
    /// Short lines tolerated inside a run before it is closed.
    max_gap_lines: usize,
}

impl Default for LayoutTableDetector {
    fn default() -> Self {
        Self {
            min_cells: 3,
            min_rows: 2,
            max_gap_lines: 2,
        }
    }
}

impl LayoutTableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows.max(1);
        self
    }

    pub fn with_min_cells(mut self, min_cells: usize) -> Self {
        self.min_cells = min_cells.max(2);
        self
    }

    /// Detect every table in one page of text.
    pub fn detect(&self, text: &str) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut run: Vec<Vec<Cell>> = Vec::new();
        let mut short_lines = 0;

        for line in text.lines() {
            let cells = split_cells(line);
            if cells.is_empty() {
                continue;
            }

            if cells.len() >= self.min_cells {
                run.push(cells);
                short_lines = 0;
            } else if !run.is_empty() {
                short_lines += 1;
                if short_lines > self.max_gap_lines {
                    self.flush(&mut run, &mut tables);
                    short_lines = 0;
                } else {
                    run.push(cells);
                }
            }
        }
        self.flush(&mut run, &mut tables);

        trace!("layout detector found {} tables", tables.len());
        tables
    }

    fn flush(&self, run: &mut Vec<Vec<Cell>>, tables: &mut Vec<Table>) {
        while run.last().is_some_and(|row| row.len() < self.min_cells) {
            run.pop();
        }

        let wide_rows = run.iter().filter(|row| row.len() >= self.min_cells).count();
        if wide_rows >= self.min_rows {
            tables.push(align(run));
        }
        run.clear();
    }
}

/// Lay every row of a run onto the columns of its widest row.
fn align(run: &[Vec<Cell>]) -> Table {
    let Some(columns) = run.iter().max_by_key(|row| row.len()) else {
        return Vec::new();
    };

    run.iter()
        .map(|row| {
            let mut out = vec![String::new(); columns.len()];
            for cell in row {
                let slot = best_column(cell, columns);
                if !out[slot].is_empty() {
                    out[slot].push(' ');
                }
                out[slot].push_str(&cell.text);
            }
            out
        })
        .collect()
}

/// Column with the largest span overlap, else the nearest centre.
fn best_column(cell: &Cell, columns: &[Cell]) -> usize {
    let overlap = |col: &Cell| cell.end.min(col.end).saturating_sub(cell.start.max(col.start));
    let centre = |c: &Cell| (c.start + c.end) as i64;

    let (best, best_overlap) = columns
        .iter()
        .enumerate()
        .map(|(i, col)| (i, overlap(col)))
        .max_by_key(|(i, o)| (*o, std::cmp::Reverse(*i)))
        .unwrap_or((0, 0));

    if best_overlap > 0 {
        return best;
    }

    columns
        .iter()
        .enumerate()
        .min_by_key(|(_, col)| (centre(col) - centre(cell)).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Split a line into cells at tab or multi-space gaps, keeping char spans.
fn split_cells(line: &str) -> Vec<Cell> {
    let char_offset = |byte: usize| line[..byte].chars().count();
    let mut cells = Vec::new();
    let mut from = 0;

    let mut push = |from: usize, to: usize| {
        let raw = &line[from..to];
        let text = raw.trim();
        if text.is_empty() {
            return;
        }
        let lead = raw.len() - raw.trim_start().len();
        let start = char_offset(from + lead);
        cells.push(Cell {
            start,
            end: start + text.chars().count(),
            text: text.to_string(),
        });
    };

    for gap in CELL_GAP.find_iter(line) {
        push(from, gap.start());
        from = gap.end();
    }
    push(from, line.len());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_cells_keeps_offsets() {
        let cells = split_cells("01-04-2025   NEFT CR    500.00");
        let texts: Vec<_> = cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["01-04-2025", "NEFT CR", "500.00"]);
        assert_eq!(cells[1].start, 13);
    }

    #[test]
    fn test_detects_aligned_table_with_empty_cells() {
        let text = "\
Statement of account
Date         Narration          Debit       Credit      Balance
01-04-2025   SALARY                         5,000.00    15,000.00
02-04-2025   ATM WDL            1,000.00                14,000.00
             NEAR MAIN ROAD
03-04-2025   UPI/ACME             250.00                13,750.00
Thank you for banking with us";

        let tables = LayoutTableDetector::default().detect(text);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.len(), 5);
        assert_eq!(table[1], vec!["01-04-2025", "SALARY", "", "5,000.00", "15,000.00"]);
        assert_eq!(table[2], vec!["02-04-2025", "ATM WDL", "1,000.00", "", "14,000.00"]);
        assert_eq!(table[3], vec!["", "NEAR MAIN ROAD", "", "", ""]);
        assert_eq!(table[4], vec!["03-04-2025", "UPI/ACME", "250.00", "", "13,750.00"]);
    }

    #[test]
    fn test_single_row_is_not_a_table() {
        let text = "Date    Narration    Balance\nsome prose follows here";
        assert!(LayoutTableDetector::default().detect(text).is_empty());
    }

    #[test]
    fn test_prose_closes_run() {
        let text = "\
a   b   c
d   e   f
one
two
three
g   h   i
j   k   l";
        let tables = LayoutTableDetector::default().detect(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 2);
        assert_eq!(tables[1][1], vec!["j", "k", "l"]);
    }
}
