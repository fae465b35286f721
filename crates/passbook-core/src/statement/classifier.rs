//! Document classification: born-digital or scanned, ruled or free text.

use tracing::{debug, warn};

use super::patterns::{
    DATE_DAY_MON_YEAR, DATE_NUMERIC_START, HEADER_KEYWORD, TXN_HEADER_PHRASE,
};
use crate::models::config::PassbookConfig;
use crate::pdf::{StatementDocument, Table};

/// What the classifier learned about a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_digital_text: bool,
    pub has_table_layout: bool,
}

/// Decides which raw content providers a document can feed.
///
/// Provider failures never escape: a failing text layer means "not digital"
/// and a failing table probe means "no table".
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    min_text_length: usize,
    sample_pages: u32,
    min_table_rows: usize,
    min_anchor_lines: usize,
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::from_config(&PassbookConfig::default())
    }
}

impl DocumentClassifier {
    pub fn from_config(config: &PassbookConfig) -> Self {
        Self {
            min_text_length: config.pdf.min_text_length,
            sample_pages: config.pdf.classify_pages.max(1),
            min_table_rows: config.extraction.min_table_rows.max(1),
            min_anchor_lines: config.extraction.min_anchor_lines,
        }
    }

    pub fn classify(&self, doc: &dyn StatementDocument) -> Classification {
        let classification = Classification {
            is_digital_text: self.is_digital_text(doc),
            has_table_layout: self.has_table_layout(doc),
        };
        debug!("Classified document: {:?}", classification);
        classification
    }

    fn is_digital_text(&self, doc: &dyn StatementDocument) -> bool {
        match doc.document_text() {
            Ok(text) => text.trim().chars().count() > self.min_text_length,
            Err(e) => {
                warn!("Text layer unavailable, treating document as scanned: {}", e);
                false
            }
        }
    }

    fn has_table_layout(&self, doc: &dyn StatementDocument) -> bool {
        let pages = doc.page_count().min(self.sample_pages);

        for page in 1..=pages {
            match doc.tables(page) {
                Ok(tables) if tables.iter().any(|t| self.is_transaction_table(t)) => {
                    debug!("Page {} carries a transaction table", page);
                    return true;
                }
                Ok(_) => {}
                Err(e) => warn!("Table probe failed on page {}: {}", page, e),
            }

            match doc.page_text(page) {
                Ok(text) if self.is_tabular_text(&text) => {
                    debug!("Page {} reads as tabular text", page);
                    return true;
                }
                Ok(_) => {}
                Err(e) => warn!("Text probe failed on page {}: {}", page, e),
            }
        }
        false
    }

    /// Header row or first data row names a transaction column or holds a date.
    fn is_transaction_table(&self, table: &Table) -> bool {
        if table.len() < self.min_table_rows {
            return false;
        }

        table.iter().take(2).any(|row| {
            row.iter()
                .any(|cell| HEADER_KEYWORD.is_match(cell) || is_date_led(cell))
        })
    }

    /// A transaction-header phrase plus enough date-led lines.
    fn is_tabular_text(&self, text: &str) -> bool {
        if !TXN_HEADER_PHRASE.is_match(text) {
            return false;
        }
        let date_lines = text.lines().filter(|line| is_date_led(line)).count();
        date_lines >= self.min_anchor_lines
    }
}

fn is_date_led(text: &str) -> bool {
    let text = text.trim();
    DATE_NUMERIC_START.is_match(text) || DATE_DAY_MON_YEAR.is_match(text)
}
