//! Strategy selection and the table → text → OCR fallback chain.

use std::fmt;

use tracing::{debug, info, warn};

use super::blocks::BlockReconstructor;
use super::classifier::{Classification, DocumentClassifier};
use super::mapper::FieldMapper;
use super::reconcile::Reconciler;
use super::schema::{InstitutionSchema, SchemaRegistry, SourceKind, TokenScanLayout};
use crate::error::{ExtractionError, Result};
use crate::models::TransactionRecord;
use crate::models::config::PassbookConfig;
use crate::ocr::OcrProvider;
use crate::pdf::{PdfDocument, StatementDocument};

type StrategyResult = std::result::Result<Vec<TransactionRecord>, ExtractionError>;

/// One way of turning a document into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Table,
    Text,
    Ocr,
}

impl Strategy {
    /// Fixed priority order.
    pub const ORDER: [Strategy; 3] = [Strategy::Table, Strategy::Text, Strategy::Ocr];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Table => "table",
            Strategy::Text => "text",
            Strategy::Ocr => "ocr",
        }
    }

    fn source(&self) -> SourceKind {
        match self {
            Strategy::Table => SourceKind::Table,
            Strategy::Text => SourceKind::Text,
            Strategy::Ocr => SourceKind::Ocr,
        }
    }

    /// Whether the classification allows this strategy at all.
    fn eligible(&self, classification: &Classification) -> bool {
        match self {
            Strategy::Table => classification.has_table_layout,
            // A detected table owns the text layer; its rows are not re-read as free text.
            Strategy::Text => classification.is_digital_text && !classification.has_table_layout,
            Strategy::Ocr => true,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs the extraction pipeline for one document at a time.
///
/// Holds no per-document state: every call builds its own classifier result,
/// mapper and reconciler, so one orchestrator can serve many documents.
pub struct ExtractionOrchestrator {
    registry: SchemaRegistry,
    config: PassbookConfig,
    ocr: Option<Box<dyn OcrProvider>>,
}

impl Default for ExtractionOrchestrator {
    fn default() -> Self {
        Self::new(SchemaRegistry::builtin(), PassbookConfig::default())
    }
}

impl ExtractionOrchestrator {
    pub fn new(registry: SchemaRegistry, config: PassbookConfig) -> Self {
        Self {
            registry,
            config,
            ocr: None,
        }
    }

    /// Enable the OCR strategy and per-page backfill.
    pub fn with_ocr(mut self, ocr: Box<dyn OcrProvider>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PassbookConfig {
        &self.config
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract transactions from PDF bytes.
    ///
    /// An unknown institution is an error. A document that cannot be opened
    /// (corrupt, wrong password) yields an empty list.
    pub fn extract_from_pdf(
        &self,
        data: &[u8],
        institution: &str,
        password: Option<&str>,
    ) -> Result<Vec<TransactionRecord>> {
        let schema = self.registry.get(institution)?;

        let document = match PdfDocument::load(data, password) {
            Ok(document) => document,
            Err(e) => {
                warn!("Could not open statement: {}", e);
                return Ok(Vec::new());
            }
        };

        Ok(self.run(&document, schema))
    }

    /// Extract transactions from an already opened document.
    pub fn extract_transactions(
        &self,
        document: &dyn StatementDocument,
        institution: &str,
    ) -> Result<Vec<TransactionRecord>> {
        let schema = self.registry.get(institution)?;
        Ok(self.run(document, schema))
    }

    fn run(&self, document: &dyn StatementDocument, schema: &InstitutionSchema) -> Vec<TransactionRecord> {
        let classification = DocumentClassifier::from_config(&self.config).classify(document);
        info!(
            "{}: {} pages, digital text: {}, table layout: {}",
            schema.name,
            document.page_count(),
            classification.is_digital_text,
            classification.has_table_layout
        );

        for strategy in self.plan(&classification, schema) {
            debug!("Trying {} strategy", strategy);
            match self.attempt(strategy, document, schema) {
                Ok(records) if !records.is_empty() => {
                    info!("{} strategy produced {} records", strategy, records.len());
                    return records;
                }
                Ok(_) => debug!("{} strategy produced no records", strategy),
                Err(e) => warn!("{}", e),
            }
        }

        warn!("No strategy produced records for {}", schema.name);
        Vec::new()
    }

    /// Strategies to try, in order.
    pub fn plan(&self, classification: &Classification, schema: &InstitutionSchema) -> Vec<Strategy> {
        Strategy::ORDER
            .into_iter()
            .filter(|s| s.eligible(classification) && schema.supports(s.source()))
            .collect()
    }

    fn attempt(&self, strategy: Strategy, document: &dyn StatementDocument, schema: &InstitutionSchema) -> StrategyResult {
        match strategy {
            Strategy::Table => self.table_strategy(document, schema),
            Strategy::Text => self.text_strategy(document, schema),
            Strategy::Ocr => self.ocr_strategy(document, schema),
        }
    }

    fn pages(&self, document: &dyn StatementDocument) -> std::ops::RangeInclusive<u32> {
        let count = document.page_count();
        let max = self.config.pdf.max_pages;
        1..=if max > 0 { count.min(max) } else { count }
    }

    fn mapper<'s>(&self, schema: &'s InstitutionSchema) -> FieldMapper<'s> {
        FieldMapper::new(schema).with_drop_zero(self.config.extraction.drop_zero_amounts)
    }

    fn no_layout(schema: &InstitutionSchema, strategy: Strategy) -> ExtractionError {
        ExtractionError::NoLayout {
            institution: schema.key.to_string(),
            source_kind: strategy.source().to_string(),
        }
    }

    fn table_strategy(&self, document: &dyn StatementDocument, schema: &InstitutionSchema) -> StrategyResult {
        let layout = schema
            .table
            .as_ref()
            .ok_or_else(|| Self::no_layout(schema, Strategy::Table))?;

        let mut rows = Vec::new();
        for page in self.pages(document) {
            let tables = document
                .tables(page)
                .map_err(|e| ExtractionError::raw(Strategy::Table.name(), e))?;
            rows.extend(tables.into_iter().flatten());
        }

        let noise = schema.noise_filter(layout.skip_rows());
        let blocks = BlockReconstructor::new(layout.anchor(), &noise).reconstruct_rows(&rows);
        debug!("{} rows grouped into {} row blocks", rows.len(), blocks.len());

        let mapper = self.mapper(schema);
        Ok(blocks
            .iter()
            .filter_map(|block| match mapper.map_row(block, layout) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Dropped row block {:?}: {}", block.anchor, e);
                    None
                }
            })
            .collect())
    }

    fn text_strategy(&self, document: &dyn StatementDocument, schema: &InstitutionSchema) -> StrategyResult {
        let layout = schema
            .text
            .as_ref()
            .ok_or_else(|| Self::no_layout(schema, Strategy::Text))?;

        let mut pages = Vec::new();
        for page in self.pages(document) {
            let mut lines = document
                .page_lines(page)
                .map_err(|e| ExtractionError::raw(Strategy::Text.name(), e))?;

            if schema.ocr_backfill && text_length(&lines) < self.config.pdf.page_ocr_threshold {
                if let Some(recognized) = self.backfill(document, schema, page) {
                    lines = recognized;
                }
            }
            pages.push(lines);
        }

        if pages.iter().all(|lines| lines.is_empty()) {
            // No per-page text layer; fall back to the whole-document read.
            let text = document
                .document_text()
                .map_err(|e| ExtractionError::raw(Strategy::Text.name(), e))?;
            pages = vec![text.lines().map(str::to_string).collect()];
        }

        Ok(self.map_pages(schema, layout, &pages))
    }

    /// OCR one thin page during the text strategy.
    fn backfill(&self, document: &dyn StatementDocument, schema: &InstitutionSchema, page: u32) -> Option<Vec<String>> {
        let ocr = self.ocr.as_deref()?;
        match self.recognize_page(document, ocr, page) {
            Ok(lines) => {
                info!("Page {} text layer too thin, using OCR ({} lines)", page, lines.len());
                let cleaned = match schema.ocr.as_ref() {
                    Some(ocr_layout) => lines.iter().map(|l| ocr_layout.clean_line(l)).collect(),
                    None => lines,
                };
                Some(cleaned)
            }
            Err(e) => {
                warn!("OCR backfill failed on page {}: {}", page, e);
                None
            }
        }
    }

    fn ocr_strategy(&self, document: &dyn StatementDocument, schema: &InstitutionSchema) -> StrategyResult {
        let layout = schema
            .ocr
            .as_ref()
            .ok_or_else(|| Self::no_layout(schema, Strategy::Ocr))?;
        let ocr = self
            .ocr
            .as_deref()
            .ok_or_else(|| ExtractionError::raw(Strategy::Ocr.name(), "no OCR engine configured"))?;

        let mut pages = Vec::new();
        let mut last_error = None;
        for page in self.pages(document) {
            match self.recognize_page(document, ocr, page) {
                Ok(lines) => pages.push(lines),
                Err(e) => {
                    warn!("OCR failed on page {}: {}", page, e);
                    pages.push(Vec::new());
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            if pages.iter().all(|lines| lines.is_empty()) {
                return Err(e);
            }
        }

        Ok(self.map_pages(schema, layout, &pages))
    }

    fn recognize_page(
        &self,
        document: &dyn StatementDocument,
        ocr: &dyn OcrProvider,
        page: u32,
    ) -> std::result::Result<Vec<String>, ExtractionError> {
        let image = document
            .render_page(page, self.config.pdf.render_dpi)
            .map_err(|e| ExtractionError::raw(Strategy::Ocr.name(), e))?;
        let text = ocr
            .recognize(&image)
            .map_err(|e| ExtractionError::raw(Strategy::Ocr.name(), e))?;
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Block reconstruction, field mapping and reconciliation over page lines.
    fn map_pages(&self, schema: &InstitutionSchema, layout: &TokenScanLayout, pages: &[Vec<String>]) -> Vec<TransactionRecord> {
        let cleaned: Vec<Vec<String>> = pages
            .iter()
            .map(|lines| lines.iter().map(|line| layout.clean_line(line)).collect())
            .collect();

        let noise = schema.noise_filter(&layout.skip_lines);
        let blocks = BlockReconstructor::new(&layout.anchor, &noise)
            .with_sections(&layout.sections)
            .with_repairs(&schema.repairs)
            .with_page_breaks(layout.close_on_page_break)
            .reconstruct_pages(&cleaned);
        debug!("Reconstructed {} text blocks", blocks.len());

        let mapper = self.mapper(schema);
        let mut reconciler = Reconciler::new();
        let mut records = Vec::with_capacity(blocks.len());

        for block in &blocks {
            match mapper.map_text(block, layout) {
                Ok(mapped) if mapped.needs_reconcile => {
                    let reconciled = reconciler.step(&mapped.amounts);
                    records.push(mapper.apply_reconciled(mapped, reconciled));
                }
                Ok(mapped) => records.push(mapped.record),
                Err(e) => debug!("Dropped block {:?}: {}", block.anchor, e),
            }
        }
        records
    }
}

fn text_length(lines: &[String]) -> usize {
    lines.iter().map(|line| line.trim().chars().count()).sum()
}
