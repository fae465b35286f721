//! Core library for bank statement extraction.
//!
//! This crate provides:
//! - Statement documents over PDF text layers, layout tables and page images
//! - OCR for scanned pages using PaddleOCR models
//! - Per-institution schemas mapping blocks onto canonical transaction records
//! - Balance-delta reconciliation when debit/credit columns are unreadable

pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod statement;

pub use error::{PassbookError, Result};
pub use models::config::PassbookConfig;
pub use models::{TransactionRecord, VoucherKind};
pub use ocr::OcrProvider;
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{MemoryDocument, PdfDocument, StatementDocument};
pub use statement::{ExtractionOrchestrator, SchemaRegistry};
