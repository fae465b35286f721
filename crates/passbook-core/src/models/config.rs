//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the passbook pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassbookConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Block and field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Minimum trimmed text length to consider a PDF born-digital.
    pub min_text_length: usize,

    /// Number of leading pages sampled when looking for a table layout.
    pub classify_pages: u32,

    /// Pages with less text than this are OCR'd individually when the
    /// institution allows per-page backfill.
    pub page_ocr_threshold: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            min_text_length: 50,
            classify_pages: 3,
            page_ocr_threshold: 80,
            max_pages: 0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers in recognized text.
    pub keep_unk: bool,

    /// Vertical distance (px) within which boxes share a text row.
    pub row_tolerance_px: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            row_tolerance_px: 20.0,
        }
    }
}

/// Block and field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rows a detected table needs before it counts during classification.
    pub min_table_rows: usize,

    /// Date-led lines needed by the tabular-text heuristic.
    pub min_anchor_lines: usize,

    /// Store a parsed amount of zero as absent.
    pub drop_zero_amounts: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_table_rows: 2,
            min_anchor_lines: 3,
            drop_zero_amounts: true,
        }
    }
}

impl PassbookConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Get full path to an OCR model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.ocr.model_path(model_name)
    }
}

impl OcrConfig {
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}
