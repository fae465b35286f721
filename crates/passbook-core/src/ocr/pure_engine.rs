//! OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use super::{OcrProvider, TextBox, boxes_to_lines};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
    row_tolerance_px: f32,
}

impl PureOcrEngine {
    /// Load the detection and recognition models named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("missing model file {}", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
            row_tolerance_px: config.row_tolerance_px,
        })
    }

    /// Recognize every text box on a page.
    pub fn text_boxes(&self, page: &DynamicImage) -> Result<Vec<TextBox>, OcrError> {
        if page.width() == 0 || page.height() == 0 {
            return Err(OcrError::InvalidImage("empty page image".to_string()));
        }

        let results = self
            .engine
            .run_from_image(page)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        Ok(results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect())
    }
}

impl OcrProvider for PureOcrEngine {
    fn recognize(&self, page: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let boxes = self.text_boxes(page)?;
        debug!("pure-onnx-ocr returned {} text regions", boxes.len());

        let lines = boxes_to_lines(boxes, self.row_tolerance_px);
        info!(
            "OCR complete: {} lines in {}ms",
            lines.len(),
            start.elapsed().as_millis()
        );
        Ok(lines.join("\n"))
    }
}

/// First four exterior points of a polygon as `[x1, y1, .., x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
