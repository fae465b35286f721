//! OCR for scanned statement pages.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Anything that turns a rendered page into text, one visual row per line.
pub trait OcrProvider {
    fn recognize(&self, page: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognized text box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],
    pub text: String,
    pub confidence: f32,
}

impl TextBox {
    /// Axis-aligned bounds as (min_x, min_y, max_x, max_y).
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Sort boxes into reading order and join each visual row into one line.
///
/// A row starts at the top edge of its highest box; every following box whose
/// top edge lies within `row_tolerance` of it joins the row. Within a row
/// boxes are ordered left to right.
pub fn boxes_to_lines(mut boxes: Vec<TextBox>, row_tolerance: f32) -> Vec<String> {
    let tolerance = if row_tolerance > 0.0 { row_tolerance } else { 20.0 };
    let by = |a: f32, b: f32| a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal);

    boxes.retain(|b| !b.text.trim().is_empty());
    boxes.sort_by(|a, b| by(a.rect().1, b.rect().1));

    let mut rows: Vec<(f32, Vec<TextBox>)> = Vec::new();
    for text_box in boxes {
        let top = text_box.rect().1;
        match rows.last_mut() {
            Some((row_top, members)) if top - *row_top <= tolerance => members.push(text_box),
            _ => rows.push((top, vec![text_box])),
        }
    }

    rows.into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| by(a.rect().0, b.rect().0));
            members
                .iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 12.0, x, y + 12.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_rows_join_left_to_right() {
        let boxes = vec![
            text_box(300.0, 42.0, "9,500.00"),
            text_box(10.0, 40.0, "01-04-2025"),
            text_box(120.0, 45.0, "UPI/ACME"),
            text_box(10.0, 80.0, "PAYMENT"),
        ];
        assert_eq!(
            boxes_to_lines(boxes, 20.0),
            vec!["01-04-2025 UPI/ACME 9,500.00", "PAYMENT"]
        );
    }

    #[test]
    fn test_row_straddling_tolerance_boundary() {
        let boxes = vec![
            text_box(200.0, 21.0, "1,250.00"),
            text_box(10.0, 19.0, "02-04-2025"),
            text_box(10.0, 60.0, "03-04-2025"),
        ];
        assert_eq!(
            boxes_to_lines(boxes, 20.0),
            vec!["02-04-2025 1,250.00", "03-04-2025"]
        );
    }

    #[test]
    fn test_blank_boxes_are_skipped() {
        let boxes = vec![text_box(10.0, 10.0, "  "), text_box(10.0, 50.0, "A")];
        assert_eq!(boxes_to_lines(boxes, 0.0), vec!["A"]);
    }
}
