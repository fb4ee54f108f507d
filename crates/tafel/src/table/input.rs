//! Input adapters: turn OCR engine output into [`Fragment`]s.
//!
//! The pipeline itself is engine-agnostic. These adapters cover the two
//! output formats hosts most often hand over: Tesseract TSV and PaddleOCR's
//! `[quad, [text, confidence]]` lists. Native fragment JSON is also accepted.

use super::fragment::{BoundingBox, Fragment};
use crate::{Result, TafelError};
use serde::Deserialize;

/// Minimum number of tab-separated fields in a Tesseract TSV data line.
const TSV_MIN_FIELDS: usize = 12;

/// Tesseract TSV `level` value for word entries.
const TSV_WORD_LEVEL: u32 = 5;

/// Extract word fragments from Tesseract TSV output.
///
/// This parses Tesseract's TSV format (level, page_num, block_num, ...) and keeps
/// word-level rows only. Tesseract reports confidence on a 0-100 scale; it is
/// rescaled to 0-1, and `min_confidence` is compared on that scale. Non-word
/// rows (confidence `-1`), blank words and malformed lines are skipped.
pub fn fragments_from_tsv(tsv_data: &str, min_confidence: f64) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();

    for (line_num, line) in tsv_data.lines().enumerate() {
        if line_num == 0 {
            continue;
        }

        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].trim().parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let conf = fields[10].trim().parse::<f64>().unwrap_or(-1.0);
        if !(0.0..=100.0).contains(&conf) {
            continue;
        }
        let confidence = conf / 100.0;
        if confidence < min_confidence {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let geometry: Option<Vec<f64>> = fields[6..10].iter().map(|f| f.trim().parse::<f64>().ok()).collect();
        let Some(geometry) = geometry else {
            tracing::debug!("Skipping TSV line {}: unparseable geometry", line_num + 1);
            continue;
        };

        fragments.push(Fragment::new(
            text,
            confidence,
            BoundingBox::from_ltwh(geometry[0], geometry[1], geometry[2], geometry[3]),
        ));
    }

    tracing::debug!("Extracted {} word fragments from TSV", fragments.len());

    Ok(fragments)
}

/// One PaddleOCR detection: a quadrilateral and a `(text, confidence)` pair.
#[derive(Debug, Deserialize)]
struct PaddleDetection([[f64; 2]; 4], (String, f64));

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PaddlePayload {
    Page(Vec<PaddleDetection>),
    Pages(Vec<Vec<PaddleDetection>>),
}

/// Convert PaddleOCR JSON output into fragments.
///
/// Accepts either one page (`[[quad, [text, conf]], ...]`) or the engine's
/// per-image wrapper holding a single page (`[[[quad, [text, conf]], ...]]`).
/// Each quad's axis-aligned hull becomes the fragment's box.
///
/// # Errors
///
/// Returns `TafelError::Serialization` for JSON that matches neither shape,
/// and `TafelError::Parsing` when the wrapper holds more than one page.
pub fn fragments_from_paddle_json(json: &str) -> Result<Vec<Fragment>> {
    let payload: PaddlePayload = serde_json::from_str(json)?;

    let detections = match payload {
        PaddlePayload::Page(detections) => detections,
        PaddlePayload::Pages(mut pages) => match pages.len() {
            0 => Vec::new(),
            1 => pages.remove(0),
            n => {
                return Err(TafelError::parsing(format!(
                    "PaddleOCR output holds {} pages; pass one page per conversion",
                    n
                )));
            }
        },
    };

    Ok(detections
        .into_iter()
        .map(|PaddleDetection(quad, (text, confidence))| {
            Fragment::new(text, confidence, BoundingBox::from_quad(&quad))
        })
        .collect())
}

/// Parse a JSON array of fragments (`[{"text", "confidence", "bbox"}, ...]`).
pub fn fragments_from_json(json: &str) -> Result<Vec<Fragment>> {
    Ok(serde_json::from_str(json)?)
}
