//! Separator splitting for line-level fragments.
//!
//! Some engines (PaddleOCR in line mode among them) report a whole table line
//! as a single fragment, e.g. `Lima | 10.7M | Peru`. Left alone, that line
//! becomes one cell. When `split_on_separators` is enabled the text is cut at
//! column separators and every piece gets the horizontal slice of the box
//! matching its character offsets, so the column resolver sees one fragment
//! per cell.

use super::fragment::{BoundingBox, Fragment};
use crate::{Result, TafelError};
use regex::Regex;

/// Compile the configured separators into one alternation.
///
/// A tab matches any run of tabs and a double space any run of two or more
/// whitespace characters. Every other separator is matched literally,
/// repeats included.
pub fn separator_pattern(separators: &[String]) -> Result<Regex> {
    let alternatives: Vec<String> = separators
        .iter()
        .map(|separator| match separator.as_str() {
            "\t" => r"\t+".to_string(),
            "  " => r"\s{2,}".to_string(),
            other => format!("(?:{})+", regex::escape(other)),
        })
        .collect();

    Regex::new(&alternatives.join("|")).map_err(|e| {
        TafelError::validation_with_source(format!("Invalid column separators {:?}", separators), e)
    })
}

/// Split one fragment at separator matches.
///
/// Pieces are trimmed, and pieces shorter than `min_width` characters are
/// dropped. Each piece keeps the fragment's confidence. A fragment without a
/// separator, or whose pieces are all too narrow, comes back whole. Text made
/// of nothing but separators yields no pieces.
pub fn split_fragment(fragment: Fragment, pattern: &Regex, min_width: usize) -> Vec<Fragment> {
    if !pattern.is_match(&fragment.text) {
        return vec![fragment];
    }

    let text = fragment.text.as_str();
    let total_chars = text.chars().count();
    let mut pieces = Vec::new();
    let mut narrow = false;
    let mut start = 0;

    let cuts = pattern
        .find_iter(text)
        .map(|separator| (separator.start(), separator.end()))
        .chain(std::iter::once((text.len(), text.len())));

    for (cut_start, cut_end) in cuts {
        let raw = &text[start..cut_start];
        let piece_start = start + (raw.len() - raw.trim_start().len());
        let piece = raw.trim();
        start = cut_end;

        if piece.is_empty() {
            continue;
        }
        if piece.chars().count() < min_width {
            narrow = true;
            continue;
        }

        let from = text[..piece_start].chars().count();
        let to = from + piece.chars().count();
        pieces.push(Fragment::new(
            piece,
            fragment.confidence,
            horizontal_slice(&fragment.bbox, total_chars, from, to),
        ));
    }

    if pieces.is_empty() && narrow {
        return vec![fragment];
    }

    pieces
}

/// The part of `bbox` covering characters `from..to` of `total` equally wide ones.
fn horizontal_slice(bbox: &BoundingBox, total: usize, from: usize, to: usize) -> BoundingBox {
    let width = bbox.width();
    let total = total as f64;

    BoundingBox::new(
        bbox.left + width * from as f64 / total,
        bbox.top,
        bbox.left + width * to as f64 / total,
        bbox.bottom,
    )
}
