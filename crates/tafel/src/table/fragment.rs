//! Fragment model: one OCR detection with its geometry and confidence.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Axis-aligned bounding box in image pixel coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a box from Tesseract-style `left, top, width, height`.
    pub fn from_ltwh(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Axis-aligned hull of a quadrilateral, as returned by detectors that emit
    /// rotated text boxes (four `[x, y]` corner points in any order).
    pub fn from_quad(points: &[[f64; 2]; 4]) -> Self {
        let mut left = f64::INFINITY;
        let mut top = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        let mut bottom = f64::NEG_INFINITY;

        for [x, y] in points {
            left = left.min(*x);
            top = top.min(*y);
            right = right.max(*x);
            bottom = bottom.max(*y);
        }

        Self::new(left, top, right, bottom)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Zero-area, inverted or non-finite boxes cannot be placed on the grid.
    pub fn is_degenerate(&self) -> bool {
        let finite = self.left.is_finite() && self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite();
        !finite || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Whether the vertical extents `[top, bottom]` of the box and the band intersect.
    pub fn overlaps_vertically(&self, band_top: f64, band_bottom: f64) -> bool {
        self.top < band_bottom && band_top < self.bottom
    }
}

/// One recognized text span.
///
/// `confidence` is on the `[0, 1]` scale. Engines reporting percentages are
/// rescaled by the input adapters in [`crate::table::input`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Fragment {
    pub fn new(text: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.bbox.center_x()
    }

    pub fn center_y(&self) -> f64 {
        self.bbox.center_y()
    }

    pub fn height(&self) -> f64 {
        self.bbox.height()
    }

    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }

    /// Top-to-bottom reading order with a total tie-break, so sorting never
    /// depends on the order fragments arrived in.
    pub(crate) fn vertical_order(&self, other: &Self) -> Ordering {
        self.center_y()
            .total_cmp(&other.center_y())
            .then_with(|| self.center_x().total_cmp(&other.center_x()))
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.confidence.total_cmp(&other.confidence))
    }

    /// Left-to-right order within a row, with the same total tie-break.
    pub(crate) fn horizontal_order(&self, other: &Self) -> Ordering {
        self.center_x()
            .total_cmp(&other.center_x())
            .then_with(|| self.center_y().total_cmp(&other.center_y()))
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.confidence.total_cmp(&other.confidence))
    }
}

/// Median of a slice of finite values. Even-length inputs average the two
/// middle values. Returns `0.0` for an empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_derived_geometry() {
        let bbox = BoundingBox::from_ltwh(100.0, 50.0, 80.0, 30.0);

        assert_eq!(bbox.right, 180.0);
        assert_eq!(bbox.bottom, 80.0);
        assert_eq!(bbox.width(), 80.0);
        assert_eq!(bbox.height(), 30.0);
        assert_eq!(bbox.center_x(), 140.0);
        assert_eq!(bbox.center_y(), 65.0);
    }

    #[test]
    fn test_bbox_from_skewed_quad() {
        let quad = [[12.0, 10.0], [98.0, 14.0], [96.0, 40.0], [10.0, 36.0]];
        let bbox = BoundingBox::from_quad(&quad);

        assert_eq!(bbox, BoundingBox::new(10.0, 10.0, 98.0, 40.0));
    }

    #[test]
    fn test_bbox_degenerate() {
        assert!(BoundingBox::new(10.0, 10.0, 10.0, 20.0).is_degenerate());
        assert!(BoundingBox::new(10.0, 20.0, 30.0, 10.0).is_degenerate());
        assert!(BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0).is_degenerate());
        assert!(BoundingBox::new(0.0, 0.0, f64::INFINITY, 10.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_bbox_vertical_overlap() {
        let bbox = BoundingBox::new(0.0, 10.0, 50.0, 30.0);

        assert!(bbox.overlaps_vertically(25.0, 60.0));
        assert!(bbox.overlaps_vertically(0.0, 12.0));
        assert!(!bbox.overlaps_vertically(30.0, 60.0));
        assert!(!bbox.overlaps_vertically(0.0, 10.0));
    }

    #[test]
    fn test_fragment_confidence_range() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert!(Fragment::new("a", 0.0, bbox).has_valid_confidence());
        assert!(Fragment::new("a", 1.0, bbox).has_valid_confidence());
        assert!(!Fragment::new("a", 1.01, bbox).has_valid_confidence());
        assert!(!Fragment::new("a", -0.1, bbox).has_valid_confidence());
        assert!(!Fragment::new("a", f64::NAN, bbox).has_valid_confidence());
    }

    #[test]
    fn test_fragment_serde_field_names() {
        let fragment = Fragment::new("Total", 0.9, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_value(&fragment).unwrap();

        assert_eq!(json["text"], "Total");
        assert_eq!(json["confidence"], 0.9);
        assert_eq!(json["bbox"]["left"], 1.0);
        assert_eq!(json["bbox"]["bottom"], 4.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0]), 3.0);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
