//! Table reconstruction pipeline orchestration.
//!
//! Runs the stages of [`crate::table`] in order over one page of fragments:
//! validation and filtering, row clustering, column resolution, cell assembly
//! and quality scoring.

use crate::core::config::TableConfig;
use crate::table::assemble::assemble_table;
use crate::table::columns::{ColumnLayout, ColumnResolution, assign_columns, resolve_columns};
use crate::table::fragment::Fragment;
use crate::table::grid::GridLayout;
use crate::table::quality::{ScoringInputs, score_table};
use crate::table::rows::{RowGroup, cluster_rows, rows_between};
use crate::table::separators::{separator_pattern, split_fragment};
use crate::table::text::normalize_fragment_text;
use crate::table::types::ParsedTable;
use crate::{Result, TafelError};
use regex::Regex;

/// Reconstructs tables from OCR fragments with a validated configuration.
///
/// A parser holds no state besides its configuration and the separator pattern
/// compiled from it. It is `Send + Sync`, and every call to
/// [`TableParser::parse`] is independent.
///
/// # Example
///
/// ```rust
/// use tafel::{BoundingBox, Fragment, TableConfig, TableParser};
///
/// # fn main() -> tafel::Result<()> {
/// let parser = TableParser::new(TableConfig::default())?;
/// let parsed = parser.parse(vec![
///     Fragment::new("Item", 0.98, BoundingBox::new(10.0, 10.0, 50.0, 30.0)),
///     Fragment::new("Price", 0.97, BoundingBox::new(200.0, 10.0, 250.0, 30.0)),
///     Fragment::new("Tea", 0.95, BoundingBox::new(10.0, 40.0, 40.0, 60.0)),
///     Fragment::new("3.50", 0.93, BoundingBox::new(205.0, 40.0, 245.0, 60.0)),
/// ])?;
///
/// assert_eq!(parsed.table.row_count(), 2);
/// assert_eq!(parsed.table.column_count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TableParser {
    config: TableConfig,
    separators: Option<Regex>,
}

impl TableParser {
    /// Create a parser, rejecting an invalid configuration up front.
    pub fn new(config: TableConfig) -> Result<Self> {
        config.validate()?;

        let separators = if config.split_on_separators {
            Some(separator_pattern(&config.column_separators)?)
        } else {
            None
        };

        Ok(Self { config, separators })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Reconstruct one table from one page of fragments.
    ///
    /// Fragments may arrive in any order. Degenerate boxes, blank text and
    /// (when `min_confidence` is set) low-confidence fragments are dropped and
    /// counted in the returned [`QualityMetrics`](crate::QualityMetrics).
    /// Empty input yields an empty table with no score.
    ///
    /// # Errors
    ///
    /// Returns `TafelError::Validation` if any fragment's confidence is NaN,
    /// infinite or outside `[0, 1]`. Nothing is reconstructed in that case.
    pub fn parse(&self, fragments: Vec<Fragment>) -> Result<ParsedTable> {
        validate_fragments(&fragments)?;

        let mut inputs = ScoringInputs {
            fragment_count: fragments.len(),
            ..Default::default()
        };
        let kept = self.filter_fragments(fragments, &mut inputs);

        let rows = cluster_rows(kept, self.config.row_tolerance);
        let resolution = resolve_columns(&rows, &self.config);

        Ok(self.finish(rows, resolution, inputs))
    }

    /// Place fragments on a caller-supplied grid instead of inferring one.
    ///
    /// Every fragment lands in the cell holding its center, so the table always
    /// has `grid.row_count()` rows and `grid.column_count()` columns; cells
    /// nothing falls into stay empty. Filtering, separator splitting and
    /// scoring work as in [`TableParser::parse`].
    ///
    /// # Errors
    ///
    /// Returns `TafelError::Validation` for an invalid grid line or fragment
    /// confidence.
    pub fn parse_with_grid(&self, fragments: Vec<Fragment>, grid: &GridLayout) -> Result<ParsedTable> {
        grid.validate()?;
        validate_fragments(&fragments)?;

        let mut inputs = ScoringInputs {
            fragment_count: fragments.len(),
            ..Default::default()
        };
        let kept = self.filter_fragments(fragments, &mut inputs);

        let rows = rows_between(kept, &grid.row_lines);
        let resolution = assign_columns(&rows, ColumnLayout::from_lines(&grid.column_lines));

        Ok(self.finish(rows, resolution, inputs))
    }

    fn finish(&self, rows: Vec<RowGroup>, resolution: ColumnResolution, mut inputs: ScoringInputs) -> ParsedTable {
        inputs.row_fragment_counts = rows.iter().map(|row| row.len()).collect();
        inputs.forced_column_merges = resolution.forced_merges;

        let table = assemble_table(rows, &resolution);
        let quality = score_table(&table, &inputs, &self.config);

        let excluded = quality.excluded_fragments();
        if excluded > 0 {
            tracing::warn!(
                "Excluded {} of {} fragments ({} degenerate, {} blank, {} below min_confidence)",
                excluded,
                inputs.fragment_count,
                quality.excluded_degenerate,
                quality.excluded_blank,
                quality.excluded_low_confidence
            );
        }

        tracing::info!(
            rows = quality.row_count,
            columns = quality.column_count,
            fragments = inputs.fragment_count,
            score = ?quality.confidence_score,
            needs_review = quality.needs_review,
            "Table reconstructed"
        );

        ParsedTable { table, quality }
    }

    /// Drop unusable fragments, counting each input fragment at most once, and
    /// cut the rest at column separators when enabled.
    fn filter_fragments(&self, fragments: Vec<Fragment>, inputs: &mut ScoringInputs) -> Vec<Fragment> {
        let mut kept = Vec::with_capacity(fragments.len());
        let mut split = 0;

        for fragment in fragments {
            if fragment.bbox.is_degenerate() {
                tracing::debug!("Dropping fragment '{}' with degenerate box", fragment.text);
                inputs.excluded_degenerate += 1;
                continue;
            }

            let confidence = fragment.confidence;
            let pieces = match &self.separators {
                Some(pattern) => split_fragment(fragment, pattern, self.config.min_column_width),
                None => vec![fragment],
            };
            let piece_count = pieces.len();

            let pieces: Vec<Fragment> = pieces
                .into_iter()
                .map(|piece| self.normalize(piece))
                .filter(|piece| !piece.text.trim().is_empty())
                .collect();

            if pieces.is_empty() {
                inputs.excluded_blank += 1;
                continue;
            }

            if confidence < self.config.min_confidence {
                inputs.excluded_low_confidence += 1;
                continue;
            }

            if piece_count > 1 {
                split += 1;
            }
            kept.extend(pieces);
        }

        if split > 0 {
            tracing::debug!("Split {} fragments at column separators", split);
        }
        tracing::debug!("{} of {} fragments kept for clustering", kept.len(), inputs.fragment_count);

        kept
    }

    fn normalize(&self, mut fragment: Fragment) -> Fragment {
        if self.config.normalize_whitespace {
            let normalized = normalize_fragment_text(&fragment.text);
            if normalized != fragment.text.as_str() {
                fragment.text = normalized.into_owned();
            }
        }
        fragment
    }
}

/// Reconstruct a table with a one-off parser.
///
/// Equivalent to `TableParser::new(config.clone())?.parse(fragments)`.
pub fn parse_fragments(fragments: Vec<Fragment>, config: &TableConfig) -> Result<ParsedTable> {
    TableParser::new(config.clone())?.parse(fragments)
}

fn validate_fragments(fragments: &[Fragment]) -> Result<()> {
    match fragments.iter().position(|fragment| !fragment.has_valid_confidence()) {
        Some(index) => Err(TafelError::validation(format!(
            "Fragment {} ('{}') has confidence {}; expected a finite value in [0, 1]",
            index, fragments[index].text, fragments[index].confidence
        ))),
        None => Ok(()),
    }
}
