use serde::{Deserialize, Serialize};

/// Text and confidence at one row/column intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    /// Minimum confidence of the merged fragments; `1.0` for an empty cell
    pub confidence: f64,
    /// Number of fragments merged into this cell
    pub fragment_count: usize,
}

impl Cell {
    /// A cell with no evidence. "No data" is not "low-confidence data", so
    /// its confidence is `1.0`.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 1.0,
            fragment_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragment_count == 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

/// Rectangular grid of cells. Every row has the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Vec<Cell>>,
    column_count: usize,
}

impl Table {
    /// Build a table, padding short rows with empty cells so the grid is
    /// rectangular.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize_with(column_count, Cell::empty);
        }
        Self { rows, column_count }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flatten()
    }

    /// Plain text grid for exporters.
    pub fn to_text_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.text.clone()).collect())
            .collect()
    }
}

/// Advisory quality summary of a reconstructed table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Overall score in `[0, 1]`; `None` when the table is empty
    pub confidence_score: Option<f64>,
    /// The score fell below `review_threshold`, or every input fragment was excluded
    pub needs_review: bool,
    pub row_count: usize,
    pub column_count: usize,
    /// Fragments handed to the pipeline
    pub fragment_count: usize,
    pub excluded_degenerate: usize,
    pub excluded_blank: usize,
    pub excluded_low_confidence: usize,
    pub empty_cells: usize,
    pub low_confidence_cells: usize,
    /// Rows whose fragment count differed from the final column count
    pub anomalous_rows: usize,
    pub forced_column_merges: usize,
    /// Mean confidence of non-empty cells
    pub mean_cell_confidence: Option<f64>,
    /// `1 - coefficient of variation` of per-row fragment counts, floored at 0
    pub structural_consistency: f64,
}

impl QualityMetrics {
    pub fn excluded_fragments(&self) -> usize {
        self.excluded_degenerate + self.excluded_blank + self.excluded_low_confidence
    }
}

/// Result of one pipeline run: the grid plus its quality assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTable {
    pub table: Table,
    pub quality: QualityMetrics,
}
