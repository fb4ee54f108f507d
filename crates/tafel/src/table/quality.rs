//! Quality scoring for reconstructed tables.
//!
//! The score is advisory. It never blocks export; it tells the host when a
//! human should look at the result.

use super::types::{QualityMetrics, Table};
use crate::core::config::TableConfig;

/// Pipeline state the scorer needs besides the table itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringInputs {
    /// Fragment count of every row before it was normalized onto the grid
    pub row_fragment_counts: Vec<usize>,
    pub forced_column_merges: usize,
    pub fragment_count: usize,
    pub excluded_degenerate: usize,
    pub excluded_blank: usize,
    pub excluded_low_confidence: usize,
}

/// Grade a reconstructed table.
///
/// `confidence_score = mean_cell_confidence * (1 - structure_weight * (1 - structural_consistency))`
///
/// Empty cells are left out of the mean: they carry no evidence either way.
/// An empty table has no score (`None`), which is distinct from a low one.
pub fn score_table(table: &Table, inputs: &ScoringInputs, config: &TableConfig) -> QualityMetrics {
    let column_count = table.column_count();

    let mut empty_cells = 0;
    let mut low_confidence_cells = 0;
    let mut confidence_sum = 0.0;
    let mut filled_cells = 0usize;

    for cell in table.cells() {
        if cell.is_empty() {
            empty_cells += 1;
            continue;
        }
        filled_cells += 1;
        confidence_sum += cell.confidence;
        if cell.confidence < config.low_confidence_threshold {
            low_confidence_cells += 1;
        }
    }

    let mean_cell_confidence = (filled_cells > 0).then(|| confidence_sum / filled_cells as f64);

    let anomalous_rows = inputs
        .row_fragment_counts
        .iter()
        .filter(|&&count| count != column_count)
        .count();

    let structural_consistency = structural_consistency(&inputs.row_fragment_counts);

    let confidence_score = mean_cell_confidence.map(|mean| {
        let penalty = config.structure_weight * (1.0 - structural_consistency);
        (mean * (1.0 - penalty)).clamp(0.0, 1.0)
    });

    let excluded = inputs.excluded_degenerate + inputs.excluded_blank + inputs.excluded_low_confidence;
    let needs_review = match confidence_score {
        Some(score) => score < config.review_threshold,
        None => inputs.fragment_count > 0 && excluded == inputs.fragment_count,
    };

    QualityMetrics {
        confidence_score,
        needs_review,
        row_count: table.row_count(),
        column_count,
        fragment_count: inputs.fragment_count,
        excluded_degenerate: inputs.excluded_degenerate,
        excluded_blank: inputs.excluded_blank,
        excluded_low_confidence: inputs.excluded_low_confidence,
        empty_cells,
        low_confidence_cells,
        anomalous_rows,
        forced_column_merges: inputs.forced_column_merges,
        mean_cell_confidence,
        structural_consistency,
    }
}

/// `1 - cv` of the per-row fragment counts, floored at zero. Rows that all
/// carry the same number of fragments score `1.0`.
fn structural_consistency(row_counts: &[usize]) -> f64 {
    if row_counts.len() < 2 {
        return 1.0;
    }

    let n = row_counts.len() as f64;
    let mean = row_counts.iter().sum::<usize>() as f64 / n;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = row_counts
        .iter()
        .map(|&count| {
            let delta = count as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;

    (1.0 - variance.sqrt() / mean).max(0.0)
}
