//! Column resolution over the whole table.
//!
//! Per-row column detection breaks down when rows have missing cells, so the
//! `center_x` of every fragment is pooled into one sorted sequence and split at
//! gaps wider than a threshold. The resulting layout is shared by all rows.
//! Tables whose columns are not roughly aligned are a known limitation.

use super::fragment::{Fragment, median};
use super::rows::RowGroup;
use crate::core::config::TableConfig;
use serde::{Deserialize, Serialize};

/// Column boundaries shared by every row.
///
/// `boundaries` are strictly increasing; a layout with `n` boundaries has
/// `n + 1` column slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    boundaries: Vec<f64>,
}

impl ColumnLayout {
    /// A layout with one column covering the whole axis.
    pub fn single() -> Self {
        Self { boundaries: Vec::new() }
    }

    /// A layout from caller-supplied, strictly increasing column lines.
    pub(crate) fn from_lines(lines: &[f64]) -> Self {
        Self {
            boundaries: lines.to_vec(),
        }
    }

    fn from_clusters(clusters: &[XCluster]) -> Self {
        let boundaries = clusters
            .windows(2)
            .map(|pair| (pair[0].max + pair[1].min) / 2.0)
            .collect();
        Self { boundaries }
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn column_count(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Column slot of an x-position: the number of boundaries at or left of it.
    pub fn slot_of(&self, x: f64) -> usize {
        self.boundaries.partition_point(|boundary| *boundary <= x)
    }
}

/// Output of [`resolve_columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnResolution {
    pub layout: ColumnLayout,
    /// Column index of every fragment, parallel to the rows and their fragments
    pub assignments: Vec<Vec<usize>>,
    /// Cluster merges forced by `max_columns`
    pub forced_merges: usize,
    /// Gap width (pixels) above which two x-positions start a new column
    pub gap_threshold: f64,
}

impl ColumnResolution {
    pub fn column_count(&self) -> usize {
        self.layout.column_count()
    }
}

/// A contiguous run of pooled x-positions.
#[derive(Debug, Clone, Copy, PartialEq)]
struct XCluster {
    min: f64,
    max: f64,
    count: usize,
}

impl XCluster {
    fn start(x: f64) -> Self {
        Self { min: x, max: x, count: 1 }
    }

    fn absorb(&mut self, other: &XCluster) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count += other.count;
    }
}

/// Resolve one column layout for all rows and assign every fragment a column.
///
/// A table with a single fragment, or whose x-positions never separate,
/// resolves to one column.
pub fn resolve_columns(rows: &[RowGroup], config: &TableConfig) -> ColumnResolution {
    let mut xs: Vec<f64> = rows
        .iter()
        .flat_map(|row| row.fragments().iter().map(Fragment::center_x))
        .collect();

    if xs.is_empty() {
        return ColumnResolution {
            layout: ColumnLayout::single(),
            assignments: rows.iter().map(|_| Vec::new()).collect(),
            forced_merges: 0,
            gap_threshold: 0.0,
        };
    }

    xs.sort_by(f64::total_cmp);

    let heights: Vec<f64> = rows
        .iter()
        .flat_map(|row| row.fragments().iter().map(Fragment::height))
        .collect();
    let gap_threshold = gap_threshold(&xs, median(&heights), config);

    let mut clusters = split_at_gaps(&xs, gap_threshold);
    let detected = clusters.len();
    let forced_merges = enforce_column_cap(&mut clusters, config.max_columns);

    if forced_merges > 0 {
        tracing::warn!(
            "Detected {} columns, above max_columns={}; merged {} smallest clusters",
            detected,
            config.max_columns,
            forced_merges
        );
    }

    let layout = ColumnLayout::from_clusters(&clusters);

    tracing::debug!(
        "Resolved {} columns from {} x-positions (gap threshold {:.2}px)",
        layout.column_count(),
        xs.len(),
        gap_threshold
    );

    ColumnResolution {
        assignments: assign_slots(rows, &layout),
        layout,
        forced_merges,
        gap_threshold,
    }
}

/// Assign every fragment a column of a fixed layout, without clustering.
pub fn assign_columns(rows: &[RowGroup], layout: ColumnLayout) -> ColumnResolution {
    ColumnResolution {
        assignments: assign_slots(rows, &layout),
        layout,
        forced_merges: 0,
        gap_threshold: 0.0,
    }
}

fn assign_slots(rows: &[RowGroup], layout: &ColumnLayout) -> Vec<Vec<usize>> {
    rows.iter()
        .map(|row| {
            row.fragments()
                .iter()
                .map(|fragment| layout.slot_of(fragment.center_x()))
                .collect()
        })
        .collect()
}

/// Gap threshold: a multiple of the median gap between sorted x-positions,
/// kept within `[min_ratio, max_ratio] * median_height`.
///
/// Zero gaps count: fragments sharing an exact x-position are in-column
/// agreement, and dropping them leaves only column gaps in an aligned table.
/// Without the lower bound, sub-pixel jitter inside a column would split it.
/// Without the upper bound, a single-row table (every gap is a column gap)
/// would never split.
fn gap_threshold(sorted_xs: &[f64], median_height: f64, config: &TableConfig) -> f64 {
    let gaps: Vec<f64> = sorted_xs.windows(2).map(|pair| pair[1] - pair[0]).collect();

    let lower = config.min_column_gap_ratio * median_height;
    let upper = config.max_column_gap_ratio * median_height;

    (config.column_gap_factor * median(&gaps)).clamp(lower, upper)
}

fn split_at_gaps(sorted_xs: &[f64], gap_threshold: f64) -> Vec<XCluster> {
    let mut clusters: Vec<XCluster> = Vec::new();

    for &x in sorted_xs {
        match clusters.last_mut() {
            Some(cluster) if x - cluster.max <= gap_threshold => {
                cluster.max = x;
                cluster.count += 1;
            }
            _ => clusters.push(XCluster::start(x)),
        }
    }

    clusters
}

/// Merge clusters until at most `max_columns` remain.
///
/// The cluster with the fewest members (leftmost on ties) is folded into its
/// nearer neighbour (left on ties). Returns the number of merges.
fn enforce_column_cap(clusters: &mut Vec<XCluster>, max_columns: usize) -> usize {
    let mut merges = 0;

    while clusters.len() > max_columns.max(1) {
        let Some(smallest) = clusters
            .iter()
            .enumerate()
            .min_by_key(|(_, cluster)| cluster.count)
            .map(|(index, _)| index)
        else {
            break;
        };

        let left_gap = smallest
            .checked_sub(1)
            .map(|left| clusters[smallest].min - clusters[left].max);
        let right_gap = clusters
            .get(smallest + 1)
            .map(|right| right.min - clusters[smallest].max);

        let neighbour = match (left_gap, right_gap) {
            (Some(left), Some(right)) if left <= right => smallest - 1,
            (Some(_), Some(_)) => smallest + 1,
            (Some(_), None) => smallest - 1,
            (None, Some(_)) => smallest + 1,
            (None, None) => break,
        };

        let keep = smallest.min(neighbour);
        let removed = clusters.remove(smallest.max(neighbour));
        clusters[keep].absorb(&removed);
        merges += 1;
    }

    merges
}
