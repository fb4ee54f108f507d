//! Row clustering: group fragments into horizontal bands.
//!
//! Fragments are scanned top-to-bottom by `center_y`. A fragment joins the
//! current band while its center stays within `row_tolerance * median_height`
//! of the band's center, so the tolerance scales with the page's text size
//! rather than a fixed pixel count. A second pass reassigns fragments whose
//! boxes straddle two bands to the band whose center is closest. A band made
//! only of such fragments (a tall cell between two rows) is dissolved into its
//! neighbours instead of becoming a row of its own.

use super::fragment::{Fragment, median};
use serde::{Deserialize, Serialize};

/// Fragments assigned to one table row, ordered left-to-right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGroup {
    fragments: Vec<Fragment>,
    y_top: f64,
    y_bottom: f64,
}

impl RowGroup {
    fn new(mut fragments: Vec<Fragment>) -> Self {
        fragments.sort_by(Fragment::horizontal_order);
        let (y_top, y_bottom) = vertical_extent(&fragments);

        Self {
            fragments,
            y_top,
            y_bottom,
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    /// Topmost box edge of the row.
    pub fn y_top(&self) -> f64 {
        self.y_top
    }

    /// Bottom-most box edge of the row.
    pub fn y_bottom(&self) -> f64 {
        self.y_bottom
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn center_start(&self) -> f64 {
        self.fragments
            .iter()
            .map(Fragment::center_y)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Center and box extent of a band as produced by the first scan.
#[derive(Debug, Clone, Copy)]
struct BandExtent {
    center: f64,
    top: f64,
    bottom: f64,
    /// Every member spans the centers of both neighbouring bands
    bridge: bool,
}

impl BandExtent {
    fn of(band: &[Fragment]) -> Self {
        let (min_center, max_center) = band.iter().map(Fragment::center_y).fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), y| (lo.min(y), hi.max(y)),
        );
        let (top, bottom) = vertical_extent(band);

        Self {
            center: (min_center + max_center) / 2.0,
            top,
            bottom,
            bridge: false,
        }
    }
}

/// Box extent of a set of fragments; `(0.0, 0.0)` when there are none.
fn vertical_extent(fragments: &[Fragment]) -> (f64, f64) {
    if fragments.is_empty() {
        return (0.0, 0.0);
    }

    fragments.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(top, bottom), f| {
        (top.min(f.bbox.top), bottom.max(f.bbox.bottom))
    })
}

/// Cluster fragments into rows ordered top-to-bottom.
///
/// # Arguments
///
/// * `fragments` - Non-degenerate fragments of one page, in any order
/// * `row_tolerance` - Band half-width as a multiple of the median fragment height
///
/// An empty input yields an empty result.
pub fn cluster_rows(fragments: Vec<Fragment>, row_tolerance: f64) -> Vec<RowGroup> {
    if fragments.is_empty() {
        return Vec::new();
    }

    let heights: Vec<f64> = fragments.iter().map(Fragment::height).collect();
    let band_tolerance = row_tolerance * median(&heights);

    let bands = scan_bands(fragments, band_tolerance);
    let bands = resolve_straddlers(bands);

    let mut rows: Vec<RowGroup> = bands
        .into_iter()
        .filter(|band| !band.is_empty())
        .map(RowGroup::new)
        .collect();
    rows.sort_by(|a, b| {
        a.center_start()
            .total_cmp(&b.center_start())
            .then_with(|| a.y_top.total_cmp(&b.y_top))
    });

    tracing::debug!(
        "Clustered rows: {} rows, band tolerance {:.2}px",
        rows.len(),
        band_tolerance
    );

    rows
}

/// Group fragments into the fixed bands cut by horizontal `lines`.
///
/// `lines` must be strictly increasing. A fragment belongs to the band holding
/// its `center_y`; a center exactly on a line goes to the band below it. Every
/// band yields a row, so the result always has `lines.len() + 1` rows.
pub fn rows_between(fragments: Vec<Fragment>, lines: &[f64]) -> Vec<RowGroup> {
    let mut bands: Vec<Vec<Fragment>> = vec![Vec::new(); lines.len() + 1];

    for fragment in fragments {
        let band = lines.partition_point(|line| *line <= fragment.center_y());
        bands[band].push(fragment);
    }

    bands.into_iter().map(RowGroup::new).collect()
}

fn scan_bands(mut fragments: Vec<Fragment>, band_tolerance: f64) -> Vec<Vec<Fragment>> {
    fragments.sort_by(Fragment::vertical_order);

    let mut bands: Vec<Vec<Fragment>> = Vec::new();
    let mut band_min = 0.0;
    let mut band_max = 0.0;

    for fragment in fragments {
        let center_y = fragment.center_y();

        match bands.last_mut() {
            Some(band) if (center_y - (band_min + band_max) / 2.0).abs() <= band_tolerance => {
                band_min = f64::min(band_min, center_y);
                band_max = f64::max(band_max, center_y);
                band.push(fragment);
            }
            _ => {
                band_min = center_y;
                band_max = center_y;
                bands.push(vec![fragment]);
            }
        }
    }

    bands
}

fn resolve_straddlers(bands: Vec<Vec<Fragment>>) -> Vec<Vec<Fragment>> {
    let mut extents: Vec<BandExtent> = bands.iter().map(|band| BandExtent::of(band)).collect();
    mark_bridges(&bands, &mut extents);
    let mut resolved: Vec<Vec<Fragment>> = vec![Vec::new(); bands.len()];

    for (index, band) in bands.into_iter().enumerate() {
        for fragment in band {
            let target = if extents[index].bridge {
                bridge_target(&fragment, index, &extents)
            } else {
                closest_band(&fragment, index, &extents)
            };
            if target != index {
                tracing::debug!(
                    "Straddling fragment '{}' moved from row band {} to {}",
                    fragment.text,
                    index,
                    target
                );
            }
            resolved[target].push(fragment);
        }
    }

    resolved
}

/// Flag bands lying between two neighbours whose every member's box reaches
/// both neighbour centers. Two bridges are never adjacent; the upper one wins.
fn mark_bridges(bands: &[Vec<Fragment>], extents: &mut [BandExtent]) {
    for index in 1..extents.len().saturating_sub(1) {
        if extents[index - 1].bridge {
            continue;
        }

        let above = extents[index - 1].center;
        let below = extents[index + 1].center;
        extents[index].bridge = bands[index]
            .iter()
            .all(|fragment| fragment.bbox.top <= above && below <= fragment.bbox.bottom);
    }
}

/// Neighbour of a bridge band whose center is closer; ties go to the upper band.
fn bridge_target(fragment: &Fragment, own: usize, extents: &[BandExtent]) -> usize {
    let center_y = fragment.center_y();
    let above = (center_y - extents[own - 1].center).abs();
    let below = (center_y - extents[own + 1].center).abs();

    if above <= below { own - 1 } else { own + 1 }
}

/// Pick the band for a fragment among its own band and any adjacent band its
/// box overlaps. Ties go to the upper band.
fn closest_band(fragment: &Fragment, own: usize, extents: &[BandExtent]) -> usize {
    let center_y = fragment.center_y();
    let mut best = own;
    let mut best_distance = (center_y - extents[own].center).abs();

    let above = own.checked_sub(1);
    let below = Some(own + 1).filter(|&i| i < extents.len());

    for candidate in [above, below].into_iter().flatten() {
        let extent = extents[candidate];
        if extent.bridge || !fragment.bbox.overlaps_vertically(extent.top, extent.bottom) {
            continue;
        }

        let distance = (center_y - extent.center).abs();
        if distance < best_distance || (distance == best_distance && candidate < best) {
            best = candidate;
            best_distance = distance;
        }
    }

    best
}
