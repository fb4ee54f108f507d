//! Caller-supplied table grids.
//!
//! When the ruling lines of a table are known, because a user marked them on
//! the image or the host has a template for the form, the layout does not need
//! to be inferred. [`GridLayout`] carries those lines, and
//! [`TableParser::parse_with_grid`](crate::TableParser::parse_with_grid) drops
//! every fragment into the cell that holds its center.

use crate::{Result, TafelError};
use serde::{Deserialize, Serialize};

/// Interior ruling lines of a table, in image pixel coordinates.
///
/// The image edges are implicit: `n` column lines cut `n + 1` columns, and
/// `m` row lines cut `m + 1` rows. No lines at all is a single cell.
///
/// ```rust
/// use tafel::GridLayout;
///
/// # fn main() -> tafel::Result<()> {
/// let grid = GridLayout::from_json(r#"{"column_lines": [220, 120], "row_lines": [40]}"#)?;
/// assert_eq!(grid.column_lines, vec![120.0, 220.0]);
/// assert_eq!((grid.row_count(), grid.column_count()), (2, 3));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// x-positions of the vertical lines between columns
    #[serde(default)]
    pub column_lines: Vec<f64>,

    /// y-positions of the horizontal lines between rows
    #[serde(default)]
    pub row_lines: Vec<f64>,
}

impl GridLayout {
    /// Build a grid from line positions given in any order.
    ///
    /// # Errors
    ///
    /// Returns `TafelError::Validation` for a non-finite or repeated line.
    pub fn new(mut column_lines: Vec<f64>, mut row_lines: Vec<f64>) -> Result<Self> {
        column_lines.sort_by(f64::total_cmp);
        row_lines.sort_by(f64::total_cmp);

        let grid = Self {
            column_lines,
            row_lines,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Parse `{"column_lines": [...], "row_lines": [...]}`, sorting the lines.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Self = serde_json::from_str(json)?;
        Self::new(raw.column_lines, raw.row_lines)
    }

    /// Lines must be finite and strictly increasing.
    pub fn validate(&self) -> Result<()> {
        check_lines("column_lines", &self.column_lines)?;
        check_lines("row_lines", &self.row_lines)
    }

    pub fn column_count(&self) -> usize {
        self.column_lines.len() + 1
    }

    pub fn row_count(&self) -> usize {
        self.row_lines.len() + 1
    }
}

fn check_lines(name: &str, lines: &[f64]) -> Result<()> {
    if let Some(line) = lines.iter().find(|line| !line.is_finite()) {
        return Err(TafelError::validation(format!(
            "{} must hold finite positions, got {}",
            name, line
        )));
    }

    if let Some(pair) = lines.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(TafelError::validation(format!(
            "{} must be strictly increasing, got {} then {}",
            name, pair[0], pair[1]
        )));
    }

    Ok(())
}
