//! Table reconstruction stages.
//!
//! Each stage consumes the previous stage's value and returns a new one:
//!
//! 1. [`rows::cluster_rows`] groups fragments into horizontal bands
//! 2. [`columns::resolve_columns`] derives one column layout for the whole table
//! 3. [`assemble::assemble_table`] places fragments into cells
//! 4. [`quality::score_table`] grades the result
//!
//! [`separators`] optionally splits line-level fragments before stage 1, and a
//! [`grid::GridLayout`] from the host replaces stages 1 and 2 with fixed lines.
//! [`input`] converts OCR engine output into [`Fragment`]s, and
//! [`markdown`] renders the finished [`Table`].

pub mod assemble;
pub mod columns;
pub mod fragment;
pub mod grid;
pub mod input;
pub mod markdown;
pub mod quality;
pub mod rows;
pub mod separators;
pub mod text;
pub mod types;

pub use assemble::assemble_table;
pub use columns::{ColumnLayout, ColumnResolution, assign_columns, resolve_columns};
pub use fragment::{BoundingBox, Fragment};
pub use grid::GridLayout;
pub use input::{fragments_from_json, fragments_from_paddle_json, fragments_from_tsv};
pub use markdown::table_to_markdown;
pub use quality::{ScoringInputs, score_table};
pub use rows::{RowGroup, cluster_rows, rows_between};
pub use separators::{separator_pattern, split_fragment};
pub use text::normalize_fragment_text;
pub use types::{Cell, ParsedTable, QualityMetrics, Table};
