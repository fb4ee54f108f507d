//! Tafel - Table Reconstruction from OCR Fragments
//!
//! Tafel turns the loose text fragments an OCR engine reports for a table image
//! into a rectangular grid of cells, and grades how far the result can be trusted.
//!
//! # Quick Start
//!
//! ```rust
//! use tafel::{BoundingBox, Fragment, TableConfig, parse_fragments, table_to_markdown};
//!
//! # fn main() -> tafel::Result<()> {
//! let fragments = vec![
//!     Fragment::new("City", 0.99, BoundingBox::new(10.0, 10.0, 50.0, 30.0)),
//!     Fragment::new("Population", 0.98, BoundingBox::new(200.0, 10.0, 300.0, 30.0)),
//!     Fragment::new("Lima", 0.95, BoundingBox::new(10.0, 40.0, 48.0, 60.0)),
//!     Fragment::new("10.7M", 0.94, BoundingBox::new(220.0, 40.0, 280.0, 60.0)),
//! ];
//!
//! let parsed = parse_fragments(fragments, &TableConfig::default())?;
//! println!("{}", table_to_markdown(&parsed.table));
//! assert!(!parsed.quality.needs_review);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): Pipeline orchestration and configuration loading
//! - **Table Module** (`table`): Row clustering, column resolution, cell assembly,
//!   quality scoring, input adapters and markdown rendering
//!
//! Line-level engine output can be cut at column separators first
//! (`split_on_separators`), and a host that already knows the ruling lines can
//! skip layout inference with [`TableParser::parse_with_grid`].
//!
//! The pipeline is synchronous and holds no shared state. Fragments may arrive
//! in any order; the same input always yields the same table.

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod table;

pub use error::{Result, TafelError};

pub use core::config::TableConfig;
pub use core::pipeline::{TableParser, parse_fragments};

pub use table::input::{fragments_from_json, fragments_from_paddle_json, fragments_from_tsv};
pub use table::markdown::table_to_markdown;
pub use table::{BoundingBox, Cell, Fragment, GridLayout, ParsedTable, QualityMetrics, Table};
