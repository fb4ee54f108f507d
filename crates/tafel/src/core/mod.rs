//! Pipeline orchestration and configuration.
//!
//! - **Configuration** ([`config`]): [`TableConfig`] loading, discovery and validation
//! - **Pipeline** ([`pipeline`]): [`TableParser`], which runs the table stages in order
//!
//! # Example
//!
//! ```rust,no_run
//! use tafel::core::config::TableConfig;
//! use tafel::core::pipeline::TableParser;
//!
//! # fn main() -> tafel::Result<()> {
//! let config = TableConfig::discover()?.unwrap_or_default();
//! let parser = TableParser::new(config)?;
//! let parsed = parser.parse(Vec::new())?;
//! assert!(parsed.table.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod pipeline;

pub use config::TableConfig;
pub use pipeline::{TableParser, parse_fragments};
