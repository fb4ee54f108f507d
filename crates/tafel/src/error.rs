//! Error types for Tafel.
//!
//! Table reconstruction treats data irregularities (missing cells, low OCR
//! confidence, degenerate boxes) as data, never as errors. The variants here
//! cover the remaining hard failures:
//!
//! - `Io` - File system errors from config loading (always bubble up unchanged)
//! - `Validation` - Invalid configuration or a malformed fragment
//! - `Parsing` - Unreadable OCR engine output handed to an input adapter
//! - `Serialization` - JSON/TOML/YAML encoding and decoding failures
//!
//! # Example
//!
//! ```rust
//! use tafel::{TafelError, Result};
//!
//! fn check_tolerance(tolerance: f64) -> Result<f64> {
//!     if !tolerance.is_finite() || tolerance < 0.0 {
//!         return Err(TafelError::validation(format!(
//!             "row_tolerance must be a non-negative number, got {}",
//!             tolerance
//!         )));
//!     }
//!     Ok(tolerance)
//! }
//!
//! assert!(check_tolerance(0.5).is_ok());
//! assert!(check_tolerance(-1.0).is_err());
//! ```
use thiserror::Error;

/// Result type alias using `TafelError`.
pub type Result<T> = std::result::Result<T, TafelError>;

/// Main error type for all Tafel operations.
#[derive(Debug, Error)]
pub enum TafelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for TafelError {
    fn from(err: serde_json::Error) -> Self {
        TafelError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::ser::Error> for TafelError {
    fn from(err: toml::ser::Error) -> Self {
        TafelError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl TafelError {
    error_constructor!(validation, Validation);
    error_constructor!(parsing, Parsing);
    error_constructor!(serialization, Serialization);
}
