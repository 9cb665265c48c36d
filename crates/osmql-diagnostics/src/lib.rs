//! osmql diagnostics and error handling
//!
//! This crate provides the error handling infrastructure for the Overpass QL
//! builder, including error codes, the core error type, and warning-level
//! diagnostics for degenerate-but-compilable query states.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for query-building operations
pub type Result<T> = std::result::Result<T, QlError>;
