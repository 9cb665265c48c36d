//! Overpass QL query builder
//!
//! This crate assembles Overpass QL queries programmatically: tag filters,
//! spatial constraints (polygon, named area, around/adjacent), set algebra
//! over named result sets, deterministic compilation to query text, and
//! JSON persistence of the whole document.
//!
//! # Example
//!
//! ```
//! use osmql::{ElementType, Filter, Query, Request, SetOp, Surround};
//!
//! let mut query = Query::new();
//!
//! let mut roads = Request::new(ElementType::Ways, Surround::None);
//! roads.add_filter(Filter::equal("highway", "primary", false, true)?);
//! let roads = query.add_request(roads);
//!
//! let mut paths = Request::new(ElementType::Ways, Surround::None);
//! paths.add_filter(Filter::equal("highway", "footway", false, true)?);
//! let paths = query.add_request(paths);
//!
//! let both = query.add_operation(SetOp::union([roads, paths]));
//! query.set_output_set(both)?;
//!
//! let ql = query.compile()?;
//! assert!(ql.ends_with("out meta;"));
//! # Ok::<(), osmql::QlError>(())
//! ```

// Re-export all public APIs from internal crates
pub use osmql_builder as builder;
pub use osmql_diagnostics as diagnostics;

// Convenience re-exports
pub use osmql_builder::{
    Comparison, ElementType, Filter, JsonSerializer, NameAllocator, PersistError, Query, Request,
    SetOp, Surround, load_query, save_query,
};
pub use osmql_diagnostics::{Diagnostic, ErrorCode, QlError, Result, Severity};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
