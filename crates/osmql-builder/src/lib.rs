//! Overpass QL query model and compiler
//!
//! This crate provides a programmatic builder for Overpass QL queries:
//! - Tag filters with the full comparison-kind palette
//! - Requests selecting nodes/ways/relations/areas with spatial constraints
//! - Set algebra (union, intersection, difference) over named result sets
//! - Deterministic compilation to query text
//! - JSON persistence that round-trips the whole document
//!
//! # Example
//!
//! ```
//! use osmql_builder::{ElementType, Filter, Query, Request, Surround};
//!
//! let mut query = Query::new();
//! let mut request = Request::new(ElementType::Ways, Surround::None);
//! request.add_filter(Filter::equal("highway", "residential", false, true)?);
//! query.add_request(request);
//!
//! let ql = query.compile()?;
//! assert!(ql.starts_with("way[\"highway\"=\"residential\"]->.a;\n"));
//! # Ok::<(), osmql_diagnostics::QlError>(())
//! ```

mod filter;
mod names;
mod query;
mod request;
mod serialize;
mod setop;

pub use filter::*;
pub use names::*;
pub use query::*;
pub use request::*;
pub use serialize::*;
pub use setop::*;
