//! Error codes following a structured numbering system
//!
//! Error code ranges:
//! - OSM0001-OSM0099: Structural errors (violated compile-time invariants)
//! - OSM0100-OSM0149: Model errors (invalid construction input)
//! - OSM0150-OSM0199: Validation warnings (degenerate but compilable)
//! - OSM0200-OSM0299: Naming errors (set-name registry)
//! - OSM0300-OSM0399: Persistence errors (serialization, I/O)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a structural error (0001-0099)
    pub const fn is_structural_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a model error (0100-0149)
    pub const fn is_model_error(&self) -> bool {
        self.0 >= 100 && self.0 < 150
    }

    /// Check if this is a validation warning (0150-0199)
    pub const fn is_validation_warning(&self) -> bool {
        self.0 >= 150 && self.0 < 200
    }

    /// Check if this is a naming error (0200-0299)
    pub const fn is_naming_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a persistence error (0300-0399)
    pub const fn is_persistence_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OSM{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Static error info storage
static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

use std::collections::HashMap;
use std::sync::LazyLock;

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Structural errors (0001-0099)
    map.insert(
        1,
        ErrorInfo::new("Empty request")
            .with_help("A request needs at least one filter, polygon point, id or area reference"),
    );
    map.insert(2, ErrorInfo::new("Query without requests"));
    map.insert(3, ErrorInfo::new("Union without sets"));
    map.insert(4, ErrorInfo::new("Intersection without sets"));
    map.insert(
        5,
        ErrorInfo::new("Difference without excluded sets nor included set"),
    );

    // Model errors (0100-0149)
    map.insert(
        100,
        ErrorInfo::new("No element type selected")
            .with_help("Select at least one of node, way or relation, or use area"),
    );
    map.insert(101, ErrorInfo::new("Empty filter key"));
    map.insert(102, ErrorInfo::new("Empty filter value"));
    map.insert(103, ErrorInfo::new("Unknown set name"));
    map.insert(104, ErrorInfo::new("Invalid around radius"));

    // Validation warnings (0150-0199)
    map.insert(150, ErrorInfo::new("Union with a single input set"));
    map.insert(151, ErrorInfo::new("Intersection with a single input set"));
    map.insert(
        152,
        ErrorInfo::new("Numeric comparison as the only filter of a request").with_help(
            "The Overpass API rejects a request whose only filter is an (if: ...) clause; \
             add a plain tag filter alongside it",
        ),
    );

    // Naming errors (0200-0299)
    map.insert(200, ErrorInfo::new("Set name already in use"));

    // Persistence errors (0300-0399)
    map.insert(300, ErrorInfo::new("Malformed query document"));
    map.insert(301, ErrorInfo::new("I/O error"));

    map
});

/// Empty request
pub const OSM0001: ErrorCode = ErrorCode::new(1);
/// Query without requests
pub const OSM0002: ErrorCode = ErrorCode::new(2);
/// Union without sets
pub const OSM0003: ErrorCode = ErrorCode::new(3);
/// Intersection without sets
pub const OSM0004: ErrorCode = ErrorCode::new(4);
/// Difference without excluded sets nor included set
pub const OSM0005: ErrorCode = ErrorCode::new(5);
/// No element type selected
pub const OSM0100: ErrorCode = ErrorCode::new(100);
/// Empty filter key
pub const OSM0101: ErrorCode = ErrorCode::new(101);
/// Empty filter value
pub const OSM0102: ErrorCode = ErrorCode::new(102);
/// Unknown set name
pub const OSM0103: ErrorCode = ErrorCode::new(103);
/// Invalid around radius
pub const OSM0104: ErrorCode = ErrorCode::new(104);
/// Union with a single input set
pub const OSM0150: ErrorCode = ErrorCode::new(150);
/// Intersection with a single input set
pub const OSM0151: ErrorCode = ErrorCode::new(151);
/// Numeric comparison as the only filter of a request
pub const OSM0152: ErrorCode = ErrorCode::new(152);
/// Set name already in use
pub const OSM0200: ErrorCode = ErrorCode::new(200);
/// Malformed query document
pub const OSM0300: ErrorCode = ErrorCode::new(300);
/// I/O error
pub const OSM0301: ErrorCode = ErrorCode::new(301);
