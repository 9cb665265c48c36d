//! osmql error types

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - compilation cannot proceed
    Error,
    /// Warning - potential issue but can continue
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with context
///
/// Diagnostics carry non-fatal findings: a query that compiles but is
/// semantically degenerate (e.g. a single-input union) reports itself here
/// rather than through [`QlError`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Name of the set the diagnostic refers to, if any
    pub set: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            set: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            set: None,
            help: None,
        }
    }

    /// Attach the set name the diagnostic refers to
    pub fn with_set(mut self, set: impl Into<String>) -> Self {
        self.set = Some(set.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(set) = &self.set {
            write!(f, " (set '{}')", set)?;
        }
        Ok(())
    }
}

/// Main error type for the query builder
#[derive(Debug, Clone, Error)]
pub enum QlError {
    /// Structural error: a compile-time invariant of the query model is
    /// violated (empty request, operation without inputs, ...)
    #[error("{code}: {message}")]
    Structural {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Model error: invalid input at construction time
    #[error("{code}: {message}")]
    Model {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Naming error: the set-name registry invariants were broken
    #[error("{code}: {message}")]
    Naming {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },
}

impl QlError {
    /// Create a structural error
    pub fn structural(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Structural {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a model error
    pub fn model(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Model {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a naming error
    pub fn naming(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Naming {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context information
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        match &mut self {
            Self::Structural { context, .. }
            | Self::Model { context, .. }
            | Self::Naming { context, .. } => *context = Some(ctx.into()),
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Structural { code, .. }
            | Self::Model { code, .. }
            | Self::Naming { code, .. } => *code,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, context) = match self {
            Self::Structural {
                message, context, ..
            }
            | Self::Model {
                message, context, ..
            }
            | Self::Naming {
                message, context, ..
            } => (message, context),
        };
        let mut diag = Diagnostic::error(self.code(), message.clone());
        if let Some(ctx) = context {
            diag = diag.with_help(ctx.clone());
        }
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OSM0001, OSM0150, OSM0200};

    #[test]
    fn test_error_constructors() {
        let err = QlError::structural(OSM0001, "Empty request").with_context("request 'a'");
        assert!(matches!(err, QlError::Structural { .. }));
        assert_eq!(err.code(), OSM0001);
        assert!(err.to_string().contains("OSM0001"));
    }

    #[test]
    fn test_naming_error() {
        let err = QlError::naming(OSM0200, "set name 'a' already in use");
        assert!(err.code().is_naming_error());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning(OSM0150, "union compiles with a single input")
            .with_set("c")
            .with_help("add a second input set");
        assert!(diag.to_string().contains("warning"));
        assert!(diag.to_string().contains("OSM0150"));
        assert!(diag.to_string().contains("'c'"));
    }

    #[test]
    fn test_error_to_diagnostic() {
        let diag = QlError::structural(OSM0001, "Empty request")
            .with_context("no filters")
            .to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.help.as_deref(), Some("no filters"));
    }
}
