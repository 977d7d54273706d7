//! Error types and handling for style-conformance operations
//!
//! Style violations are never errors: they are returned as
//! [`Finding`](crate::diagnostics::Finding) values. The types here cover the
//! engine's failure modes.

use thiserror::Error;

use crate::diagnostics::Location;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum SharpstyleError {
    /// A rule check or fix failed unexpectedly; aborts the current file only
    #[error("Engine fault in rule '{rule_id}' at {location}: {message}")]
    EngineFault {
        rule_id: String,
        location: Box<Location>,
        message: String,
    },

    /// Two fixes of one batch target overlapping text
    #[error("Fix conflict between '{rule_id}' and '{other_rule_id}' at {location}")]
    FixConflict {
        rule_id: String,
        other_rule_id: String,
        location: Box<Location>,
    },

    /// A fix left a violation of its own rule at the fixed location
    #[error("Fix for '{rule_id}' is not idempotent at {location}")]
    FixNonIdempotent {
        rule_id: String,
        location: Box<Location>,
    },

    /// Rewritten text differs from the original outside the applied edits,
    /// or no longer parses to the same shape
    #[error("Rewrite check failed: {message}")]
    RewriteMismatch { message: String },

    /// Host-supplied parse hook failed
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The host requested cancellation
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EngineFault,
    FixConflict,
    FixNonIdempotent,
    Rewrite,
    Parse,
    Config,
    Cancelled,
    Internal,
}

impl SharpstyleError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharpstyleError::EngineFault { .. } => ErrorKind::EngineFault,
            SharpstyleError::FixConflict { .. } => ErrorKind::FixConflict,
            SharpstyleError::FixNonIdempotent { .. } => ErrorKind::FixNonIdempotent,
            SharpstyleError::RewriteMismatch { .. } => ErrorKind::Rewrite,
            SharpstyleError::ParseError { .. } => ErrorKind::Parse,
            SharpstyleError::ConfigError { .. } => ErrorKind::Config,
            SharpstyleError::Cancelled => ErrorKind::Cancelled,
            SharpstyleError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EngineFault
                | ErrorKind::FixConflict
                | ErrorKind::FixNonIdempotent
                | ErrorKind::Rewrite
                | ErrorKind::Parse
        )
    }

    /// Create an engine fault
    pub fn engine_fault(
        rule_id: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self::EngineFault {
            rule_id: rule_id.into(),
            location: Box::new(location),
            message: message.into(),
        }
    }

    /// Create a fix conflict error
    pub fn fix_conflict(
        rule_id: impl Into<String>,
        other_rule_id: impl Into<String>,
        location: Location,
    ) -> Self {
        Self::FixConflict {
            rule_id: rule_id.into(),
            other_rule_id: other_rule_id.into(),
            location: Box::new(location),
        }
    }

    /// Create a non-idempotent fix error
    pub fn fix_non_idempotent(rule_id: impl Into<String>, location: Location) -> Self {
        Self::FixNonIdempotent {
            rule_id: rule_id.into(),
            location: Box::new(location),
        }
    }

    /// Create a rewrite mismatch error
    pub fn rewrite_mismatch(message: impl Into<String>) -> Self {
        Self::RewriteMismatch {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Rule id carried by rule-scoped errors
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            SharpstyleError::EngineFault { rule_id, .. }
            | SharpstyleError::FixConflict { rule_id, .. }
            | SharpstyleError::FixNonIdempotent { rule_id, .. } => Some(rule_id),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SharpstyleError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_error(format!("TOML parsing error: {err}"))
    }
}

impl From<serde_json::Error> for SharpstyleError {
    fn from(err: serde_json::Error) -> Self {
        Self::config_error(format!("JSON parsing error: {err}"))
    }
}

impl From<regex::Error> for SharpstyleError {
    fn from(err: regex::Error) -> Self {
        Self::config_error(format!("Invalid pattern: {err}"))
    }
}

/// Failure of a single fix
#[derive(Debug, Error)]
pub enum FixError {
    /// The finding cannot be fixed in the current tree; not a defect
    #[error("Fix for '{rule_id}' not applicable: {reason}")]
    NotApplicable { rule_id: String, reason: String },

    /// The fix itself failed
    #[error(transparent)]
    Fault(#[from] SharpstyleError),
}

impl FixError {
    pub fn not_applicable(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotApplicable {
            rule_id: rule_id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_and_recovery() {
        let fault = SharpstyleError::engine_fault("SA1119", Location::default(), "boom");
        assert_eq!(fault.kind(), ErrorKind::EngineFault);
        assert!(fault.is_recoverable());
        assert_eq!(fault.rule_id(), Some("SA1119"));

        assert!(!SharpstyleError::Cancelled.is_recoverable());
        assert!(!SharpstyleError::config_error("bad").is_recoverable());
        assert_eq!(SharpstyleError::Cancelled.rule_id(), None);
    }

    #[test]
    fn test_error_display() {
        let location = Location {
            line: 3,
            column: 7,
            ..Location::default()
        };
        let err = SharpstyleError::fix_non_idempotent("SA1000", location);
        assert_eq!(err.to_string(), "Fix for 'SA1000' is not idempotent at 3:7");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SharpstyleError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
