#![forbid(unsafe_code)]

//! Fatal binder errors.
//!
//! Structural misconfiguration surfaces here. Cosmetic conditions (no
//! matching element, unbinding something that is not bound, a trigger
//! field the record lacks) are logged with `tracing::warn!` instead.

use crate::expression::ExpressionError;
use crate::record::RecordId;

/// Errors from bind and attach operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The binding target is not a live observable record.
    InvalidRecord { record: RecordId },
    /// The property spec does not resolve to a field or a function.
    InvalidPropertySpec { reason: String },
    /// A computed accessor was bound bidirectionally.
    InvalidBindingCombination { selector: String, attribute: String },
    /// An expression string failed to compile.
    ExpressionCompile(ExpressionError),
    /// No collection member matches an index marker.
    NoSuchMember { key: String },
    /// A declarative key opens `[` without closing it.
    InvalidDescriptor { descriptor: String },
    /// A declarative value cannot be bound where it appears.
    InvalidMapValue { descriptor: String, reason: String },
    /// A binding map or config could not be decoded.
    Config(String),
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRecord { record } => {
                write!(f, "record {record} is not a live observable record")
            }
            Self::InvalidPropertySpec { reason } => write!(f, "invalid property spec: {reason}"),
            Self::InvalidBindingCombination {
                selector,
                attribute,
            } => write!(
                f,
                "computed property cannot be bound bidirectionally ('[{attribute}]{selector}')"
            ),
            Self::ExpressionCompile(err) => write!(f, "{err}"),
            Self::NoSuchMember { key } => write!(f, "no collection member matches '{key}'"),
            Self::InvalidDescriptor { descriptor } => {
                write!(f, "invalid binding descriptor '{descriptor}'")
            }
            Self::InvalidMapValue { descriptor, reason } => {
                write!(f, "invalid value for '{descriptor}': {reason}")
            }
            Self::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ExpressionCompile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExpressionError> for BindError {
    fn from(err: ExpressionError) -> Self {
        Self::ExpressionCompile(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse;
    use std::error::Error;

    #[test]
    fn expression_error_is_source() {
        let Err(err) = parse("{a") else {
            panic!("expected failure");
        };
        let bind: BindError = err.into();
        assert!(bind.to_string().contains("{a"));
        assert!(bind.source().is_some());
    }

    #[test]
    fn display_names_context() {
        let err = BindError::InvalidRecord {
            record: RecordId(7),
        };
        assert_eq!(err.to_string(), "record c7 is not a live observable record");
        let err = BindError::NoSuchMember {
            key: "aristobot".into(),
        };
        assert!(err.to_string().contains("aristobot"));
    }
}
