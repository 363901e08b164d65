//! Error types for the observing block model.
//!
//! Validation is local and fail-fast: every constructor and decoder returns
//! the first violation it finds and never yields a partially valid value.

use crate::models::{Bound, ConstraintKind};

/// Result type for observing model operations
pub type Result<T> = std::result::Result<T, ObservingError>;

/// A field value that violates its declared domain, or a constraint
/// document that cannot be mapped onto one of the known variants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Numeric field outside its allowed range.
    #[error("{kind}.{field} must be {bound}, not {value}")]
    OutOfRange {
        kind: ConstraintKind,
        field: &'static str,
        bound: Bound,
        value: f64,
    },

    /// String field not in its allowed set.
    #[error("{kind}.{field} must be one of {allowed}, not {value:?}")]
    NotInSet {
        kind: ConstraintKind,
        field: &'static str,
        allowed: &'static str,
        value: String,
    },

    /// Discriminator names no known constraint variant.
    #[error("unknown constraint kind {kind:?}")]
    UnknownKind { kind: String },

    /// Constraint document without a string `kind` tag.
    #[error("constraint is missing a string \"kind\" tag")]
    MissingKind,

    /// Extra field that would shadow the tag or a typed field.
    #[error("{kind} cannot carry an extra field named {field:?}")]
    ReservedField { kind: ConstraintKind, field: String },

    /// Extra fields refused by a strict extra-field policy.
    #[error("{kind} has unrecognized fields {fields:?}")]
    DisallowedExtraFields {
        kind: ConstraintKind,
        fields: Vec<String>,
    },

    /// Missing required field or wrong value type.
    #[error("{context}: {message}")]
    Malformed { context: String, message: String },

    /// An error inside a block, tagged with where it was found.
    #[error("{location}: {source}")]
    At {
        location: String,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    pub(crate) fn malformed(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Attach the location (e.g. `constraints[2]`) where this error occurred.
    pub(crate) fn at(self, location: impl Into<String>) -> Self {
        Self::At {
            location: location.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all location wrappers removed.
    pub fn root(&self) -> &ValidationError {
        match self {
            Self::At { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Top-level error type for the crate
#[derive(Debug, thiserror::Error)]
pub enum ObservingError {
    /// Field-level validation failure
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A value that is not a scheduling constraint was offered as one
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Input that is not well-formed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Script configuration rendering failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration file or environment problem
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ObservingError {
    /// Returns the underlying validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}
