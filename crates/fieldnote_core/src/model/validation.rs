//! Entity validation errors.
//!
//! A failed save reports every violated rule at once so callers can show all
//! reasons to the user.

use crate::fields::FieldError;
use crate::model::category::CategoryId;
use crate::model::node::NodeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text exceeds the maximum length.
    TextTooLong { length: usize, max: usize },
    /// Referenced node does not exist.
    UnknownNode(NodeId),
    /// Referenced category does not exist.
    UnknownCategory(CategoryId),
    /// Referenced issue does not exist.
    UnknownIssue(uuid::Uuid),
    /// Field name cannot be written as a marker.
    InvalidFieldName(String),
    /// Field value contains a marker line.
    MarkerInFieldValue(String),
    /// Node label is blank after trim.
    BlankLabel,
    /// Node kind can only be created by the system.
    ReservedNodeKind,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextTooLong { length, max } => write!(
                f,
                "text is too long ({length} characters, maximum is {max})"
            ),
            Self::UnknownNode(id) => write!(f, "node must exist: {id}"),
            Self::UnknownCategory(id) => write!(f, "category must exist: {id}"),
            Self::UnknownIssue(id) => write!(f, "issue must exist: {id}"),
            Self::InvalidFieldName(name) => write!(f, "invalid field name `{name}`"),
            Self::MarkerInFieldValue(name) => {
                write!(f, "value of field `{name}` must not contain a marker line")
            }
            Self::BlankLabel => write!(f, "label must not be blank"),
            Self::ReservedNodeKind => write!(f, "node kind is reserved"),
        }
    }
}

impl Error for ValidationError {}

impl From<FieldError> for ValidationError {
    fn from(value: FieldError) -> Self {
        match value {
            FieldError::InvalidName(name) => Self::InvalidFieldName(name),
            FieldError::TooLong { length, max } => Self::TextTooLong { length, max },
            FieldError::MarkerInValue(name) => Self::MarkerInFieldValue(name),
        }
    }
}

/// Non-empty collection of validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Returns `Ok(())` when `errors` is empty.
    pub fn check(errors: Vec<ValidationError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    pub fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Human-readable reasons in rule order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.messages().join("; "))
    }
}

impl Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(value: ValidationError) -> Self {
        Self::single(value)
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(value: FieldError) -> Self {
        Self::single(value.into())
    }
}
