//! Crate-wide error taxonomy.
//!
//! Every public operation fails with one of the [`Error`] variants below.
//! [`ErrorKind`] is the stable, data-free tag used by the REST layer to pick
//! a status code.

use serde::Serialize;

use crate::store::PersistenceError;

/// One failed field check. A validation error carries every violation found,
/// not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("{0}")]
    NotFound(String),

    #[error("Location with id '{0}' already exists")]
    DuplicateId(String),

    #[error("{0}")]
    Capacity(String),

    #[error("Cannot delete home location '{0}'")]
    HomeLocationProtected(String),

    #[error("Failed to fetch MSLP data for {location}: {status}")]
    UpstreamFetch { location: String, status: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Data-free tag for [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "DuplicateIdError")]
    DuplicateId,
    #[serde(rename = "CapacityError")]
    Capacity,
    #[serde(rename = "HomeLocationProtectedError")]
    HomeLocationProtected,
    #[serde(rename = "UpstreamFetchError")]
    UpstreamFetch,
    #[serde(rename = "PersistenceError")]
    Persistence,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::DuplicateId => "DuplicateIdError",
            ErrorKind::Capacity => "CapacityError",
            ErrorKind::HomeLocationProtected => "HomeLocationProtectedError",
            ErrorKind::UpstreamFetch => "UpstreamFetchError",
            ErrorKind::Persistence => "PersistenceError",
        }
    }
}

impl Error {
    /// Shorthand for a validation error with a single violation.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(vec![FieldViolation::new(field, message)])
    }

    pub fn upstream(location: impl Into<String>, status: impl Into<String>) -> Self {
        Error::UpstreamFetch {
            location: location.into(),
            status: status.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::DuplicateId(_) => ErrorKind::DuplicateId,
            Error::Capacity(_) => ErrorKind::Capacity,
            Error::HomeLocationProtected(_) => ErrorKind::HomeLocationProtected,
            Error::UpstreamFetch { .. } => ErrorKind::UpstreamFetch,
            Error::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Field violations, empty for every kind except validation.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Error::Validation(v) => v,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
