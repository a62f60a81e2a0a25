//! Error taxonomy for structure building and computation.
//!
//! - Structural errors are raised before any computation starts.
//! - Resource errors come from external files (range values, tabulated data).
//! - Uninitialized and constant-mutation errors guard variable parameter slots.
//!
//! Numerical edge cases are never errors: NaN and Inf propagate through the
//! dispersion formulas untouched.

use std::path::PathBuf;

use thiserror::Error;

/// Library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the library
#[derive(Debug, Error)]
pub enum Error {
    #[error("{header}: {detail}")]
    Structural { header: String, detail: String },

    #[error("cannot read {path:?}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed file {path:?}: {detail}")]
    ResourceFormat { path: PathBuf, detail: String },

    #[error("uninitialized value of variable parameter {parameter}")]
    Uninitialized { parameter: String },

    #[error("cannot variate constant parameter {parameter}")]
    ConstantMutation { parameter: String },

    #[error("computation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a structural validation error.
    pub fn structural(header: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Structural {
            header: header.into(),
            detail: detail.into(),
        }
    }

    /// Short title suitable for a dialog header or log prefix.
    pub fn header(&self) -> String {
        match self {
            Error::Structural { header, .. } => header.clone(),
            Error::Resource { .. } | Error::ResourceFormat { .. } => "Resource error".to_string(),
            Error::Uninitialized { .. } => "Uninitialized value".to_string(),
            Error::ConstantMutation { .. } => "Constant parameter".to_string(),
            Error::Cancelled => "Cancelled".to_string(),
            Error::Io(_) => "I/O error".to_string(),
        }
    }

    /// Longer explanation that goes with [`Error::header`].
    pub fn detail(&self) -> String {
        match self {
            Error::Structural { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
