//! Error handling for the public command interface.
//!
//! Internally the crate works with `anyhow` (`Res<T>`) so that every I/O step can add context.
//! Command functions convert those errors into `Error`, which also records the broad category of
//! the failure so that callers can react to it without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The result type returned by public command functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The data directory or `config.json` is missing or invalid.
    Config,
    /// Reading or writing the local document failed.
    Storage,
    /// An import file could not be used.
    Import,
    /// The requested record does not exist.
    NotFound,
    /// The user supplied data that does not describe a valid record.
    Invalid,
    /// OAuth credentials or tokens are missing or unusable.
    Auth,
    /// The cloud storage provider returned an error.
    Cloud,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error with an `ErrorType` attached to it.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, value)
    }
}

/// Converts an internal `Res<T>` into a public `Result<T>` with the given `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[test]
fn test_pub_result_keeps_context() {
    use anyhow::Context;
    let res: Res<()> = Err(anyhow::anyhow!("disk full")).context("Unable to save the document");
    let err = res.pub_result(ErrorType::Storage).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Storage);
    let message = err.to_string();
    assert!(message.contains("Unable to save the document"));
    assert!(message.contains("disk full"));
}

#[test]
fn test_error_type_display() {
    assert_eq!(ErrorType::NotFound.to_string(), "not_found");
}
