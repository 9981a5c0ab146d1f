//! Error types and diagnostics.
//!
//! Ingestion failures carry a [`SourceLocation`] (line, column, and byte
//! offset) so malformed input can be pinpointed. Every fallible entry point of
//! the crate returns the crate-wide [`Error`], which wraps the component
//! errors and adds the materialization failures.

use std::fmt;

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::filter::ExpressionError;

/// Source location within a markup document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error returned when markup input cannot be tokenized into a
/// well-formed sequence of start/characters/end events.
///
/// Ingestion never recovers partially: the first malformation aborts the
/// whole call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// Human-readable description of the malformation.
    pub message: String,
    /// Where in the source the error was detected.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates a parse error that has no meaningful source position, such as
    /// one raised by an unbalanced external event source.
    pub fn without_location(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::default(),
        }
    }
}

/// A boxed error produced by a materialization factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide error type.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// The ingestion source is not well-formed markup.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ParseError),

    /// Byte input could not be decoded to UTF-8.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Filter expression text could not be parsed.
    #[error("invalid filter expression: {0}")]
    InvalidExpression(#[from] ExpressionError),

    /// No factory is registered for a tag (only under `ThrowOnError`).
    #[error("no factory registered for tag '{tag}'")]
    UnknownTag {
        /// The tag that had no mapping.
        tag: String,
    },

    /// A factory rejected its node (only under `ThrowOnError`).
    #[error("factory for tag '{tag}' failed: {source}")]
    Factory {
        /// The tag whose factory failed.
        tag: String,
        /// The factory's own error.
        #[source]
        source: BoxError,
    },

    /// Reading the source or writing the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error came from ingestion (malformed markup or
    /// undecodable bytes).
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::MalformedInput(_) | Error::Encoding(_))
    }

    /// Returns `true` if this error came from materialization.
    pub fn is_materialize_error(&self) -> bool {
        matches!(self, Error::UnknownTag { .. } | Error::Factory { .. })
    }

    /// The offending tag of a materialization error.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Error::UnknownTag { tag } | Error::Factory { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
