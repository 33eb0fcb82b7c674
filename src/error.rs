//! Error types for BCD decoding operations.
//!
//! This module provides error handling for the whole decoding pipeline: the
//! hive oracle, the binary element parsers, and tree lookups.

use std::io;
use thiserror::Error;

/// Result type alias for BCD decoding operations.
pub type Result<T> = std::result::Result<T, BcdError>;

/// Errors that can occur while decoding a BCD hive.
#[derive(Error, Debug)]
pub enum BcdError {
    /// I/O error from the host environment.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error surfaced verbatim from the underlying hive reader.
    #[error("hive error: {0}")]
    Hive(String),

    /// A binary record violated a structural constraint: a reserved field
    /// was nonzero, a tag was outside its known set, or a framed offset
    /// pointed out of bounds.
    #[error("malformed record: {context}")]
    MalformedRecord {
        /// Description of the violated constraint.
        context: String,
    },

    /// The outer device packet carried a type this decoder does not know.
    #[error("unknown packet type: {0}")]
    UnknownPacket(u32),

    /// A record was shorter than its fixed layout requires.
    #[error("truncated record: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        /// Bytes the layout requires.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Node or value lookup failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// The registry was closed a second time.
    #[error("registry already closed")]
    AlreadyClosed,
}

impl BcdError {
    /// Creates a malformed-record error with context.
    pub fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedRecord {
            context: context.into(),
        }
    }

    /// Creates a truncation error from a required length and the available
    /// slice length.
    pub fn truncated(expected: usize, actual: usize) -> Self {
        Self::TruncatedData { expected, actual }
    }

    /// Creates a not found error with context about what was being searched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use bcd_parser::error::BcdError;
    /// let err = BcdError::not_found("node", "osdevice");
    /// ```
    pub fn not_found(item_type: &str, name: &str) -> Self {
        Self::NotFound(format!("{} '{}'", item_type, name))
    }
}
