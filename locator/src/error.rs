//! Error types for the locator container.
//!
//! This module defines a lightweight error model used across the container to
//! describe failures that can occur during registration, resolution, pending
//! classification, and producer execution.
//!
//! # Design
//!
//! - `ErrorKind` captures the error category.
//! - `Error` stores the category and a human-readable message.
//!
//! Errors are cheap to clone: a single producer failure is delivered to every
//! waiter of a coalesced resolution.
//!
//! # Feature Flags
//!
//! - `tracing`: logs errors when they are created.
//! - `debug`: enables extra diagnostic formatting in `Display`.
//!
//! # Examples
//!
//! ```
//! use locator::error::{Error, ErrorKind};
//!
//! let err = Error::not_found("database");
//! assert!(err.kind == ErrorKind::NotFound);
//! assert!(err.message.contains("database"));
//! ```

use core::fmt;

#[cfg(feature = "tracing")]
use tracing::error;

/// Error categories for the container.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub enum ErrorKind {
    /// Malformed argument at a public call.
    InvalidArgument,
    /// The identifier is already registered.
    DuplicateIdentifier,
    /// The identifier is not registered.
    NotFound,
    /// Misuse of the pending sets or of the resolution form.
    InvalidState,
    /// A producer reported or raised an error.
    ProducerFailure,
    /// The stored value is not of the requested type.
    TypeMismatch,
}

/// Container error structure.
///
/// `kind` enables programmatic handling, while `message` is human-readable.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// If the `tracing` feature is enabled, the error is automatically logged.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let error = Self {
            kind,
            message: message.into(),
        };

        #[cfg(feature = "tracing")]
        error!("{}", error);

        error
    }

    pub fn duplicate_identifier(id: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateIdentifier,
            format!("Identifier \"{}\" already defined", id),
        )
    }

    pub fn not_found(id: &str) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("Identifier \"{}\" is not defined", id),
        )
    }

    /// `mark_as_factory` on a producer awaiting protected registration.
    pub fn factory_of_protected() -> Self {
        Self::new(ErrorKind::InvalidState, "Cannot factory a protected function")
    }

    /// `mark_as_protected` on a producer awaiting factory registration.
    pub fn protect_of_factory() -> Self {
        Self::new(ErrorKind::InvalidState, "Cannot protect a factory function")
    }

    /// A producer is pending in both classification sets at registration.
    pub fn ambiguous_classification(id: &str) -> Self {
        Self::new(
            ErrorKind::InvalidState,
            format!(
                "Producer for \"{}\" is pending both as factory and as protected",
                id
            ),
        )
    }

    /// Synchronous resolution of an identifier registered with a deferred producer.
    pub fn expected_callback(id: &str) -> Self {
        Self::new(
            ErrorKind::InvalidState,
            format!(
                "Expected callback function with callback registered value \"{}\"",
                id
            ),
        )
    }

    /// Callback resolution of an identifier registered with a synchronous producer.
    pub fn unexpected_callback(id: &str) -> Self {
        Self::new(
            ErrorKind::InvalidState,
            format!(
                "Unexpected callback with no-callback registered value \"{}\"",
                id
            ),
        )
    }

    /// A producer failed. Wraps the cause into the message.
    pub fn producer_failure(id: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::ProducerFailure,
            format!("Producer for \"{}\" failed: {}", id, cause),
        )
    }

    /// A deferred producer dropped its completion handle without completing.
    pub fn completion_dropped(id: &str) -> Self {
        Self::new(
            ErrorKind::ProducerFailure,
            format!("Producer for \"{}\" dropped its completion", id),
        )
    }

    pub fn type_mismatch(id: &str, type_name: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("Identifier \"{}\" does not hold a {}", id, type_name),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "debug")]
        {
            write!(f, "({:?}) - {}", self.kind, self.message)
        }
        #[cfg(not(feature = "debug"))]
        {
            write!(f, "{}", self.message)
        }
    }
}

#[cfg(feature = "debug")]
impl std::error::Error for Error {}
