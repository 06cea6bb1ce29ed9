//! Error types for horizon-kit.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) - Main error type, returned by most operations
//!   - [`TransportError`] - Network failures before a usable payload arrived
//!   - [`DecodeError`] - Payloads that do not match a known envelope or record shape
//!   - [`ParseAssetError`] - Invalid `CODE:ISSUER` asset string
//!   - [`ParseIdError`] - Invalid account id, transaction hash or numeric id
//!
//! Decoding errors are never skipped or coerced: a single bad record fails the
//! whole response it belongs to. Live streams absorb transient transport
//! failures by reconnecting and only surface [`Error::StreamInterrupted`] once
//! the reconnect budget is spent.
//!
//! # Error Handling Examples
//!
//! ```rust,no_run
//! use horizon_kit::*;
//!
//! # async fn example() -> Result<(), Error> {
//! let horizon = Horizon::testnet().build()?;
//!
//! match horizon.operations().for_ledger(100).await {
//!     Ok(response) => println!("{} operations", response.into_records().len()),
//!     Err(Error::Decode(DecodeError::UnsupportedVariant { code, .. })) => {
//!         println!("operation type {} is newer than this client", code);
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::types::{Cursor, Discriminant};

/// Error parsing a canonical asset string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid asset '{0}': expected 'native' or 'CODE:ISSUER'")]
pub struct ParseAssetError(pub String);

/// Error validating an account id, transaction hash or numeric id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseIdError(String);

impl ParseIdError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Failures raised by a [`Transport`](crate::Transport) before a payload was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Horizon returned HTTP {status}: {title}")]
    Status {
        status: u16,
        title: String,
        detail: Option<String>,
        retryable: bool,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Timeout after {0} attempts")]
    Timeout(u32),

    #[error("Event stream disconnected: {0}")]
    Disconnected(String),
}

impl TransportError {
    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            // No status means the exchange broke before or while the server
            // answered: refused, reset or dropped mid-request.
            TransportError::Http(e) => match e.status() {
                Some(status) => is_retryable_status(status.as_u16()),
                None => !e.is_builder(),
            },
            TransportError::Status { retryable, .. } => *retryable,
            TransportError::Timeout(_) => true,
            TransportError::Disconnected(_) => true,
            TransportError::InvalidUrl(_) => false,
        }
    }

    /// Create a status error, deriving retryability from the status code.
    pub fn status(status: u16, title: impl Into<String>, detail: Option<String>) -> Self {
        TransportError::Status {
            status,
            title: title.into(),
            detail,
            retryable: is_retryable_status(status),
        }
    }

    /// Create a disconnect error.
    pub fn disconnected(message: impl Into<String>) -> Self {
        TransportError::Disconnected(message.into())
    }

    /// HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if Horizon answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Statuses that indicate a transient server condition.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    // 408 Request Timeout, 429 rate limiting, 5xx server errors
    status == 408 || status == 429 || (500..600).contains(&status)
}

// ============================================================================
// Decode Errors
// ============================================================================

/// Failures interpreting a payload that was successfully received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error(
        "Unsupported {family} variant: {field} = {code}. Upgrade horizon-kit to decode newer record kinds"
    )]
    UnsupportedVariant {
        family: &'static str,
        field: &'static str,
        code: Discriminant,
    },

    #[error("Schema violation in {kind} record: {message}")]
    SchemaViolation { kind: &'static str, message: String },
}

impl DecodeError {
    /// Create a schema violation for a record kind.
    pub fn schema(kind: &'static str, message: impl std::fmt::Display) -> Self {
        DecodeError::SchemaViolation {
            kind,
            message: message.to_string(),
        }
    }

    /// Create a malformed envelope error.
    pub fn malformed(message: impl Into<String>) -> Self {
        DecodeError::MalformedEnvelope(message.into())
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for horizon-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid argument for {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    // ─── Transport ───
    #[error(transparent)]
    Transport(#[from] TransportError),

    // ─── Decoding ───
    #[error(transparent)]
    Decode(#[from] DecodeError),

    // ─── Streaming ───
    #[error(
        "Stream interrupted after {attempts} consecutive failures (resume cursor: {})",
        .cursor.as_ref().map_or("none", |c| c.as_str())
    )]
    StreamInterrupted {
        attempts: u32,
        cursor: Option<Cursor>,
        #[source]
        source: TransportError,
    },

    #[error("Stream session is already open")]
    StreamAlreadyOpen,

    #[error("Stream session is closed")]
    StreamClosed,

    // ─── Serialization ───
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // ─── Runtime ───
    #[error("Failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the failure happened in the transport.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns true if the payload carried an unknown record kind.
    pub fn is_unsupported_variant(&self) -> bool {
        matches!(self, Error::Decode(DecodeError::UnsupportedVariant { .. }))
    }

    /// Returns true if a live stream gave up reconnecting.
    pub fn is_stream_interrupted(&self) -> bool {
        matches!(self, Error::StreamInterrupted { .. })
    }
}
