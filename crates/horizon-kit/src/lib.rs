//! A clean, ergonomic Rust client for Stellar Horizon.
//!
//! **horizon-kit** reads ledger data from a Horizon server: it builds
//! validated requests, unwraps Horizon's HAL envelopes into typed records,
//! and follows collections live over server-sent events with automatic
//! cursor-resuming reconnects.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use horizon_kit::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), horizon_kit::Error> {
//!     // Configure once
//!     let horizon = Horizon::testnet().build()?;
//!
//!     // One page of transactions in ledger 100, failed ones included
//!     let page = horizon
//!         .transactions()
//!         .for_ledger(100)
//!         .include_failed(true)
//!         .await?;
//!     for tx in page.into_records() {
//!         println!("{} successful={}", tx.hash, tx.is_successful());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use horizon_kit::*;
//!
//! # async fn example() -> Result<(), Error> {
//! let horizon = Horizon::testnet().build()?;
//! let mut payments = horizon.payments().cursor("now").stream()?;
//!
//! while let Some(payment) = payments.next().await {
//!     let payment = payment?;
//!     println!("{} {}", payment.kind(), payment.id());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! 1. **Single entry point**: Everything hangs off the [`Horizon`] client
//! 2. **Validate before sending**: Bad arguments fail at build time with
//!    [`Error::InvalidArgument`], never as a server round trip
//! 3. **Closed variant sets**: Unknown operation types are reported as
//!    [`DecodeError::UnsupportedVariant`], never silently dropped
//! 4. **Resumable streams**: Every delivered record advances a [`Cursor`]
//!    the session reconnects from
//!
//! # Core Types
//!
//! - [`RequestDescriptor`] - Endpoint plus validated parameters
//! - [`Envelope`], [`Page`], [`Response`] - Unwrapped response shapes
//! - [`OperationRecord`] - Closed set of operation variants
//! - [`Asset`] - Native or `CODE:ISSUER` asset

pub mod client;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{DecodeError, Error, ParseAssetError, ParseIdError, TransportError};
pub use types::*;

// Re-export client types
#[cfg(feature = "blocking")]
pub use client::BlockingRecordStream;
pub use client::{
    CloseHandle, EventStream, FUTURENET, FeeStatsQuery, Horizon, HorizonBuilder, HttpTransport,
    MAX_LIMIT, NetworkConfig, PUBLIC, QueryBuilder, RecordStream, RetryConfig, SseDecoder,
    SseEvent, StreamSession, StreamState, TESTNET, TRADE_RESOLUTIONS, Transport, TransportFuture,
};

// URLs are part of the transport and descriptor API
pub use reqwest::Url;
