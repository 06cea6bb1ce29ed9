//! Client module for reading from Horizon.
//!
//! This module provides the core client infrastructure:
//!
//! - [`Horizon`] - The main client, the single entry point for all queries
//! - [`HorizonBuilder`] - Fluent builder for configuring the client
//! - [`HttpTransport`] - reqwest-backed [`Transport`] with retry logic
//!
//! # Query Builders
//!
//! Every collection accessor on [`Horizon`] returns a [`QueryBuilder`]. The
//! record type decides which filters are available:
//!
//! | Accessor | Records | Filters |
//! |----------|---------|---------|
//! | `accounts()` | [`AccountRecord`](crate::AccountRecord) | signer, asset, sponsor |
//! | `assets()` | [`AssetRecord`](crate::AssetRecord) | code, issuer |
//! | `effects()` | [`EffectRecord`](crate::EffectRecord) | account, ledger, transaction, operation |
//! | `ledgers()` | [`LedgerRecord`](crate::LedgerRecord) | |
//! | `operations()`, `payments()` | [`OperationRecord`](crate::OperationRecord) | account, ledger, transaction |
//! | `transactions()` | [`TransactionRecord`](crate::TransactionRecord) | account, ledger |
//! | `trade_aggregations()` | [`TradeAggregationRecord`](crate::TradeAggregationRecord) | asset pair, time range, resolution, offset |
//!
//! # Streaming
//!
//! Any collection query can be followed live:
//!
//! - [`StreamSession`] - The reconnecting session with explicit lifecycle
//! - [`RecordStream`] - The session as a [`futures::Stream`]
//! - [`BlockingRecordStream`] - The session as a blocking [`Iterator`]
//! - [`CloseHandle`] - Closes a stream from any task or thread

#[cfg(feature = "blocking")]
mod blocking;
mod horizon;
mod query;
mod sse;
mod stream;
mod transport;

#[cfg(feature = "blocking")]
pub use blocking::BlockingRecordStream;
pub use horizon::{FeeStatsQuery, Horizon, HorizonBuilder};
pub use query::{MAX_LIMIT, QueryBuilder, TRADE_RESOLUTIONS};
pub use sse::{SseDecoder, SseEvent, decode_event_stream};
pub use stream::{CloseHandle, RecordStream, StreamSession, StreamState};
pub use transport::{
    EventStream, FUTURENET, HttpTransport, NetworkConfig, PUBLIC, RetryConfig, TESTNET, Transport,
    TransportFuture,
};
