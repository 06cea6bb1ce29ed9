//! Core types for Horizon responses and requests.
//!
//! Records are hand-written against the JSON Horizon serves and validated
//! when decoded; nothing here performs I/O.

mod account;
mod asset;
mod common;
mod cursor;
mod effect;
pub mod envelope;
mod fee_stats;
mod ids;
mod ledger;
mod network;
mod operation;
mod record;
mod request;
mod trade_aggregation;
mod transaction;

pub use account::{AccountFlags, AccountRecord, Balance, Signer, Thresholds};
pub use asset::{AssetFlags, AssetRecord};
pub use common::{Asset, Link, Links, Price};
pub use cursor::Cursor;
pub use effect::EffectRecord;
pub use envelope::{Envelope, Page, PageLinks, Response, classify, classify_value};
pub use fee_stats::{FeeDistribution, FeeStats};
pub use ids::{
    ACCOUNT_ID_LEN, IntoPositiveId, TRANSACTION_HASH_LEN, validate_account_id,
    validate_transaction_hash,
};
pub use ledger::LedgerRecord;
pub use network::Network;
pub use operation::{
    AccountMergeOperation, AllowTrustOperation, BumpSequenceOperation, ChangeTrustOperation,
    CreateAccountOperation, InflationOperation, ManageDataOperation, ManageOfferOperation,
    OperationBase, OperationKind, OperationRecord, PathPaymentOperation, PaymentOperation,
    SetOptionsOperation,
};
pub use record::{Discriminant, Record, decode_all, decode_fields};
pub use request::{Order, RequestDescriptor};
pub use trade_aggregation::TradeAggregationRecord;
pub use transaction::TransactionRecord;
