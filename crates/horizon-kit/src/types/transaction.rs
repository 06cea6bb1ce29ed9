//! Transaction records.

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::record::impl_record;
use super::{Cursor, Links};

/// A transaction as Horizon reports it.
///
/// XDR fields are kept as their base64 strings; this crate does not decode
/// the binary ledger format.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub paging_token: Cursor,
    /// Absent on servers that only ingest successful transactions.
    #[serde(default)]
    pub successful: Option<bool>,
    pub hash: String,
    pub ledger: u32,
    pub created_at: String,
    pub source_account: String,
    #[serde_as(as = "DisplayFromStr")]
    pub source_account_sequence: i64,
    #[serde(default)]
    pub fee_account: Option<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub fee_charged: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_fee: i64,
    pub operation_count: u32,
    pub envelope_xdr: String,
    pub result_xdr: String,
    #[serde(default)]
    pub result_meta_xdr: Option<String>,
    #[serde(default)]
    pub fee_meta_xdr: Option<String>,
    pub memo_type: String,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub signatures: Vec<String>,
    #[serde(default)]
    pub valid_after: Option<String>,
    #[serde(default)]
    pub valid_before: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl TransactionRecord {
    /// Returns true unless Horizon reported the transaction as failed.
    pub fn is_successful(&self) -> bool {
        self.successful.unwrap_or(true)
    }
}

impl_record!(TransactionRecord, "transaction");
