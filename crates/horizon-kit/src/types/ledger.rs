//! Ledger records.

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::record::impl_record;
use super::{Cursor, Links};

/// A closed ledger.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LedgerRecord {
    pub id: String,
    pub paging_token: Cursor,
    pub hash: String,
    #[serde(default)]
    pub prev_hash: Option<String>,
    pub sequence: u32,
    pub successful_transaction_count: u32,
    #[serde(default)]
    pub failed_transaction_count: Option<u32>,
    pub operation_count: u32,
    #[serde(default)]
    pub tx_set_operation_count: Option<u32>,
    pub closed_at: String,
    pub total_coins: String,
    pub fee_pool: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub base_fee_in_stroops: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub base_reserve_in_stroops: i64,
    pub max_tx_set_size: u32,
    pub protocol_version: u32,
    #[serde(default)]
    pub header_xdr: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl_record!(LedgerRecord, "ledger");
