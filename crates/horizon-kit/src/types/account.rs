//! Account records.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use super::record::impl_record;
use super::{Asset, Cursor, Links};
use crate::error::Error;

/// Signing thresholds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Thresholds {
    pub low_threshold: u8,
    pub med_threshold: u8,
    pub high_threshold: u8,
}

/// Account authorization flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AccountFlags {
    pub auth_required: bool,
    pub auth_revocable: bool,
    pub auth_immutable: bool,
    #[serde(default)]
    pub auth_clawback_enabled: bool,
}

/// One trustline (or the native balance).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Balance {
    pub balance: String,
    #[serde(flatten)]
    pub asset: Asset,
    /// Missing for the native balance.
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub buying_liabilities: Option<String>,
    #[serde(default)]
    pub selling_liabilities: Option<String>,
    #[serde(default)]
    pub is_authorized: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Signer {
    pub key: String,
    pub weight: u8,
    #[serde(rename = "type")]
    pub signer_type: String,
}

/// An account and its current state.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub account_id: String,
    pub paging_token: Cursor,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: i64,
    pub subentry_count: u32,
    #[serde(default)]
    pub home_domain: Option<String>,
    #[serde(default)]
    pub inflation_destination: Option<String>,
    #[serde(default)]
    pub last_modified_ledger: Option<u32>,
    pub thresholds: Thresholds,
    pub flags: AccountFlags,
    pub balances: Vec<Balance>,
    pub signers: Vec<Signer>,
    /// Data entries, values base64-encoded.
    #[serde(default)]
    pub data: HashMap<String, String>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl AccountRecord {
    /// Decoded value of a data entry.
    pub fn data_value(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.data
            .get(key)
            .map(|value| STANDARD.decode(value))
            .transpose()
            .map_err(Error::from)
    }

    /// The balance held in `asset`, if the account trusts it.
    pub fn balance_for(&self, asset: &Asset) -> Option<&Balance> {
        self.balances.iter().find(|b| &b.asset == asset)
    }
}

impl_record!(AccountRecord, "account");
