//! Asset statistics records.

use serde::Deserialize;

use super::record::impl_record;
use super::{Asset, Cursor, Links};

/// Authorization flags of an asset issuer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AssetFlags {
    pub auth_required: bool,
    pub auth_revocable: bool,
    #[serde(default)]
    pub auth_immutable: bool,
    #[serde(default)]
    pub auth_clawback_enabled: bool,
}

/// Summary statistics for one issued asset.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssetRecord {
    pub paging_token: Cursor,
    #[serde(flatten)]
    pub asset: Asset,
    pub amount: String,
    pub num_accounts: u32,
    pub flags: AssetFlags,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl_record!(AssetRecord, "asset");
