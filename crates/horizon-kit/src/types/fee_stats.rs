//! Fee statistics.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::decode_fields;
use crate::error::DecodeError;

/// Percentile distribution of fees over recent ledgers.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FeeDistribution {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub min: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub mode: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p10: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p20: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p30: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p40: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p50: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p60: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p70: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p80: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p90: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p95: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub p99: i64,
}

/// The `/fee_stats` resource.
///
/// Not a paged record: it has no paging token and is fetched with
/// [`Horizon::fee_stats`](crate::Horizon::fee_stats).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FeeStats {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub last_ledger: u32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub last_ledger_base_fee: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub ledger_capacity_usage: f64,
    pub fee_charged: FeeDistribution,
    pub max_fee: FeeDistribution,
}

impl FeeStats {
    /// Decode and validate a raw payload.
    pub fn decode(raw: Value) -> Result<Self, DecodeError> {
        decode_fields("fee_stats", raw)
    }
}
