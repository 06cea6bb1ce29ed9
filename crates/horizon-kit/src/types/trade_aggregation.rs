//! Trade aggregation buckets.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::{Cursor, Price, Record, decode_fields};
use crate::error::DecodeError;

/// Trading activity of one asset pair over one time bucket.
///
/// Prices are quoted in units of the counter asset per unit of the base
/// asset. Decimal fields are kept as Horizon's strings; the `*_r` fields
/// carry the exact rational.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TradeAggregationRecord {
    /// Bucket start, in milliseconds since the epoch.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub timestamp: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub trade_count: i64,
    pub base_volume: String,
    pub counter_volume: String,
    pub avg: String,
    pub high: String,
    pub high_r: Price,
    pub low: String,
    pub low_r: Price,
    pub open: String,
    pub open_r: Price,
    pub close: String,
    pub close_r: Price,
    /// Horizon pages aggregations by bucket start; filled from `timestamp`.
    #[serde(skip_deserializing, default = "Cursor::now")]
    pub paging_token: Cursor,
}

impl Record for TradeAggregationRecord {
    const KIND: &'static str = "trade_aggregation";

    fn decode(raw: Value) -> Result<Self, DecodeError> {
        let mut record: Self = decode_fields(Self::KIND, raw)?;
        record.paging_token = Cursor::new(record.timestamp.to_string());
        Ok(record)
    }

    fn paging_token(&self) -> &Cursor {
        &self.paging_token
    }
}
