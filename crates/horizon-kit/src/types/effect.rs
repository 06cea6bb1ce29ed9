//! Effect records.
//!
//! Effects come in dozens of kinds whose details change between server
//! releases. They are decoded as one shape: the shared fields are typed and
//! the kind-specific fields stay in [`EffectRecord::details`].

use serde::Deserialize;
use serde_json::{Map, Value};

use super::record::impl_record;
use super::{Cursor, Links};

/// A single effect of an operation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EffectRecord {
    pub id: String,
    pub paging_token: Cursor,
    pub account: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_i: i64,
    pub created_at: String,
    #[serde(rename = "_links", default)]
    pub links: Links,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl EffectRecord {
    /// A kind-specific field.
    pub fn detail(&self, name: &str) -> Option<&Value> {
        self.details.get(name)
    }
}

impl_record!(EffectRecord, "effect");
