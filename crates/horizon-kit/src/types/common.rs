//! Shapes shared by several record families.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::Cursor;
use crate::error::ParseAssetError;

/// A HAL navigation link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

impl Link {
    /// The `cursor` query parameter carried by this link, if any.
    pub fn cursor(&self) -> Option<Cursor> {
        self.query_pairs()
            .into_iter()
            .find(|(name, _)| name == "cursor")
            .map(|(_, value)| Cursor::new(value))
    }

    /// All query parameters of the link, in order.
    ///
    /// Templated links (`{?cursor,limit,order}`) have none.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        if self.templated.unwrap_or(false) {
            return Vec::new();
        }
        Url::parse(&self.href)
            .map(|url| {
                url.query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The `_links` object of a record, keyed by relation name.
pub type Links = HashMap<String, Link>;

/// An asset as Horizon spells it in record fields.
///
/// Records flatten assets into `asset_type` / `asset_code` / `asset_issuer`
/// triples, optionally prefixed (`source_asset_type`, `buying_asset_code`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
}

impl Asset {
    /// The native asset (lumens).
    pub fn native() -> Self {
        Self {
            asset_type: "native".to_string(),
            asset_code: None,
            asset_issuer: None,
        }
    }

    /// A credit asset; the type follows from the code length.
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        let code = code.into();
        let asset_type = if code.len() <= 4 {
            "credit_alphanum4"
        } else {
            "credit_alphanum12"
        };
        Self {
            asset_type: asset_type.to_string(),
            asset_code: Some(code),
            asset_issuer: Some(issuer.into()),
        }
    }

    /// Returns true for the native asset.
    pub fn is_native(&self) -> bool {
        self.asset_type == "native"
    }
}

/// Canonical form: `native` or `CODE:ISSUER`.
impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.asset_code, &self.asset_issuer) {
            (Some(code), Some(issuer)) if !self.is_native() => write!(f, "{}:{}", code, issuer),
            _ => f.write_str(&self.asset_type),
        }
    }
}

impl FromStr for Asset {
    type Err = ParseAssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "native" {
            return Ok(Asset::native());
        }
        match s.split_once(':') {
            Some((code, issuer))
                if (1..=12).contains(&code.len())
                    && code.chars().all(|c| c.is_ascii_alphanumeric())
                    && !issuer.is_empty() =>
            {
                Ok(Asset::credit(code, issuer))
            }
            _ => Err(ParseAssetError(s.to_string())),
        }
    }
}

/// An exact price as a rational number.
///
/// Offers spell the fields `n`/`d`; trade aggregations use `N`/`D`.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    #[serde(alias = "N")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub n: i64,
    #[serde(alias = "D")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub d: i64,
}

impl Price {
    /// Approximate decimal value; `None` when the denominator is zero.
    pub fn as_f64(&self) -> Option<f64> {
        (self.d != 0).then(|| self.n as f64 / self.d as f64)
    }
}
