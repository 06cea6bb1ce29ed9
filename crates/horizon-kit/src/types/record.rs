//! Typed record decoding.
//!
//! Every record family implements [`Record`]. Single-shape families simply
//! deserialize; polymorphic families (operations) first read a discriminant
//! field, resolve it against a closed set of known kinds and only then
//! validate the remaining fields against that kind's shape. An unknown
//! discriminant is a hard [`DecodeError::UnsupportedVariant`], never a
//! fallback.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Cursor;
use crate::error::DecodeError;

/// The value of a discriminant field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Discriminant {
    /// Integer type code, e.g. `type_i`.
    Int(i64),
    /// String type code, e.g. `type`.
    Str(String),
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminant::Int(code) => write!(f, "{}", code),
            Discriminant::Str(code) => write!(f, "{:?}", code),
        }
    }
}

/// A record that can be decoded from a raw Horizon payload.
pub trait Record: Sized + Send + 'static {
    /// Family name used in error messages, e.g. `"transaction"`.
    const KIND: &'static str;

    /// Decode and validate a single raw record.
    fn decode(raw: Value) -> Result<Self, DecodeError>;

    /// The record's paging token.
    fn paging_token(&self) -> &Cursor;
}

/// Deserialize `raw` into `T`, reporting failures as schema violations of `kind`.
pub fn decode_fields<T: DeserializeOwned>(kind: &'static str, raw: Value) -> Result<T, DecodeError> {
    if !raw.is_object() {
        return Err(DecodeError::schema(
            kind,
            format!("expected a JSON object, found {}", json_type(&raw)),
        ));
    }
    serde_json::from_value(raw).map_err(|e| DecodeError::schema(kind, e))
}

/// Decode a batch in order. The first failing element fails the batch.
pub fn decode_all<R: Record>(raw: Vec<Value>) -> Result<Vec<R>, DecodeError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            R::decode(value).inspect_err(|e| {
                tracing::debug!(kind = R::KIND, index, error = %e, "rejecting batch");
            })
        })
        .collect()
}

/// Read an integer discriminant.
///
/// A missing or non-integer field is a schema violation of the family, not
/// an unsupported variant: the record does not even say what it is.
pub(crate) fn integer_discriminant(
    kind: &'static str,
    raw: &Value,
    field: &'static str,
) -> Result<i64, DecodeError> {
    match raw.get(field) {
        Some(value) => value.as_i64().ok_or_else(|| {
            DecodeError::schema(
                kind,
                format!("`{}` must be an integer, found {}", field, json_type(value)),
            )
        }),
        None => Err(DecodeError::schema(
            kind,
            format!("missing discriminant `{}`", field),
        )),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Implement [`Record`] for a single-shape family with a `paging_token` field.
macro_rules! impl_record {
    ($ty:ty, $kind:literal) => {
        impl $crate::types::Record for $ty {
            const KIND: &'static str = $kind;

            fn decode(raw: serde_json::Value) -> Result<Self, $crate::error::DecodeError> {
                $crate::types::decode_fields(Self::KIND, raw)
            }

            fn paging_token(&self) -> &$crate::types::Cursor {
                &self.paging_token
            }
        }
    };
}

pub(crate) use impl_record;
