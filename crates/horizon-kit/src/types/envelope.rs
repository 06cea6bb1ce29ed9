//! Response envelopes: single records vs paged collections.
//!
//! Classification is purely structural. A payload is a collection if and
//! only if it carries an `_embedded.records` array; anything else that is a
//! JSON object is a single record. The request that produced the payload
//! plays no part in the decision.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::record::{decode_all, json_type};
use super::{Cursor, Link, Record};
use crate::error::DecodeError;

/// Key holding embedded resources in a HAL collection.
pub const EMBEDDED_KEY: &str = "_embedded";
/// Key holding the record array inside [`EMBEDDED_KEY`].
pub const RECORDS_KEY: &str = "records";
/// Key holding navigation links.
pub const LINKS_KEY: &str = "_links";

/// Navigation links of a collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<Link>,
    #[serde(default)]
    pub next: Option<Link>,
    #[serde(default)]
    pub prev: Option<Link>,
}

/// A classified, not yet decoded payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// The payload is the record itself.
    Single(Value),
    /// The payload embeds an ordered record array.
    Collection { records: Vec<Value>, links: PageLinks },
}

impl Envelope {
    /// Returns true for collections.
    pub fn is_collection(&self) -> bool {
        matches!(self, Envelope::Collection { .. })
    }

    /// Decode every record with `R`'s decoder.
    pub fn decode<R: Record>(self) -> Result<Response<R>, DecodeError> {
        match self {
            Envelope::Single(raw) => Ok(Response::Single(R::decode(raw)?)),
            Envelope::Collection { records, links } => Ok(Response::Page(Page {
                records: decode_all(records)?,
                links,
            })),
        }
    }
}

/// Classify a raw response body.
pub fn classify(raw: &str) -> Result<Envelope, DecodeError> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|e| DecodeError::malformed(format!("payload is not valid JSON: {}", e)))?;
    classify_value(payload)
}

/// Classify an already parsed payload.
pub fn classify_value(payload: Value) -> Result<Envelope, DecodeError> {
    let Value::Object(mut object) = payload else {
        return Err(DecodeError::malformed(format!(
            "expected a JSON object, found {}",
            json_type(&payload)
        )));
    };

    let Some(embedded) = object.remove(EMBEDDED_KEY) else {
        return Ok(Envelope::Single(Value::Object(object)));
    };

    let records = match embedded {
        Value::Object(mut embedded) => match embedded.remove(RECORDS_KEY) {
            Some(Value::Array(records)) => records,
            Some(other) => {
                return Err(DecodeError::malformed(format!(
                    "`{}.{}` must be an array, found {}",
                    EMBEDDED_KEY,
                    RECORDS_KEY,
                    json_type(&other)
                )));
            }
            None => {
                return Err(DecodeError::malformed(format!(
                    "`{}` has no `{}` array",
                    EMBEDDED_KEY, RECORDS_KEY
                )));
            }
        },
        other => {
            return Err(DecodeError::malformed(format!(
                "`{}` must be an object, found {}",
                EMBEDDED_KEY,
                json_type(&other)
            )));
        }
    };

    let links = parse_links(&mut object)?;
    Ok(Envelope::Collection { records, links })
}

fn parse_links(object: &mut Map<String, Value>) -> Result<PageLinks, DecodeError> {
    match object.remove(LINKS_KEY) {
        Some(links) => serde_json::from_value(links)
            .map_err(|e| DecodeError::malformed(format!("invalid `{}`: {}", LINKS_KEY, e))),
        None => Ok(PageLinks::default()),
    }
}

/// One page of a collection.
#[derive(Clone, Debug)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub links: PageLinks,
}

impl<R: Record> Page<R> {
    /// Cursor of the following page: the `next` link's cursor, or the last
    /// record's paging token when the server sent no link.
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.links
            .next
            .as_ref()
            .and_then(Link::cursor)
            .or_else(|| self.records.last().map(|r| r.paging_token().clone()))
    }

    /// Cursor of the preceding page.
    pub fn prev_cursor(&self) -> Option<Cursor> {
        self.links
            .prev
            .as_ref()
            .and_then(Link::cursor)
            .or_else(|| self.records.first().map(|r| r.paging_token().clone()))
    }
}

impl<R> Page<R> {
    /// Number of records on this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the page has no records (the end of the collection).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }
}

impl<R> IntoIterator for Page<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// A decoded response.
#[derive(Clone, Debug)]
pub enum Response<R> {
    Single(R),
    Page(Page<R>),
}

impl<R> Response<R> {
    /// All records, in order. A single record becomes a one-element vector.
    pub fn into_records(self) -> Vec<R> {
        match self {
            Response::Single(record) => vec![record],
            Response::Page(page) => page.records,
        }
    }

    /// The record of a single-record response.
    pub fn single(self) -> Option<R> {
        match self {
            Response::Single(record) => Some(record),
            Response::Page(_) => None,
        }
    }

    /// The page of a collection response.
    pub fn page(self) -> Option<Page<R>> {
        match self {
            Response::Single(_) => None,
            Response::Page(page) => Some(page),
        }
    }
}
