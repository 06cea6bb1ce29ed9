//! Paging tokens.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque position marker attached to every record.
///
/// Horizon uses the same token for forward pagination (`?cursor=`) and for
/// resuming live streams (`Last-Event-ID`). Tokens are usually numeric
/// (`"12884905985"`) or dash-separated numeric segments (`"12884905985-1"`
/// for effects), and the ordering follows that structure: segments compare
/// numerically, so `"9-1" < "10-1"`. Non-numeric tokens such as `now` sort
/// after every numeric token and compare lexicographically among themselves.
///
/// # Example
///
/// ```
/// use horizon_kit::Cursor;
///
/// let a: Cursor = "99".parse().unwrap();
/// let b = Cursor::from(100u64);
/// assert!(a < b);
/// assert!(b < Cursor::now());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// The special cursor meaning "only records produced from now on".
    pub const NOW: &'static str = "now";

    /// Create a cursor from any token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The `now` cursor used by streams without an explicit start.
    pub fn now() -> Self {
        Self(Self::NOW.to_string())
    }

    /// Returns true if this is the `now` cursor.
    pub fn is_now(&self) -> bool {
        self.0 == Self::NOW
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric segments with leading zeros stripped, or `None` for opaque tokens.
    fn segments(&self) -> Option<Vec<&str>> {
        self.0
            .split('-')
            .map(|segment| {
                (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
                    .then(|| segment.trim_start_matches('0'))
            })
            .collect()
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.segments(), other.segments()) {
            (Some(a), Some(b)) => a
                .iter()
                .zip(&b)
                .map(|(x, y)| cmp_digits(x, y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len()))
                // keeps the order consistent with Eq for "007" vs "7"
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Cursor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&String> for Cursor {
    fn from(token: &String) -> Self {
        Self(token.clone())
    }
}

impl From<u64> for Cursor {
    fn from(token: u64) -> Self {
        Self(token.to_string())
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
