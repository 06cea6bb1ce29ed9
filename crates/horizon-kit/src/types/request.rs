//! Request descriptors produced by query builders.

use std::fmt;

use reqwest::Url;

use super::Cursor;
use crate::error::TransportError;

/// Sort order for collection endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

impl Order {
    /// Query parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully configured, immutable request.
///
/// Holds the endpoint path (relative to the Horizon base URL), the query
/// parameters in insertion order and the optional starting cursor. Setting a
/// parameter that already exists replaces its value in place, so keys stay
/// unique and the last write wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    endpoint: String,
    params: Vec<(String, String)>,
    cursor: Option<Cursor>,
}

impl RequestDescriptor {
    pub(crate) fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
            cursor: None,
        }
    }

    /// Endpoint path, e.g. `ledgers/100/transactions`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query parameters in insertion order (the cursor is kept separately).
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a single query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Starting cursor, if one was set.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// A copy of this descriptor starting at another cursor.
    pub fn with_cursor(&self, cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            ..self.clone()
        }
    }

    pub(crate) fn set_endpoint(&mut self, endpoint: String) {
        self.endpoint = endpoint;
    }

    pub(crate) fn set_param(&mut self, name: &str, value: String) {
        match self.params.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((name.to_string(), value)),
        }
    }

    pub(crate) fn remove_param(&mut self, name: &str) {
        self.params.retain(|(key, _)| key != name);
    }

    pub(crate) fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = Some(cursor);
    }

    /// Resolve against a Horizon base URL.
    pub fn to_url(&self, base: &Url) -> Result<Url, TransportError> {
        self.render(base, self.cursor.as_ref())
    }

    /// Resolve for an event stream, resuming from `resume` or the
    /// descriptor's own cursor, and defaulting to `now`.
    pub fn stream_url(&self, base: &Url, resume: Option<&Cursor>) -> Result<Url, TransportError> {
        let now = Cursor::now();
        let cursor = resume.or(self.cursor.as_ref()).unwrap_or(&now);
        self.render(base, Some(cursor))
    }

    fn render(&self, base: &Url, cursor: Option<&Cursor>) -> Result<Url, TransportError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(self.endpoint.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", self.endpoint, e)))?;

        if !self.params.is_empty() || cursor.is_some() {
            let mut query = url.query_pairs_mut();
            for (name, value) in &self.params {
                query.append_pair(name, value);
            }
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor.as_str());
            }
        }

        Ok(url)
    }
}
