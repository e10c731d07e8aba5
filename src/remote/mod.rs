//! Search API collaborator.
//!
//! This module defines the request/response contract the controller needs
//! from a legal-research search API, plus an HTTP implementation of it.
//! The controller never talks to the transport directly; it hands an
//! [`ApiQuery`] to a [`SearchProvider`] and receives a [`ResponseEnvelope`]
//! or a [`FetchError`].

pub mod error;
pub mod http;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use error::{FetchError, FetchErrorKind};
pub use http::HttpSearchProvider;

/// A single result row returned by the API.
///
/// Everything except `highlights` is kept as an opaque JSON object. The
/// highlight fragments are pre-rendered by the search engine and are never
/// merged or diffed across items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Field name -> ordered pre-rendered fragments
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub highlights: BTreeMap<String, Vec<String>>,
    /// Remaining item fields (including `id` when the API sends one)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    /// Identity of the item, taken from its `id` field.
    ///
    /// Numbers and strings are both accepted; other JSON types have no identity.
    pub fn id(&self) -> Option<String> {
        self.fields.get("id").and_then(scalar_to_string)
    }

    /// Read a field as display text.
    pub fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(scalar_to_string)
    }
}

/// Render a JSON scalar the way it travels in a query string.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `pagination_info` block of the response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// `search_info` block of the response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub engine: String,
    #[serde(default)]
    pub took_ms: Option<u64>,
    #[serde(default)]
    pub total_matches: Option<u64>,
}

/// Response envelope shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    pub data: Vec<Item>,
    #[serde(default)]
    pub pagination_info: Option<PaginationInfo>,
    /// Opaque ordering keys for the next page; interpreted by the pagination strategy
    #[serde(default)]
    pub next_cursor: Option<Map<String, Value>>,
    #[serde(default)]
    pub search_info: Option<SearchInfo>,
}

impl ResponseEnvelope {
    /// Parse a response body. Any shape mismatch is a server error.
    pub fn from_slice(body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body)
            .map_err(|e| FetchError::server(format!("malformed response body: {e}")))
    }

    /// The server's explicit `has_more` flag, if it sent one.
    pub fn has_more(&self) -> Option<bool> {
        self.pagination_info.as_ref().and_then(|p| p.has_more)
    }

    pub fn total_count(&self) -> Option<u64> {
        self.pagination_info.as_ref().and_then(|p| p.total_count)
    }
}

/// A fully-encoded request for one page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiQuery {
    /// Endpoint path relative to the API base URL (e.g. `/api/judgments`)
    pub endpoint: String,
    /// Query parameters in send order
    pub params: Vec<(String, String)>,
}

impl ApiQuery {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    /// First value for `key`, if present
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.param(key).is_some()
    }

    /// Form-urlencoded query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

/// Common interface for search API collaborators
pub trait SearchProvider: Send + Sync {
    /// Fetch one page of results
    fn fetch_page(
        &self,
        query: &ApiQuery,
    ) -> impl std::future::Future<Output = Result<ResponseEnvelope, FetchError>> + Send;
}
