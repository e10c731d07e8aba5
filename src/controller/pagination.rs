//! Pagination strategies: offset-based and cursor-based.
//!
//! A strategy is fixed per section. The cursor keeps the position of the
//! next page and is advanced only from an accepted response; on every fresh
//! fetch it goes back to its initial state.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::remote::{ApiQuery, FetchError, ResponseEnvelope, scalar_to_string};

use super::fetch::FetchMode;

/// Cursor shape for cursor-paginated sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorSpec {
    /// Ordering is unique on `id` alone
    Single,
    /// Ordering needs `id` plus a tiebreaker key sent as `cursor_<secondary>`
    Dual { secondary: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    Offset,
    Cursor(CursorSpec),
}

/// Ordering keys taken from a response's `next_cursor`.
///
/// The dual variant can only be built with both keys, so a partial cursor
/// never reaches a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKeys {
    Single {
        id: String,
    },
    Dual {
        id: String,
        secondary_key: String,
        secondary: String,
    },
}

impl CursorKeys {
    /// Extract keys for `shape` from a `next_cursor` object.
    ///
    /// A cursor missing one of the required keys is a malformed response.
    pub fn from_next_cursor(
        shape: &CursorSpec,
        next: &Map<String, Value>,
    ) -> Result<Self, FetchError> {
        let key = |name: &str| {
            next.get(name).and_then(scalar_to_string).ok_or_else(|| {
                FetchError::server(format!("next_cursor is missing '{name}'"))
            })
        };

        match shape {
            CursorSpec::Single => Ok(CursorKeys::Single { id: key("id")? }),
            CursorSpec::Dual { secondary } => Ok(CursorKeys::Dual {
                id: key("id")?,
                secondary_key: secondary.clone(),
                secondary: key(secondary)?,
            }),
        }
    }
}

/// Pagination parameters of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageRequest {
    Offset { limit: u32, offset: u64 },
    Cursor { limit: u32, keys: Option<CursorKeys> },
}

impl PageRequest {
    /// Append pagination parameters to an API query
    pub fn encode(&self, query: &mut ApiQuery) {
        match self {
            PageRequest::Offset { limit, offset } => {
                query.push("limit", limit.to_string());
                query.push("offset", offset.to_string());
            }
            PageRequest::Cursor { limit, keys } => {
                query.push("limit", limit.to_string());
                match keys {
                    None => {}
                    Some(CursorKeys::Single { id }) => query.push("cursor_id", id.clone()),
                    Some(CursorKeys::Dual {
                        id,
                        secondary_key,
                        secondary,
                    }) => {
                        query.push("cursor_id", id.clone());
                        query.push(format!("cursor_{secondary_key}"), secondary.clone());
                    }
                }
            }
        }
    }
}

/// Position and continuation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationState {
    Offset {
        offset: u64,
        page_size: u32,
        total_count: Option<u64>,
        has_more: bool,
    },
    Cursor {
        shape: CursorSpec,
        page_size: u32,
        keys: Option<CursorKeys>,
        has_more: bool,
    },
}

/// Resolve the server's `has_more` flag.
///
/// An explicit flag wins. An absent flag means "maybe": keep loading,
/// unless a load-more page already came back empty.
fn resolve_has_more(flag: Option<bool>, returned: usize, mode: FetchMode) -> bool {
    match flag {
        Some(explicit) => explicit,
        None => !(mode == FetchMode::LoadMore && returned == 0),
    }
}

/// Owner of the pagination state for the active section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    strategy: PaginationStrategy,
    page_size: u32,
    state: PaginationState,
}

impl PaginationCursor {
    pub fn new(strategy: PaginationStrategy, page_size: u32) -> Self {
        let state = Self::initial_state(&strategy, page_size);
        Self {
            strategy,
            page_size,
            state,
        }
    }

    fn initial_state(strategy: &PaginationStrategy, page_size: u32) -> PaginationState {
        match strategy {
            PaginationStrategy::Offset => PaginationState::Offset {
                offset: 0,
                page_size,
                total_count: None,
                has_more: true,
            },
            PaginationStrategy::Cursor(shape) => PaginationState::Cursor {
                shape: shape.clone(),
                page_size,
                keys: None,
                has_more: true,
            },
        }
    }

    pub fn strategy(&self) -> &PaginationStrategy {
        &self.strategy
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Back to the first page
    pub fn reset(&mut self) {
        self.state = Self::initial_state(&self.strategy, self.page_size);
    }

    pub fn is_initial(&self) -> bool {
        self.state == Self::initial_state(&self.strategy, self.page_size)
    }

    pub fn has_more(&self) -> bool {
        match &self.state {
            PaginationState::Offset { has_more, .. } | PaginationState::Cursor { has_more, .. } => {
                *has_more
            }
        }
    }

    pub fn total_count(&self) -> Option<u64> {
        match &self.state {
            PaginationState::Offset { total_count, .. } => *total_count,
            PaginationState::Cursor { .. } => None,
        }
    }

    /// Parameters for the next page
    pub fn request(&self) -> PageRequest {
        match &self.state {
            PaginationState::Offset {
                offset, page_size, ..
            } => PageRequest::Offset {
                limit: *page_size,
                offset: *offset,
            },
            PaginationState::Cursor {
                page_size, keys, ..
            } => PageRequest::Cursor {
                limit: *page_size,
                keys: keys.clone(),
            },
        }
    }

    /// Advance past an accepted page.
    ///
    /// `sent` is the pagination snapshot of the request that produced
    /// `envelope`. The next offset counts items actually returned, never the
    /// limit. Nothing changes if the response is malformed.
    pub fn advance(
        &mut self,
        sent: &PageRequest,
        envelope: &ResponseEnvelope,
        mode: FetchMode,
    ) -> Result<(), FetchError> {
        let returned = envelope.data.len();
        let flag = envelope.has_more();

        let next = match (&self.state, sent) {
            (
                PaginationState::Offset {
                    page_size,
                    total_count,
                    ..
                },
                PageRequest::Offset { offset, .. },
            ) => PaginationState::Offset {
                offset: offset + returned as u64,
                page_size: *page_size,
                total_count: envelope.total_count().or(*total_count),
                has_more: resolve_has_more(flag, returned, mode),
            },
            (PaginationState::Cursor { shape, page_size, .. }, PageRequest::Cursor { .. }) => {
                let mut has_more = resolve_has_more(flag, returned, mode);
                let keys = match &envelope.next_cursor {
                    Some(next) if has_more => Some(CursorKeys::from_next_cursor(shape, next)?),
                    Some(_) => None,
                    None => {
                        if has_more {
                            tracing::warn!("response has more pages but no next_cursor; stopping");
                            has_more = false;
                        }
                        None
                    }
                };
                PaginationState::Cursor {
                    shape: shape.clone(),
                    page_size: *page_size,
                    keys,
                    has_more,
                }
            }
            _ => {
                return Err(FetchError::server(
                    "pagination snapshot does not match the section strategy",
                ));
            }
        };

        self.state = next;
        Ok(())
    }
}
