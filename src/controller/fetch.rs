//! Request issuance and the stale-response guard.
//!
//! Every fresh request bumps the generation. A response is applied only if
//! its request carries the current generation, whatever order responses
//! arrive in. Load-more requests have their own busy slot, released as soon
//! as the owning request resolves, success or failure.

use std::fmt;

use serde::Serialize;

use crate::remote::{ApiQuery, FetchError};

use super::filter::FilterSet;
use super::pagination::PageRequest;

/// Monotonic stamp of a result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Replaces the result list
    Fresh,
    /// Appends the next page
    LoadMore,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Fresh => write!(f, "fresh"),
            FetchMode::LoadMore => write!(f, "load_more"),
        }
    }
}

/// One request, with the snapshots it was built from.
///
/// A load-more request carries the generation of the result set it extends.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Per-request sequence number
    pub id: u64,
    pub mode: FetchMode,
    pub generation: Generation,
    pub section: String,
    pub filters: FilterSet,
    pub page: PageRequest,
    pub query: ApiQuery,
}

/// What the request is built from; the coordinator adds the stamps.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub section: String,
    pub filters: FilterSet,
    pub page: PageRequest,
    pub query: ApiQuery,
}

/// A failure awaiting retry
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub scope: FetchMode,
    pub error: FetchError,
    pub request: FetchRequest,
}

/// Verdict on an arriving response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Apply,
    Stale,
}

#[derive(Debug, Default)]
pub struct FetchCoordinator {
    generation: Generation,
    next_id: u64,
    fresh_in_flight: Option<u64>,
    load_more_busy: Option<u64>,
    failure: Option<FetchFailure>,
    closed: bool,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn stamp(&mut self, mode: FetchMode, parts: RequestParts) -> FetchRequest {
        self.next_id += 1;
        FetchRequest {
            id: self.next_id,
            mode,
            generation: self.generation,
            section: parts.section,
            filters: parts.filters,
            page: parts.page,
            query: parts.query,
        }
    }

    /// Issue a fresh request under a new generation.
    ///
    /// Pre-empts any request in flight: older responses become stale and the
    /// load-more slot is released. Returns `None` once closed.
    pub fn issue_fresh(&mut self, parts: RequestParts) -> Option<FetchRequest> {
        if self.closed {
            return None;
        }
        self.generation = self.generation.next();
        self.load_more_busy = None;
        self.failure = None;

        let request = self.stamp(FetchMode::Fresh, parts);
        self.fresh_in_flight = Some(request.id);
        tracing::debug!(generation = %request.generation, id = request.id, "issuing fresh request");
        Some(request)
    }

    /// Whether a load-more may be issued now
    pub fn can_load_more(&self) -> bool {
        !self.closed
            && self.fresh_in_flight.is_none()
            && self.load_more_busy.is_none()
            && self.failure.is_none()
    }

    /// Issue a load-more extending the current generation, if the gate is open
    pub fn issue_load_more(&mut self, parts: RequestParts) -> Option<FetchRequest> {
        if !self.can_load_more() {
            return None;
        }
        let request = self.stamp(FetchMode::LoadMore, parts);
        self.load_more_busy = Some(request.id);
        tracing::debug!(
            generation = %request.generation,
            id = request.id,
            "issuing load-more request"
        );
        Some(request)
    }

    /// Settle a request whose response (or error) arrived.
    ///
    /// Releases the slot the request owns before deciding whether its result
    /// may be applied.
    pub fn resolve(&mut self, request: &FetchRequest) -> Resolution {
        match request.mode {
            FetchMode::Fresh if self.fresh_in_flight == Some(request.id) => {
                self.fresh_in_flight = None;
            }
            FetchMode::LoadMore if self.load_more_busy == Some(request.id) => {
                self.load_more_busy = None;
            }
            FetchMode::Fresh => {}
            FetchMode::LoadMore => {
                // superseded load-more; a newer one may own the slot
                return Resolution::Stale;
            }
        }

        if self.closed || request.generation != self.generation {
            Resolution::Stale
        } else {
            Resolution::Apply
        }
    }

    /// Record a failure for an applied request
    pub fn fail(&mut self, request: FetchRequest, error: FetchError) {
        self.failure = Some(FetchFailure {
            scope: request.mode,
            error,
            request,
        });
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        self.failure.as_ref()
    }

    /// Re-issue the failed request.
    ///
    /// A fresh failure gets a new generation with identical parameters; a
    /// load-more failure re-sends the same page under the same generation.
    /// No failure pending means nothing to do.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        if self.closed {
            return None;
        }
        let failure = self.failure.take()?;
        let parts = RequestParts {
            section: failure.request.section,
            filters: failure.request.filters,
            page: failure.request.page,
            query: failure.request.query,
        };

        match failure.scope {
            FetchMode::Fresh => self.issue_fresh(parts),
            FetchMode::LoadMore => {
                if failure.request.generation != self.generation {
                    return None;
                }
                self.issue_load_more(parts)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.fresh_in_flight.is_some()
    }

    pub fn is_loading_more(&self) -> bool {
        self.load_more_busy.is_some()
    }

    /// Stop accepting responses and issuing requests
    pub fn close(&mut self) {
        self.closed = true;
        self.fresh_in_flight = None;
        self.load_more_busy = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
