//! Scroll-proximity detection for infinite scroll.

use std::time::{Duration, Instant};

/// What the view reports about its scroll position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollObservation {
    /// A sentinel element after the last item entered or left the viewport
    Sentinel { visible: bool },
    /// Raw geometry, in pixels
    Position {
        scroll_top: f64,
        viewport_height: f64,
        content_height: f64,
    },
}

/// Throttled end-of-list detection.
///
/// Evaluation is leading-edge with a trailing call: the first observation in
/// a throttle window is evaluated at once, later ones only update the latest
/// known state and schedule one evaluation at the end of the window. A change
/// of sentinel visibility is never throttled.
///
/// The latest state is remembered so the owner can re-check proximity after
/// a request that blocked a load-more has finished. Sentinel visibility holds
/// until the view reports otherwise; a position reading is dropped once a
/// load-more it triggered is issued or the list is replaced.
#[derive(Debug, Clone)]
pub struct InfiniteScrollTrigger {
    throttle: Duration,
    threshold_px: f64,
    last_evaluated: Option<Instant>,
    trailing: Option<Instant>,
    latest: Option<ScrollObservation>,
    active: bool,
}

impl InfiniteScrollTrigger {
    pub fn new(throttle: Duration, threshold_px: f64) -> Self {
        Self {
            throttle,
            threshold_px,
            last_evaluated: None,
            trailing: None,
            latest: None,
            active: true,
        }
    }

    /// Record an observation; true when it is evaluated now and the end of
    /// the list is near.
    pub fn observe(&mut self, observation: ScrollObservation, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        let visibility_changed = match (observation, self.latest) {
            (
                ScrollObservation::Sentinel { visible },
                Some(ScrollObservation::Sentinel { visible: before }),
            ) => visible != before,
            (ScrollObservation::Sentinel { .. }, _) => true,
            _ => false,
        };
        self.latest = Some(observation);

        if !visibility_changed
            && let Some(last) = self.last_evaluated
            && now.saturating_duration_since(last) < self.throttle
        {
            self.trailing = Some(last + self.throttle);
            return false;
        }
        self.last_evaluated = Some(now);
        self.trailing = None;
        self.is_near_end()
    }

    /// When the trailing evaluation of a throttled window is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.trailing.filter(|_| self.active)
    }

    /// Run the trailing evaluation if it is due; true when the end is near
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.trailing {
            Some(deadline) if self.active && deadline <= now => {
                self.trailing = None;
                self.last_evaluated = Some(now);
                self.is_near_end()
            }
            _ => false,
        }
    }

    /// Whether the latest known state puts the end of the list in reach
    pub fn is_near_end(&self) -> bool {
        if !self.active {
            return false;
        }
        match self.latest {
            Some(ScrollObservation::Sentinel { visible }) => visible,
            Some(ScrollObservation::Position {
                scroll_top,
                viewport_height,
                content_height,
            }) => content_height - (scroll_top + viewport_height) <= self.threshold_px,
            None => false,
        }
    }

    /// Drop a position reading once the list it measured changes
    pub fn forget_position(&mut self) {
        if matches!(self.latest, Some(ScrollObservation::Position { .. })) {
            self.latest = None;
        }
    }

    /// Stop observing for good (view teardown)
    pub fn stop(&mut self) {
        self.active = false;
        self.trailing = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
