//! Async runtime for a [`SearchController`].
//!
//! One task owns the controller and multiplexes three sources with
//! `tokio::select!`: UI events from a channel, the earliest debounce
//! deadline, and the fetches in flight. Superseded fetches are not aborted;
//! they complete and the controller discards their results.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::error::Result;
use crate::remote::{FetchError, ResponseEnvelope, SearchProvider};

use super::catalog::PageCatalog;
use super::fetch::FetchRequest;
use super::model::{Command, ControllerSettings, ResponseOutcome, ViewSnapshot};
use super::scroll::ScrollObservation;
use super::url::{HistorySink, MemoryHistory, MemorySectionMemory, SectionMemory};
use super::SearchController;

/// Events a view sends to the driver
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    FieldFocused(String),
    FieldEdited { field: String, value: String },
    FieldBlurred(String),
    FieldSubmitted(String),
    FreshRequested,
    FiltersCleared,
    LoadMoreRequested,
    Scrolled(ScrollObservation),
    SectionChanged(String),
    UrlChanged(String),
    Retry,
    Teardown,
}

type FetchOutcome = (FetchRequest, std::result::Result<ResponseEnvelope, FetchError>);

pub struct ControllerDriver<P, H = MemoryHistory, M = MemorySectionMemory> {
    controller: SearchController,
    provider: Arc<P>,
    history: H,
    memory: M,
    in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome>>,
}

impl<P, H, M> ControllerDriver<P, H, M>
where
    P: SearchProvider + 'static,
    H: HistorySink,
    M: SectionMemory,
{
    /// Mount a controller and start its initial fetch
    pub fn mount(
        catalog: PageCatalog,
        url_query: &str,
        settings: ControllerSettings,
        provider: Arc<P>,
        history: H,
        memory: M,
    ) -> Result<Self> {
        let remembered = memory.load(&catalog.page);
        let (controller, commands) =
            SearchController::mount(catalog, url_query, remembered.as_deref(), settings)?;

        let mut driver = Self {
            controller,
            provider,
            history,
            memory,
            in_flight: FuturesUnordered::new(),
        };
        driver.execute(commands);
        Ok(driver)
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.controller.snapshot()
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Fetch(request) => {
                    let provider = Arc::clone(&self.provider);
                    self.in_flight.push(
                        async move {
                            let result = provider.fetch_page(&request.query).await;
                            (request, result)
                        }
                        .boxed(),
                    );
                }
                Command::ReplaceUrl(query) => self.history.replace(&query),
                Command::RememberSection { page, section } => self.memory.store(&page, &section),
            }
        }
    }

    /// Apply one UI event at the current (tokio) instant
    pub fn dispatch(&mut self, event: UiEvent) -> Result<()> {
        let now = Instant::now().into_std();
        let controller = &mut self.controller;
        let commands = match event {
            UiEvent::FieldFocused(field) => {
                controller.on_field_focused(&field)?;
                Vec::new()
            }
            UiEvent::FieldEdited { field, value } => {
                controller.on_field_edited(&field, &value, now)?
            }
            UiEvent::FieldBlurred(field) => controller.on_field_blurred(&field)?,
            UiEvent::FieldSubmitted(field) => controller.on_field_submitted(&field)?,
            UiEvent::FreshRequested => controller.on_fresh_requested(),
            UiEvent::FiltersCleared => controller.on_filters_cleared(),
            UiEvent::LoadMoreRequested => controller.on_load_more_requested(),
            UiEvent::Scrolled(observation) => controller.on_scroll(observation, now),
            UiEvent::SectionChanged(section) => controller.on_section_changed(&section)?,
            UiEvent::UrlChanged(query) => controller.on_url_changed(&query),
            UiEvent::Retry => controller.retry(),
            UiEvent::Teardown => {
                controller.teardown();
                Vec::new()
            }
        };
        self.execute(commands);
        Ok(())
    }

    fn complete(&mut self, outcome: FetchOutcome) -> ResponseOutcome {
        let (request, result) = outcome;
        let (outcome, commands) = self.controller.on_response(&request, result);
        self.execute(commands);
        outcome
    }

    fn deadline_elapsed(&mut self) {
        let commands = self.controller.tick(Instant::now().into_std());
        self.execute(commands);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_deadline().map(Instant::from_std)
    }

    /// Drive fetches and debounce timers until neither is pending
    pub async fn settle(&mut self) {
        loop {
            let deadline = self.next_deadline();
            if self.in_flight.is_empty() && deadline.is_none() {
                return;
            }
            tokio::select! {
                Some(outcome) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(outcome);
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() => {
                    self.deadline_elapsed();
                }
                else => return,
            }
        }
    }

    /// Run until teardown or until the event channel closes.
    ///
    /// A snapshot is published after every event, response and timer.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<UiEvent>,
        snapshots: watch::Sender<ViewSnapshot>,
    ) -> Self {
        snapshots.send_replace(self.controller.snapshot());

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(UiEvent::Teardown) | None => {
                        self.controller.teardown();
                        snapshots.send_replace(self.controller.snapshot());
                        break;
                    }
                    Some(event) => {
                        if let Err(e) = self.dispatch(event) {
                            tracing::warn!(error = %e, "rejected UI event");
                        }
                    }
                },
                Some(outcome) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(outcome);
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() => {
                    self.deadline_elapsed();
                }
            }
            snapshots.send_replace(self.controller.snapshot());
        }

        self
    }
}
