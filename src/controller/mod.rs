//! Incremental search and pagination controller.
//!
//! [`SearchController`] is a clock-injected state machine: every transition
//! takes the current instant where timing matters and returns the side
//! effects it wants performed as [`Command`]s. It owns the committed filters,
//! the local edit buffer, the pagination cursor, the fetch coordinator, the
//! scroll trigger and the result list, and nothing else mutates them.
//!
//! [`driver::ControllerDriver`] runs a controller on tokio against a
//! [`SearchProvider`](crate::remote::SearchProvider).

pub mod catalog;
pub mod driver;
pub mod edit_buffer;
pub mod fetch;
pub mod filter;
pub mod model;
pub mod pagination;
pub mod results;
pub mod scroll;
pub mod url;

use std::time::Instant;

use crate::error::Result;
use crate::remote::{ApiQuery, FetchError, ResponseEnvelope};

use self::catalog::{PageCatalog, SectionSchema};
use self::edit_buffer::LocalEditBuffer;
use self::fetch::{FetchCoordinator, FetchMode, FetchRequest, RequestParts, Resolution};
use self::filter::{FilterSet, FilterStore};
use self::pagination::{PageRequest, PaginationCursor};
use self::results::ResultAccumulator;
use self::scroll::{InfiniteScrollTrigger, ScrollObservation};
use self::url::{UrlState, canonical_query, normalize};

pub use catalog::{BUILTIN_PAGES, FieldKind, FieldSchema, all_builtin, builtin};
pub use driver::{ControllerDriver, UiEvent};
pub use fetch::{FetchFailure, Generation};
pub use filter::FilterValue;
pub use model::{Command, ControllerSettings, ErrorView, ResponseOutcome, ViewSnapshot};
pub use pagination::{CursorKeys, CursorSpec, PaginationStrategy};
pub use results::SearchMetadata;
pub use url::{HistorySink, MemoryHistory, MemorySectionMemory, SectionMemory};

#[derive(Debug)]
pub struct SearchController {
    catalog: PageCatalog,
    section: SectionSchema,
    store: FilterStore,
    edits: LocalEditBuffer,
    cursor: PaginationCursor,
    coordinator: FetchCoordinator,
    scroll: InfiniteScrollTrigger,
    results: ResultAccumulator,
    settings: ControllerSettings,
    /// Query string currently in the URL bar, as last written or read
    current_url: String,
}

impl SearchController {
    /// Mount on a page.
    ///
    /// The section comes from the URL discriminator if valid, then the
    /// remembered section, then the catalog default. Emits a URL replacement
    /// when the canonical query differs from the incoming one (for example a
    /// missing discriminator) and the initial fresh fetch. Fails only for a
    /// catalog without sections.
    pub fn mount(
        catalog: PageCatalog,
        url_query: &str,
        remembered: Option<&str>,
        settings: ControllerSettings,
    ) -> Result<(Self, Vec<Command>)> {
        let url = UrlState::parse(url_query);
        let section = Self::pick_section(&catalog, &url, remembered)?.clone();
        let store = FilterStore::initialize(&url, &catalog, &section);

        let mut controller = Self {
            cursor: PaginationCursor::new(section.pagination.clone(), settings.page_size),
            edits: LocalEditBuffer::new(settings.debounce),
            coordinator: FetchCoordinator::new(),
            scroll: InfiniteScrollTrigger::new(
                settings.scroll_throttle,
                settings.scroll_threshold_px,
            ),
            results: ResultAccumulator::new(settings.dedupe),
            current_url: normalize(url_query),
            catalog,
            section,
            store,
            settings,
        };
        controller.sync_local_values();

        tracing::info!(
            page = %controller.catalog.page,
            section = %controller.section.id,
            "mounted"
        );

        let mut commands = Vec::new();
        controller.sync_url(&mut commands);
        controller.start_fresh(&mut commands);
        Ok((controller, commands))
    }

    fn pick_section<'a>(
        catalog: &'a PageCatalog,
        url: &UrlState,
        remembered: Option<&str>,
    ) -> Result<&'a SectionSchema> {
        if let Some(id) = url.get(&catalog.discriminator) {
            match catalog.section(id) {
                Some(section) => return Ok(section),
                None => tracing::debug!(section = %id, "ignoring unknown section in URL"),
            }
        }
        match remembered.and_then(|id| catalog.section(id)) {
            Some(section) => Ok(section),
            None => catalog.default_section(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn catalog(&self) -> &PageCatalog {
        &self.catalog
    }

    pub fn section(&self) -> &SectionSchema {
        &self.section
    }

    pub fn filters(&self) -> &FilterSet {
        self.store.filters()
    }

    pub fn edits(&self) -> &LocalEditBuffer {
        &self.edits
    }

    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    pub fn results(&self) -> &ResultAccumulator {
        &self.results
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        self.coordinator.failure()
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    pub fn is_loading_more(&self) -> bool {
        self.coordinator.is_loading_more()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn is_torn_down(&self) -> bool {
        self.coordinator.is_closed()
    }

    /// Earliest pending deadline: a debounce timer or a throttled scroll
    /// evaluation
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.edits.next_deadline(), self.scroll.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            page: self.catalog.page.clone(),
            section: self.section.id.clone(),
            filters: self.store.filters().clone(),
            edits: self.edits.editing_values(),
            items: self.results.items().to_vec(),
            metadata: self.results.metadata().cloned(),
            is_loading: self.coordinator.is_loading(),
            is_loading_more: self.coordinator.is_loading_more(),
            has_more: self.cursor.has_more(),
            total_count: self.cursor.total_count(),
            error: self.coordinator.failure().map(|f| ErrorView {
                scope: f.scope,
                kind: f.error.kind,
                message: f.error.message.clone(),
                retryable: true,
            }),
            generation: self.coordinator.generation(),
        }
    }

    // ------------------------------------------------------------------
    // Field edits
    // ------------------------------------------------------------------

    pub fn on_field_focused(&mut self, field: &str) -> Result<()> {
        self.section.require_field(field)?;
        self.edits.focus(field);
        Ok(())
    }

    /// A keystroke or selection.
    ///
    /// Typed fields restart their debounce timer. Choice fields commit at
    /// once and fail on an unknown option.
    pub fn on_field_edited(
        &mut self,
        field: &str,
        value: &str,
        now: Instant,
    ) -> Result<Vec<Command>> {
        let debounced = self.section.require_field(field)?.is_debounced();
        self.edits.edit(field, value, now);
        if debounced {
            return Ok(Vec::new());
        }

        self.edits.flush(field);
        let changed = self.store.commit(&self.section, field, value)?;
        Ok(self.after_commit(changed))
    }

    /// Focus left the field: a pending edit commits now
    pub fn on_field_blurred(&mut self, field: &str) -> Result<Vec<Command>> {
        self.section.require_field(field)?;
        let pending = self.edits.is_pending(field);
        let value = self.edits.blur(field);

        let changed = match value {
            Some(raw) if pending => self.store.commit(&self.section, field, &raw)?,
            _ => false,
        };
        self.sync_local_value(field);
        Ok(self.after_commit(changed))
    }

    /// Enter pressed in the field: commit it and search, even if nothing changed
    pub fn on_field_submitted(&mut self, field: &str) -> Result<Vec<Command>> {
        self.section.require_field(field)?;
        if let Some(raw) = self.edits.flush(field) {
            self.store.commit(&self.section, field, &raw)?;
        }

        let mut commands = Vec::new();
        self.sync_url(&mut commands);
        self.start_fresh(&mut commands);
        Ok(commands)
    }

    /// Commit every edit whose debounce deadline has passed, then run a due
    /// trailing scroll evaluation.
    ///
    /// Values that fail validation stay local and are not committed.
    pub fn tick(&mut self, now: Instant) -> Vec<Command> {
        let due = self.edits.due(now);
        let mut commands = if due.is_empty() {
            Vec::new()
        } else {
            let changed = self.commit_lenient(due);
            self.after_commit(changed)
        };
        if self.scroll.fire_due(now) {
            commands.extend(self.load_more_near_end());
        }
        commands
    }

    fn commit_lenient(&mut self, values: Vec<(String, String)>) -> bool {
        let mut changed = false;
        for (field, raw) in values {
            match self.store.commit(&self.section, &field, &raw) {
                Ok(c) => changed |= c,
                Err(e) => tracing::warn!(error = %e, "not committing edit"),
            }
        }
        changed
    }

    fn after_commit(&mut self, changed: bool) -> Vec<Command> {
        let mut commands = Vec::new();
        if changed {
            self.sync_url(&mut commands);
            self.start_fresh(&mut commands);
        }
        commands
    }

    // ------------------------------------------------------------------
    // Fetch triggers
    // ------------------------------------------------------------------

    /// Explicit search: flush pending edits and fetch fresh
    pub fn on_fresh_requested(&mut self) -> Vec<Command> {
        let pending = self.edits.flush_all();
        self.commit_lenient(pending);

        let mut commands = Vec::new();
        self.sync_url(&mut commands);
        self.start_fresh(&mut commands);
        commands
    }

    /// Reset filters to the section defaults.
    ///
    /// Fields being edited keep their local value; a pending edit still
    /// commits when its timer fires.
    pub fn on_filters_cleared(&mut self) -> Vec<Command> {
        let defaults = self.section.default_filters();
        if &defaults == self.store.filters() {
            return Vec::new();
        }
        self.store.replace(defaults);
        self.sync_local_values();
        self.after_commit(true)
    }

    /// Load the next page if more exist and nothing blocks it
    pub fn on_load_more_requested(&mut self) -> Vec<Command> {
        if !self.cursor.has_more() || (self.results.is_empty() && self.cursor.is_initial()) {
            return Vec::new();
        }
        let parts = self.request_parts(self.cursor.request());
        self.coordinator
            .issue_load_more(parts)
            .map(Command::Fetch)
            .into_iter()
            .collect()
    }

    pub fn on_scroll(&mut self, observation: ScrollObservation, now: Instant) -> Vec<Command> {
        if self.scroll.observe(observation, now) {
            self.load_more_near_end()
        } else {
            Vec::new()
        }
    }

    /// Load more because the end of the list is in reach
    fn load_more_near_end(&mut self) -> Vec<Command> {
        let commands = self.on_load_more_requested();
        if !commands.is_empty() {
            self.scroll.forget_position();
        }
        commands
    }

    /// Re-issue the failed request, if any
    pub fn retry(&mut self) -> Vec<Command> {
        self.coordinator
            .retry()
            .map(Command::Fetch)
            .into_iter()
            .collect()
    }

    fn request_parts(&self, page: PageRequest) -> RequestParts {
        let filters = self.store.filters().clone();
        let mut query = ApiQuery::new(self.section.endpoint.clone());
        query.push(self.catalog.discriminator.clone(), self.section.id.clone());
        for (key, value) in filters.ordered_pairs(&self.section) {
            query.push(key, value);
        }
        if filters.has_text_search(&self.section) {
            query.push("highlight", "true");
        }
        page.encode(&mut query);

        RequestParts {
            section: self.section.id.clone(),
            filters,
            page,
            query,
        }
    }

    fn start_fresh(&mut self, commands: &mut Vec<Command>) {
        self.cursor.reset();
        // the list is about to be replaced; scroll geometry no longer applies
        self.scroll.forget_position();
        let parts = self.request_parts(self.cursor.request());
        if let Some(request) = self.coordinator.issue_fresh(parts) {
            commands.push(Command::Fetch(request));
        }
    }

    // ------------------------------------------------------------------
    // Sections and URL
    // ------------------------------------------------------------------

    /// Switch to another section.
    ///
    /// Shared fields with a non-empty value that is valid in the new section
    /// are carried over; everything else starts from the new defaults.
    /// Pagination and results reset in the same step.
    pub fn on_section_changed(&mut self, section_id: &str) -> Result<Vec<Command>> {
        let next = self.catalog.require_section(section_id)?.clone();
        if next.id == self.section.id {
            return Ok(Vec::new());
        }

        let pending = self.edits.flush_all();
        self.commit_lenient(pending);

        let mut filters = next.default_filters();
        for (name, value) in self.store.filters().iter() {
            let Some(field) = next.field(name) else {
                continue;
            };
            match field.parse(&value.to_string()) {
                Ok(Some(parsed)) => filters.insert(name, parsed),
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "not carrying filter into new section"),
            }
        }

        tracing::info!(from = %self.section.id, to = %next.id, "switching section");
        let mut commands = Vec::new();
        self.enter_section(next, filters);
        self.sync_url(&mut commands);
        commands.push(Command::RememberSection {
            page: self.catalog.page.clone(),
            section: self.section.id.clone(),
        });
        self.start_fresh(&mut commands);
        Ok(commands)
    }

    fn enter_section(&mut self, section: SectionSchema, filters: FilterSet) {
        self.cursor = PaginationCursor::new(section.pagination.clone(), self.settings.page_size);
        self.results.clear();
        self.section = section;
        self.store.replace(filters);
        self.sync_local_values();
    }

    /// The URL changed outside the controller (back/forward, manual edit).
    ///
    /// A valid different discriminator switches section with the URL's
    /// filters. An invalid or missing one keeps the current section and puts
    /// it back in the URL.
    pub fn on_url_changed(&mut self, query: &str) -> Vec<Command> {
        if self.is_torn_down() {
            return Vec::new();
        }
        let url = UrlState::parse(query);
        self.current_url = normalize(query);
        // pending edits belong to the state being navigated away from
        self.edits.flush_all();

        let mut commands = Vec::new();
        let target = url
            .get(&self.catalog.discriminator)
            .and_then(|id| self.catalog.section(id))
            .filter(|s| s.id != self.section.id)
            .cloned();

        if let Some(next) = target {
            let store = FilterStore::initialize(&url, &self.catalog, &next);
            self.store.set_extra_params(store.extra_params().to_vec());
            tracing::info!(from = %self.section.id, to = %next.id, "section changed by URL");
            self.enter_section(next, store.filters().clone());
            self.sync_url(&mut commands);
            commands.push(Command::RememberSection {
                page: self.catalog.page.clone(),
                section: self.section.id.clone(),
            });
            self.start_fresh(&mut commands);
            return commands;
        }

        let store = FilterStore::initialize(&url, &self.catalog, &self.section);
        self.store.set_extra_params(store.extra_params().to_vec());
        let changed = store.filters() != self.store.filters();
        if changed {
            self.store.replace(store.filters().clone());
            self.sync_local_values();
        }
        self.sync_url(&mut commands);
        if changed {
            self.start_fresh(&mut commands);
        }
        commands
    }

    fn sync_url(&mut self, commands: &mut Vec<Command>) {
        let canonical = canonical_query(
            &self.catalog,
            &self.section,
            self.store.filters(),
            self.store.extra_params(),
        );
        if canonical != self.current_url {
            self.current_url = canonical.clone();
            commands.push(Command::ReplaceUrl(canonical));
        }
    }

    fn sync_local_value(&mut self, field: &str) {
        let committed = self.store.filters().get_str(field).unwrap_or_default();
        self.edits.sync_external(field, &committed);
    }

    fn sync_local_values(&mut self) {
        let names: Vec<String> = self.section.fields.iter().map(|f| f.name.clone()).collect();
        for name in names {
            self.sync_local_value(&name);
        }
    }

    // ------------------------------------------------------------------
    // Responses
    // ------------------------------------------------------------------

    /// Feed back the outcome of a `Command::Fetch`.
    ///
    /// Stale outcomes change nothing. A fresh failure clears the list; a
    /// load-more failure keeps every item already shown. After an applied
    /// page the scroll state is checked again, so an end-of-list signal that
    /// arrived while the request was in flight still loads the next page;
    /// the returned commands carry that load-more.
    pub fn on_response(
        &mut self,
        request: &FetchRequest,
        result: std::result::Result<ResponseEnvelope, FetchError>,
    ) -> (ResponseOutcome, Vec<Command>) {
        if self.coordinator.resolve(request) == Resolution::Stale {
            tracing::debug!(
                id = request.id,
                generation = %request.generation,
                mode = %request.mode,
                "discarding stale response"
            );
            return (ResponseOutcome::Stale, Vec::new());
        }

        let applied = result.and_then(|envelope| {
            self.cursor.advance(&request.page, &envelope, request.mode)?;
            Ok(envelope)
        });

        match applied {
            Ok(envelope) => {
                match request.mode {
                    FetchMode::Fresh => self
                        .results
                        .fresh(envelope.data, envelope.search_info.map(Into::into)),
                    FetchMode::LoadMore => {
                        self.results.append(envelope.data);
                    }
                }
                let commands = if self.scroll.is_near_end() {
                    tracing::debug!("end of list still in reach after response");
                    self.load_more_near_end()
                } else {
                    Vec::new()
                };
                (ResponseOutcome::Applied, commands)
            }
            Err(error) => {
                tracing::warn!(mode = %request.mode, error = %error, "fetch failed");
                let kind = error.kind;
                if request.mode == FetchMode::Fresh {
                    self.results.clear();
                    self.cursor.reset();
                }
                self.coordinator.fail(request.clone(), error);
                (ResponseOutcome::Failed(kind), Vec::new())
            }
        }
    }

    /// Leave the view: stop scroll observation, drop pending edits, ignore
    /// every response still on the wire.
    pub fn teardown(&mut self) {
        self.scroll.stop();
        self.edits.flush_all();
        self.coordinator.close();
        tracing::debug!(page = %self.catalog.page, "torn down");
    }
}
