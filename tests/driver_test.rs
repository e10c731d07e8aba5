#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, watch};

use common::{ScriptedProvider, cursor_page, ids, offset_page};
use lexscroll::FetchError;
use lexscroll::controller::fetch::FetchMode;
use lexscroll::controller::scroll::ScrollObservation;
use lexscroll::controller::{
    ControllerDriver, ControllerSettings, MemoryHistory, MemorySectionMemory, SectionMemory,
    UiEvent, ViewSnapshot, builtin,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn edit(field: &str, value: &str) -> UiEvent {
    UiEvent::FieldEdited {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn mount(
    page: &str,
    query: &str,
    provider: &Arc<ScriptedProvider>,
) -> ControllerDriver<ScriptedProvider> {
    ControllerDriver::mount(
        builtin(page).unwrap(),
        query,
        ControllerSettings::default(),
        Arc::clone(provider),
        MemoryHistory::new(),
        MemorySectionMemory::new(),
    )
    .unwrap()
}

// ============================================================================
// Event loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_typing_burst_sends_one_request() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .respond(10, Ok(cursor_page(0, 5, None, false)))
            .respond_to("search", "murder", 10, Ok(cursor_page(40, 2, None, false))),
    );
    let driver = mount("judgments", "court=supreme", &provider);

    let (events, rx) = mpsc::channel(16);
    let (snapshots, snapshot_rx) = watch::channel(ViewSnapshot::empty("judgments"));
    let handle = tokio::spawn(driver.run(rx, snapshots));

    events.send(edit("search", "mur")).await.unwrap();
    tokio::time::sleep(ms(120)).await;
    events.send(edit("search", "murd")).await.unwrap();
    tokio::time::sleep(ms(120)).await;
    events.send(edit("search", "murder")).await.unwrap();
    tokio::time::sleep(ms(1000)).await;

    assert_eq!(ids(&snapshot_rx.borrow().items), vec!["40", "41"]);

    events.send(UiEvent::Teardown).await.unwrap();
    let driver = handle.await.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 2, "one initial fetch plus one debounced search");
    assert_eq!(calls[1].param("search"), Some("murder"));
    assert_eq!(driver.history().current(), Some("court=supreme&search=murder"));
}

#[tokio::test(start_paused = true)]
async fn test_closing_the_channel_tears_down() {
    let provider =
        Arc::new(ScriptedProvider::new().respond(0, Ok(offset_page(0, 3, Some(false)))));
    let driver = mount("acts", "category=central", &provider);

    let (events, rx) = mpsc::channel(4);
    let (snapshots, snapshot_rx) = watch::channel(ViewSnapshot::empty("acts"));
    let handle = tokio::spawn(driver.run(rx, snapshots));
    drop(events);

    let driver = handle.await.unwrap();
    assert!(driver.controller().is_torn_down());
    assert_eq!(snapshot_rx.borrow().page, "acts");
}

// ============================================================================
// Races
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_older_fresh_response_is_discarded() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .respond(0, Ok(offset_page(0, 20, Some(true))))
            .respond_to("search", "bail", 300, Ok(offset_page(100, 20, Some(true))))
            .respond_to("search", "bail bond", 50, Ok(offset_page(200, 3, Some(false)))),
    );
    let mut driver = mount("acts", "category=central", &provider);
    driver.settle().await;
    assert_eq!(driver.snapshot().items.len(), 20);

    driver.dispatch(edit("search", "bail")).unwrap();
    driver.dispatch(UiEvent::FieldSubmitted("search".to_string())).unwrap();
    driver.dispatch(edit("search", "bail bond")).unwrap();
    driver.dispatch(UiEvent::FieldSubmitted("search".to_string())).unwrap();
    assert_eq!(driver.in_flight(), 2);

    driver.settle().await;
    let snapshot = driver.snapshot();
    assert_eq!(ids(&snapshot.items), vec!["200", "201", "202"]);
    assert!(!snapshot.is_loading);
    assert!(!snapshot.has_more);
    assert_eq!(provider.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_section_switch_while_fresh_in_flight() {
    let supreme = cursor_page(0, 20, Some(json!({"id": 1, "date": "2020-01-01"})), true);
    let high = cursor_page(500, 4, None, false);
    let provider = Arc::new(
        ScriptedProvider::new()
            .respond_to("court", "supreme", 500, Ok(supreme))
            .respond_to("court", "high", 10, Ok(high)),
    );
    let mut driver = mount("judgments", "court=supreme", &provider);

    driver
        .dispatch(UiEvent::SectionChanged("high".to_string()))
        .unwrap();
    driver.settle().await;

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.section, "high");
    assert_eq!(ids(&snapshot.items), vec!["500", "501", "502", "503"]);
    assert_eq!(driver.history().current(), Some("court=high"));
    assert_eq!(driver.memory().load("judgments").as_deref(), Some("high"));
}

#[tokio::test(start_paused = true)]
async fn test_visible_sentinel_keeps_loading_short_pages() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .respond(20, Ok(offset_page(0, 3, Some(true))))
            .respond(20, Ok(offset_page(3, 3, Some(true))))
            .respond(20, Ok(offset_page(6, 3, Some(false)))),
    );
    let mut driver = mount("acts", "category=central", &provider);

    driver
        .dispatch(UiEvent::Scrolled(ScrollObservation::Sentinel { visible: true }))
        .unwrap();
    driver.settle().await;

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.items.len(), 9);
    assert!(!snapshot.has_more);
    let calls = provider.calls();
    let offsets: Vec<_> = calls.iter().map(|call| call.param("offset")).collect();
    assert_eq!(offsets, vec![Some("0"), Some("3"), Some("6")]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_load_more_failure_then_retry() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .respond(5, Ok(offset_page(0, 20, Some(true))))
            .respond(5, Err(FetchError::network("connection reset")))
            .respond(5, Ok(offset_page(20, 5, Some(false)))),
    );
    let mut driver = mount("acts", "category=central", &provider);
    driver.settle().await;

    driver.dispatch(UiEvent::LoadMoreRequested).unwrap();
    driver.settle().await;
    let snapshot = driver.snapshot();
    assert_eq!(snapshot.items.len(), 20);
    assert_eq!(snapshot.error.as_ref().unwrap().scope, FetchMode::LoadMore);

    driver.dispatch(UiEvent::Retry).unwrap();
    driver.settle().await;
    let snapshot = driver.snapshot();
    assert_eq!(snapshot.items.len(), 25);
    assert!(snapshot.error.is_none());

    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1], calls[2]);
    assert_eq!(calls[2].param("offset"), Some("20"));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_event_does_not_stop_the_loop() {
    let provider = Arc::new(ScriptedProvider::new());
    let driver = mount("acts", "category=central", &provider);

    let (events, rx) = mpsc::channel(8);
    let (snapshots, snapshot_rx) = watch::channel(ViewSnapshot::empty("acts"));
    let handle = tokio::spawn(driver.run(rx, snapshots));

    events.send(edit("no_such_field", "x")).await.unwrap();
    events.send(edit("sort", "title")).await.unwrap();
    tokio::time::sleep(ms(50)).await;
    assert_eq!(
        snapshot_rx.borrow().filters.get_str("sort").as_deref(),
        Some("title")
    );

    events.send(UiEvent::Teardown).await.unwrap();
    handle.await.unwrap();
}

// ============================================================================
// Mount and teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_remembered_section_is_restored() {
    let provider = Arc::new(ScriptedProvider::new());
    let mut memory = MemorySectionMemory::new();
    memory.store("judgments", "district");

    let mut driver = ControllerDriver::mount(
        builtin("judgments").unwrap(),
        "",
        ControllerSettings::default(),
        Arc::clone(&provider),
        MemoryHistory::new(),
        memory,
    )
    .unwrap();
    driver.settle().await;

    assert_eq!(driver.controller().section().id, "district");
    assert_eq!(driver.history().current(), Some("court=district"));
    assert_eq!(provider.calls()[0].param("court"), Some("district"));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_discards_late_load_more() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .respond(0, Ok(offset_page(0, 20, Some(true))))
            .respond(400, Ok(offset_page(20, 20, Some(true)))),
    );
    let mut driver = mount("acts", "category=central", &provider);
    driver.settle().await;

    driver.dispatch(UiEvent::LoadMoreRequested).unwrap();
    driver.dispatch(UiEvent::Teardown).unwrap();
    driver.settle().await;

    assert_eq!(driver.snapshot().items.len(), 20);
    assert_eq!(provider.calls().len(), 2);
    assert!(!driver.snapshot().is_loading_more);
}
