#![allow(dead_code)]

use std::collections::VecDeque;
use std::process::{Command, Output};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use lexscroll::controller::fetch::FetchRequest;
use lexscroll::{ApiQuery, FetchError, ResponseEnvelope, SearchProvider};

/// Helper struct to run lexscroll commands with an isolated config file
pub struct LexTest {
    pub temp_dir: TempDir,
}

impl LexTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        LexTest { temp_dir }
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn write_config(&self, yaml: &str) {
        std::fs::write(self.config_path(), yaml).expect("Failed to write config");
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let config = self.config_path();
        Command::new(env!("CARGO_BIN_EXE_lexscroll"))
            .arg("--config")
            .arg(&config)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("LEXSCROLL_API_URL")
            .env_remove("LEXSCROLL_API_TOKEN")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute lexscroll command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

// ============================================================================
// Response fixtures
// ============================================================================

fn items(ids: impl IntoIterator<Item = u64>) -> Vec<Value> {
    ids.into_iter()
        .map(|id| json!({"id": id, "title": format!("Item {id}")}))
        .collect()
}

/// Offset page with ids `start..start + count`
pub fn offset_page(start: u64, count: u64, has_more: Option<bool>) -> ResponseEnvelope {
    let mut body = json!({ "data": items(start..start + count) });
    if let Some(flag) = has_more {
        body["pagination_info"] = json!({"has_more": flag, "total_count": 100});
    }
    serde_json::from_value(body).expect("valid envelope")
}

/// Cursor page with ids `start..start + count` and an optional `next_cursor`
pub fn cursor_page(
    start: u64,
    count: u64,
    next_cursor: Option<Value>,
    has_more: bool,
) -> ResponseEnvelope {
    let mut body = json!({
        "data": items(start..start + count),
        "pagination_info": {"has_more": has_more},
    });
    if let Some(next) = next_cursor {
        body["next_cursor"] = next;
    }
    serde_json::from_value(body).expect("valid envelope")
}

/// Ids of the items, in list order
pub fn ids(items: &[lexscroll::Item]) -> Vec<String> {
    items.iter().filter_map(|i| i.id()).collect()
}

/// Fetch requests among a batch of commands
pub fn fetches(commands: &[lexscroll::Command]) -> Vec<FetchRequest> {
    commands
        .iter()
        .filter_map(|c| match c {
            lexscroll::Command::Fetch(r) => Some(r.clone()),
            _ => None,
        })
        .collect()
}

/// The single fetch among a batch of commands
pub fn only_fetch(commands: &[lexscroll::Command]) -> FetchRequest {
    let mut all = fetches(commands);
    assert_eq!(all.len(), 1, "expected exactly one fetch in {commands:?}");
    all.remove(0)
}

/// URL replacements among a batch of commands
pub fn url_replacements(commands: &[lexscroll::Command]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|c| match c {
            lexscroll::Command::ReplaceUrl(q) => Some(q.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Scripted provider
// ============================================================================

pub struct Scripted {
    /// Only answer queries carrying this parameter value
    pub matcher: Option<(String, String)>,
    pub delay: Duration,
    pub result: Result<ResponseEnvelope, FetchError>,
}

impl Scripted {
    fn matches(&self, query: &ApiQuery) -> bool {
        match &self.matcher {
            Some((key, value)) => query.param(key) == Some(value.as_str()),
            None => true,
        }
    }
}

/// Provider answering each call with the first matching script entry, after
/// the entry's delay.
///
/// Calls nothing matches get an empty final page immediately.
#[derive(Default)]
pub struct ScriptedProvider {
    calls: Mutex<Vec<ApiQuery>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, delay_ms: u64, result: Result<ResponseEnvelope, FetchError>) -> Self {
        self.script.lock().unwrap().push_back(Scripted {
            matcher: None,
            delay: Duration::from_millis(delay_ms),
            result,
        });
        self
    }

    /// Answer the first query with `key=value`
    pub fn respond_to(
        self,
        key: &str,
        value: &str,
        delay_ms: u64,
        result: Result<ResponseEnvelope, FetchError>,
    ) -> Self {
        self.script.lock().unwrap().push_back(Scripted {
            matcher: Some((key.to_string(), value.to_string())),
            delay: Duration::from_millis(delay_ms),
            result,
        });
        self
    }

    pub fn calls(&self) -> Vec<ApiQuery> {
        self.calls.lock().unwrap().clone()
    }
}

impl SearchProvider for ScriptedProvider {
    async fn fetch_page(&self, query: &ApiQuery) -> Result<ResponseEnvelope, FetchError> {
        self.calls.lock().unwrap().push(query.clone());
        let next = {
            let mut script = self.script.lock().unwrap();
            let position = script.iter().position(|entry| entry.matches(query));
            position.and_then(|i| script.remove(i))
        };
        let (delay, result) = match next {
            Some(entry) => (entry.delay, entry.result),
            None => (Duration::ZERO, Ok(offset_page(0, 0, Some(false)))),
        };
        tokio::time::sleep(delay).await;
        result
    }
}
