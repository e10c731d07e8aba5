//! Per-field in-progress text and debounce timers.
//!
//! Timers are deadlines rather than spawned tasks: the owner passes the
//! current instant in and asks which deadlines have expired. Each field has
//! at most one pending deadline; a new keystroke replaces it.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
struct FieldEdit {
    value: String,
    focused: bool,
    deadline: Option<Instant>,
}

/// Local edit values that have not necessarily been committed yet
#[derive(Debug, Clone)]
pub struct LocalEditBuffer {
    delay: Duration,
    fields: BTreeMap<String, FieldEdit>,
}

impl LocalEditBuffer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fields: BTreeMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Local value of a field, committed or not
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|f| f.value.as_str())
    }

    /// Whether the field has focus (is being edited)
    pub fn is_editing(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|f| f.focused)
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|f| f.deadline.is_some())
    }

    pub fn has_pending(&self) -> bool {
        self.fields.values().any(|f| f.deadline.is_some())
    }

    /// Mark a field as being edited
    pub fn focus(&mut self, field: &str) {
        self.fields.entry(field.to_string()).or_default().focused = true;
    }

    /// Record a keystroke and restart the field's timer
    pub fn edit(&mut self, field: &str, value: &str, now: Instant) {
        let entry = self.fields.entry(field.to_string()).or_default();
        entry.value = value.to_string();
        entry.deadline = Some(now + self.delay);
    }

    /// Cancel the field's timer and hand back its value for a synchronous commit.
    pub fn flush(&mut self, field: &str) -> Option<String> {
        let entry = self.fields.get_mut(field)?;
        entry.deadline = None;
        Some(entry.value.clone())
    }

    /// Unmark the field and flush it
    pub fn blur(&mut self, field: &str) -> Option<String> {
        if let Some(entry) = self.fields.get_mut(field) {
            entry.focused = false;
        }
        self.flush(field)
    }

    /// Flush every pending timer, in field-name order
    pub fn flush_all(&mut self) -> Vec<(String, String)> {
        self.fields
            .iter_mut()
            .filter(|(_, f)| f.deadline.is_some())
            .map(|(name, f)| {
                f.deadline = None;
                (name.clone(), f.value.clone())
            })
            .collect()
    }

    /// Remove and return every edit whose timer expired at or before `now`
    pub fn due(&mut self, now: Instant) -> Vec<(String, String)> {
        self.fields
            .iter_mut()
            .filter(|(_, f)| f.deadline.is_some_and(|d| d <= now))
            .map(|(name, f)| {
                f.deadline = None;
                (name.clone(), f.value.clone())
            })
            .collect()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.fields.values().filter_map(|f| f.deadline).min()
    }

    /// Overwrite a field from committed state.
    ///
    /// Skipped while the field is focused or has a pending timer, so an
    /// external reset never clobbers text the user is typing.
    pub fn sync_external(&mut self, field: &str, value: &str) -> bool {
        let entry = self.fields.entry(field.to_string()).or_default();
        if entry.focused || entry.deadline.is_some() {
            return false;
        }
        entry.value = value.to_string();
        true
    }

    /// Local values of focused fields
    pub fn editing_values(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|(_, f)| f.focused)
            .map(|(name, f)| (name.clone(), f.value.clone()))
            .collect()
    }
}
