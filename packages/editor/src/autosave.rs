//! # Autosave
//!
//! A best-effort write-ahead cache of the in-progress document, keyed per
//! editor session so two tabs never clobber each other's drafts.
//!
//! The scheduler is driven by host-supplied monotonic milliseconds: each
//! poll that sees a new document revision restarts the debounce window, and
//! the cache is written once the window passes with no further change.
//! Cache write failures are swallowed; the cache is a convenience, not the
//! system of record.

use crate::errors::EditorError;
use crate::persistence::SavedDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value cache supplied by the host (e.g. browser local storage)
pub trait AutosaveCache {
    fn read(&self, key: &str) -> Option<String>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), EditorError>;

    fn remove(&mut self, key: &str);
}

/// In-memory cache with an optional byte quota
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that refuses writes once stored values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AutosaveCache for MemoryCache {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
        if let Some(quota) = self.quota {
            let used: usize = self
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if used + value.len() > quota {
                return Err(EditorError::Store(format!(
                    "autosave quota of {} bytes exceeded",
                    quota
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// What gets written to the autosave cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveEntry {
    pub session_id: String,
    pub saved_at_ms: u64,
    pub document: SavedDocument,
}

/// Debounce timer for autosave writes
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    debounce_ms: u64,
    /// Last document revision the scheduler has seen
    seen_revision: u64,
    /// Revision last written to the cache
    written_revision: u64,
    deadline: Option<u64>,
}

impl AutosaveScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            seen_revision: 0,
            written_revision: 0,
            deadline: None,
        }
    }

    /// Whether a write is due at `now_ms` for the given revision
    pub fn poll(&mut self, revision: u64, now_ms: u64) -> bool {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.deadline = Some(now_ms.saturating_add(self.debounce_ms));
            return false;
        }
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether there is anything unwritten, regardless of the debounce window
    pub fn has_pending(&self, revision: u64) -> bool {
        revision != self.written_revision
    }

    pub fn mark_written(&mut self, revision: u64) {
        self.seen_revision = revision;
        self.written_revision = revision;
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }
}
