use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// How many characters of content a listing snippet carries.
pub const SNIPPET_LEN: usize = 100;

/// A single named memory as persisted on disk.
///
/// Timestamps are `Option` only to tolerate legacy or partially written
/// records on read; every write produces both. `chars` counts characters,
/// not bytes, so multi-byte content sizes match what a user sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub key: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub lines: usize,
    #[serde(default)]
    pub chars: usize,
}

impl Memory {
    pub fn new(key: String, title: String, content: String, tags: Vec<String>) -> Self {
        let now = Local::now();
        let lines = content.lines().count();
        let chars = content.chars().count();
        Self {
            key,
            title,
            content,
            tags,
            created_at: Some(now),
            updated_at: Some(now),
            lines,
            chars,
        }
    }

    /// Recompute the derived size fields after a content change.
    pub fn recount(&mut self) {
        self.lines = self.content.lines().count();
        self.chars = self.content.chars().count();
    }

    /// First `SNIPPET_LEN` characters of content, with a truncation marker.
    ///
    /// Counts from the content itself, not the cached `chars` field, which
    /// is absent (and defaults to 0) on legacy records.
    pub fn snippet(&self) -> String {
        if self.content.chars().count() > SNIPPET_LEN {
            let head: String = self.content.chars().take(SNIPPET_LEN).collect();
            format!("{}...", head)
        } else {
            self.content.clone()
        }
    }
}

/// A memory as returned by `list`/`search`: the record plus a display snippet.
#[derive(Debug, Clone, Serialize)]
pub struct ListedMemory {
    #[serde(flatten)]
    pub memory: Memory,
    pub snippet: String,
}
