//! # Record Store
//!
//! One JSON file per memory, in a single flat directory. The file name is the
//! SHA-256 of the key, so keys can be arbitrary Unicode of any length while
//! file names stay fixed-width and filesystem-safe. The key itself is stored
//! inside the record; the mapping never needs to be reversed.
//!
//! The store is stateless between calls: every operation is a self-contained
//! pass over one slot file (or, for `list`/`search`, all of them). There is no
//! index to keep in sync and no cache to invalidate.
//!
//! Unreadable or corrupt slot files are treated as absent rather than
//! surfaced: `retrieve` reports not-found, `list` skips them, and `store`
//! falls back to a fresh create. [`ReadOutcome`] keeps the three cases
//! distinguishable internally for diagnostics.
//!
//! Concurrent writers to the same key are last-writer-wins. Each write is
//! atomic (temp file + rename) so readers never observe a partial record, but
//! nothing serializes two interleaved read-modify-write cycles.

use crate::error::{KeepError, Result};
use crate::model::{ListedMemory, Memory};
use chrono::Local;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const SLOT_EXT: &str = "json";

/// What a raw slot read produced. Callers of the public API only ever see
/// `Found` vs not-found; `Corrupt` exists so the collapse is a policy applied
/// in one place rather than an accident of error handling.
#[derive(Debug)]
pub enum ReadOutcome {
    Found(Memory),
    Missing,
    Corrupt,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_count: usize,
    pub total_chars: usize,
    pub storage_path: PathBuf,
}

pub struct MemoryStore {
    root: PathBuf,
}

impl MemoryStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(KeepError::Io)?;
        Ok(Self { root })
    }

    pub fn location(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.{}", hex::encode(digest), SLOT_EXT))
    }

    fn read_slot(&self, path: &Path) -> ReadOutcome {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(e) => {
                log::debug!("unreadable slot {}: {}", path.display(), e);
                return ReadOutcome::Corrupt;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(memory) => ReadOutcome::Found(memory),
            Err(e) => {
                log::debug!("corrupt slot {}: {}", path.display(), e);
                ReadOutcome::Corrupt
            }
        }
    }

    /// Persist the record, replacing the slot contents in one rename so a
    /// concurrent reader never sees a half-written file.
    fn write_slot(&self, path: &Path, memory: &Memory) -> Result<()> {
        let content = serde_json::to_string_pretty(memory).map_err(KeepError::Serialization)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content).map_err(KeepError::Io)?;
        fs::rename(&tmp, path).map_err(KeepError::Io)?;
        Ok(())
    }

    /// Store a new memory or overwrite an existing one.
    ///
    /// An existing record keeps its `created_at`, and keeps its title when no
    /// new one is supplied. A corrupt existing record is treated as absent.
    pub fn store(
        &self,
        key: &str,
        content: &str,
        tags: Vec<String>,
        title: Option<String>,
    ) -> Result<Memory> {
        let path = self.slot_path(key);

        let fallback_title = title.clone().unwrap_or_else(|| key.to_string());
        let mut memory = Memory::new(key.to_string(), fallback_title, content.to_string(), tags);

        if let ReadOutcome::Found(existing) = self.read_slot(&path) {
            memory.created_at = existing.created_at.or(memory.created_at);
            if title.is_none() {
                memory.title = if existing.title.is_empty() {
                    key.to_string()
                } else {
                    existing.title
                };
            }
        }
        memory.updated_at = Some(Local::now());
        memory.recount();

        self.write_slot(&path, &memory)?;
        Ok(memory)
    }

    /// Retrieve a memory by key. Absent and corrupt slots both read as `None`.
    pub fn retrieve(&self, key: &str) -> Result<Option<Memory>> {
        match self.read_slot(&self.slot_path(key)) {
            ReadOutcome::Found(memory) => Ok(Some(memory)),
            ReadOutcome::Missing | ReadOutcome::Corrupt => Ok(None),
        }
    }

    /// List every memory, newest update first, annotated with a snippet.
    ///
    /// Slots that fail to parse are skipped. Records with equal or missing
    /// `updated_at` keep their encounter order; missing timestamps sort last.
    pub fn list(&self) -> Result<Vec<ListedMemory>> {
        let mut memories = Vec::new();

        for entry in fs::read_dir(&self.root).map_err(KeepError::Io)? {
            let entry = entry.map_err(KeepError::Io)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SLOT_EXT) {
                continue;
            }
            if let ReadOutcome::Found(mut memory) = self.read_slot(&path) {
                // Legacy records may predate the title field
                if memory.title.is_empty() {
                    memory.title = memory.key.clone();
                }
                let snippet = memory.snippet();
                memories.push(ListedMemory { memory, snippet });
            }
        }

        memories.sort_by(|a, b| b.memory.updated_at.cmp(&a.memory.updated_at));
        Ok(memories)
    }

    /// Case-insensitive substring search over key, title and content.
    /// List-then-filter, so results share `list`'s ordering.
    pub fn search(&self, query: &str) -> Result<Vec<ListedMemory>> {
        let needle = query.to_lowercase();
        let results = self
            .list()?
            .into_iter()
            .filter(|lm| {
                lm.memory.key.to_lowercase().contains(&needle)
                    || lm.memory.title.to_lowercase().contains(&needle)
                    || lm.memory.content.to_lowercase().contains(&needle)
            })
            .collect();
        Ok(results)
    }

    /// Remove the slot for `key`. Returns whether a deletion occurred;
    /// deleting a missing key is a normal outcome, not an error.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(KeepError::Io(e)),
        }
    }

    /// Read-side aggregate over `list()`; nothing is persisted.
    pub fn stats(&self) -> Result<StoreStats> {
        let memories = self.list()?;
        Ok(StoreStats {
            total_count: memories.len(),
            total_chars: memories.iter().map(|lm| lm.memory.chars).sum(),
            storage_path: self.root.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, MemoryStore) {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(dir.path().join("memories")).unwrap();
        (dir, store)
    }

    #[test]
    fn store_then_retrieve_round_trips() {
        let (_dir, store) = open_store();
        store
            .store(
                "proj",
                "line one\nline two",
                vec!["a".into(), "b".into(), "a".into()],
                Some("Project".into()),
            )
            .unwrap();

        let mem = store.retrieve("proj").unwrap().unwrap();
        assert_eq!(mem.key, "proj");
        assert_eq!(mem.title, "Project");
        assert_eq!(mem.content, "line one\nline two");
        assert_eq!(mem.tags, vec!["a", "b", "a"]);
        assert_eq!(mem.lines, 2);
        assert_eq!(mem.chars, 17);
        assert!(mem.created_at.is_some());
        assert!(mem.updated_at.is_some());
    }

    #[test]
    fn title_defaults_to_key() {
        let (_dir, store) = open_store();
        let mem = store.store("notes", "hello", vec![], None).unwrap();
        assert_eq!(mem.title, "notes");
    }

    #[test]
    fn same_key_targets_same_slot() {
        let (_dir, store) = open_store();
        store.store("k", "first", vec![], None).unwrap();
        store.store("k", "totally different body", vec![], None).unwrap();

        let slot_count = fs::read_dir(store.location()).unwrap().count();
        assert_eq!(slot_count, 1);
        assert_eq!(
            store.retrieve("k").unwrap().unwrap().content,
            "totally different body"
        );
    }

    #[test]
    fn unsafe_keys_map_to_safe_filenames() {
        let (_dir, store) = open_store();
        let key = "path/with:odd*chars? and ünïcode";
        store.store(key, "body", vec![], None).unwrap();
        let mem = store.retrieve(key).unwrap().unwrap();
        assert_eq!(mem.key, key);
    }

    #[test]
    fn created_at_survives_updates() {
        let (_dir, store) = open_store();
        let first = store.store("k", "A", vec![], None).unwrap();
        thread::sleep(Duration::from_millis(10));
        let second = store.store("k", "B", vec![], None).unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.content, "B");
    }

    #[test]
    fn title_carries_forward_when_omitted() {
        let (_dir, store) = open_store();
        store.store("k", "hello", vec![], Some("Title1".into())).unwrap();
        store.store("k", "world", vec![], None).unwrap();

        let mem = store.retrieve("k").unwrap().unwrap();
        assert_eq!(mem.title, "Title1");
        assert_eq!(mem.content, "world");
    }

    #[test]
    fn new_title_replaces_old() {
        let (_dir, store) = open_store();
        store.store("k", "hello", vec![], Some("Title1".into())).unwrap();
        store.store("k", "world", vec![], Some("Title2".into())).unwrap();
        assert_eq!(store.retrieve("k").unwrap().unwrap().title, "Title2");
    }

    #[test]
    fn size_fields_track_content() {
        let (_dir, store) = open_store();
        store.store("k", "a\nb\nc", vec![], None).unwrap();
        store.store("k", "just one line", vec![], None).unwrap();

        let mem = store.retrieve("k").unwrap().unwrap();
        assert_eq!(mem.lines, 1);
        assert_eq!(mem.chars, 13);
    }

    #[test]
    fn retrieve_missing_is_none() {
        let (_dir, store) = open_store();
        assert!(store.retrieve("nope").unwrap().is_none());
    }

    #[test]
    fn delete_semantics() {
        let (_dir, store) = open_store();
        assert!(!store.delete("missing").unwrap());

        store.store("k", "body", vec![], None).unwrap();
        assert!(store.delete("k").unwrap());
        assert!(store.retrieve("k").unwrap().is_none());
        assert!(!store.delete("k").unwrap());
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_dir, store) = open_store();
        store
            .store("proj", "Important Notes", vec![], Some("Project".into()))
            .unwrap();

        assert_eq!(store.search("notes").unwrap().len(), 1);
        assert_eq!(store.search("NOTES").unwrap().len(), 1);
        assert_eq!(store.search("PROJ").unwrap().len(), 1);
        assert_eq!(store.search("project").unwrap().len(), 1);
        assert!(store.search("xyz").unwrap().is_empty());
    }

    #[test]
    fn list_orders_by_update_time_descending() {
        let (_dir, store) = open_store();
        store.store("a", "first", vec![], None).unwrap();
        thread::sleep(Duration::from_millis(10));
        store.store("b", "second", vec![], None).unwrap();

        let listed = store.list().unwrap();
        let keys: Vec<&str> = listed.iter().map(|lm| lm.memory.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);

        thread::sleep(Duration::from_millis(10));
        store.store("a", "updated", vec![], None).unwrap();
        let listed = store.list().unwrap();
        let keys: Vec<&str> = listed.iter().map(|lm| lm.memory.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn list_annotates_snippets() {
        let (_dir, store) = open_store();
        store.store("long", &"x".repeat(150), vec![], None).unwrap();
        store.store("short", "tiny", vec![], None).unwrap();

        let listed = store.list().unwrap();
        for lm in listed {
            match lm.memory.key.as_str() {
                "long" => assert!(lm.snippet.ends_with("...")),
                "short" => assert_eq!(lm.snippet, "tiny"),
                other => panic!("unexpected key {}", other),
            }
        }
    }

    #[test]
    fn corrupt_slots_are_invisible() {
        let (_dir, store) = open_store();
        store.store("good", "searchable body", vec![], None).unwrap();
        fs::write(store.location().join("deadbeef.json"), "{not json").unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.search("searchable").unwrap().len(), 1);
        assert!(store.retrieve("deadbeef").unwrap().is_none());
    }

    #[test]
    fn storing_over_corrupt_slot_starts_fresh() {
        let (_dir, store) = open_store();
        let first = store.store("k", "original", vec![], Some("T".into())).unwrap();
        let path = store.location().join(format!(
            "{}.json",
            hex::encode(Sha256::digest("k".as_bytes()))
        ));
        fs::write(&path, "garbage").unwrap();

        let rewritten = store.store("k", "recovered", vec![], None).unwrap();
        // Prior state was unreadable, so this is a fresh create
        assert_ne!(rewritten.created_at, first.created_at);
        assert_eq!(rewritten.title, "k");
        assert_eq!(store.retrieve("k").unwrap().unwrap().content, "recovered");
    }

    #[test]
    fn legacy_record_without_title_is_backfilled_in_list() {
        let (_dir, store) = open_store();
        let path = store.location().join(format!(
            "{}.json",
            hex::encode(Sha256::digest("legacy".as_bytes()))
        ));
        fs::write(&path, r#"{"key":"legacy","content":"old data"}"#).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].memory.title, "legacy");
    }

    #[test]
    fn legacy_record_without_char_count_still_gets_snippet() {
        let (_dir, store) = open_store();
        let path = store.location().join(format!(
            "{}.json",
            hex::encode(Sha256::digest("legacy".as_bytes()))
        ));
        let body = "x".repeat(150);
        fs::write(&path, format!(r#"{{"key":"legacy","content":"{}"}}"#, body)).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].snippet.ends_with("..."));
        assert_eq!(listed[0].snippet.chars().count(), 103);
    }

    #[test]
    fn records_without_timestamps_sort_last() {
        let (_dir, store) = open_store();
        let path = store.location().join(format!(
            "{}.json",
            hex::encode(Sha256::digest("legacy".as_bytes()))
        ));
        fs::write(&path, r#"{"key":"legacy","content":"old"}"#).unwrap();
        store.store("fresh", "new", vec![], None).unwrap();

        let listed = store.list().unwrap();
        let keys: Vec<&str> = listed.iter().map(|lm| lm.memory.key.as_str()).collect();
        assert_eq!(keys, vec!["fresh", "legacy"]);
    }

    #[test]
    fn stats_aggregate_over_list() {
        let (_dir, store) = open_store();
        store.store("a", "12345", vec![], None).unwrap();
        store.store("b", "1234567890", vec![], None).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.total_chars, 15);
        assert_eq!(stats.storage_path, store.location());
    }

    // Two writers racing on one key are last-writer-wins: the store makes no
    // serializability promise, only that each write lands atomically. This
    // pins the sequential version of that contract.
    #[test]
    fn last_writer_wins_on_same_key() {
        let (_dir, store) = open_store();
        store.store("k", "from writer one", vec![], Some("One".into())).unwrap();
        store.store("k", "from writer two", vec![], Some("Two".into())).unwrap();

        let mem = store.retrieve("k").unwrap().unwrap();
        assert_eq!(mem.content, "from writer two");
        assert_eq!(mem.title, "Two");
    }
}
