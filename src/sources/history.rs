use crate::config;
use crate::cancel::CancelToken;
use crate::error::{HistoryError, ProviderError};
use crate::model::{Entry, EntryList};
use crate::sources::{Query, Source};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Previously executed command lines, consulted read-only during a query.
pub trait HistoryStore: Send + Sync {
    fn is_in_history(&self, query: &str) -> bool;
    /// Most recent first.
    fn commands(&self) -> Vec<String>;
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct History {
    pub commands: Vec<String>,
}

impl History {
    /// Moves `command` to the front, dropping older duplicates and anything
    /// beyond `capacity`.
    pub fn push(&mut self, command: &str, capacity: usize) {
        self.commands.retain(|c| c != command);
        self.commands.insert(0, command.to_string());
        self.commands.truncate(capacity);
    }
}

pub fn get_history_path() -> Option<PathBuf> {
    config::project_dirs().map(|dirs| dirs.data_dir().join("history.json"))
}

/// A missing or unreadable file is an empty history.
pub fn load_history(path: &Path) -> History {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

pub fn save_history(path: &Path, history: &History) -> Result<(), HistoryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(history)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn record(path: &Path, command: &str, capacity: usize) -> Result<(), HistoryError> {
    let mut history = load_history(path);
    history.push(command, capacity);
    save_history(path, &history)
}

/// Snapshot of the history file taken when the dispatcher is built.
#[derive(Debug, Default)]
pub struct FileHistory {
    history: History,
}

impl FileHistory {
    pub fn load(path: &Path) -> Self {
        Self { history: load_history(path) }
    }
}

impl HistoryStore for FileHistory {
    fn is_in_history(&self, query: &str) -> bool {
        self.history.commands.iter().any(|c| c == query)
    }

    fn commands(&self) -> Vec<String> {
        self.history.commands.clone()
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    commands: Vec<String>,
}

impl MemoryHistory {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl HistoryStore for MemoryHistory {
    fn is_in_history(&self, query: &str) -> bool {
        self.commands.iter().any(|c| c == query)
    }

    fn commands(&self) -> Vec<String> {
        self.commands.clone()
    }
}

/// Returns every history command; the dispatcher filters them by the query.
pub struct HistorySource {
    history: Arc<dyn HistoryStore>,
}

impl HistorySource {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }
}

impl Source for HistorySource {
    fn name(&self) -> &'static str {
        "history"
    }

    fn search(&self, _query: &Query, _cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        Ok(self.history.commands().iter().map(|c| Entry::history(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn push_deduplicates_and_caps() {
        let mut history = History::default();
        history.push("ls", 3);
        history.push("top", 3);
        history.push("ls", 3);
        history.push("htop", 3);
        history.push("vim", 3);
        assert_eq!(history.commands, ["vim", "htop", "ls"]);
    }

    #[test]
    fn record_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.json");
        record(&path, "ls -la", 50).unwrap();
        record(&path, "htop", 50).unwrap();

        let store = FileHistory::load(&path);
        assert!(store.is_in_history("ls -la"));
        assert!(!store.is_in_history("ls"));
        assert_eq!(store.commands(), ["htop", "ls -la"]);
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        assert!(FileHistory::load(&path).commands().is_empty());
    }

    #[test]
    fn source_emits_history_entries() {
        let store = Arc::new(MemoryHistory::new(vec!["make test".to_string()]));
        let list = HistorySource::new(store).search(&Query::new("make"), &CancelToken::never()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).map(Entry::command), Some("make test"));
    }
}
