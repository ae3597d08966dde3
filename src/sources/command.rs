use crate::config::SearchPath;
use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::model::{Entry, EntryList};
use crate::sources::history::HistoryStore;
use crate::sources::{Query, Source};
use log::debug;
use std::fs::{self, Metadata};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;

/// Offers the typed text as a command line when its first word is runnable.
pub struct CommandSource {
    search_path: SearchPath,
    history: Arc<dyn HistoryStore>,
}

impl CommandSource {
    pub fn new(search_path: SearchPath, history: Arc<dyn HistoryStore>) -> Self {
        Self { search_path, history }
    }

    pub fn is_command(&self, program: &str) -> bool {
        is_path_executable(Path::new(program)) || self.is_command_in_path(program)
    }

    fn is_command_in_path(&self, program: &str) -> bool {
        // a name with a separator is a path, never looked up in PATH
        if program.contains('/') {
            return false;
        }
        self.search_path
            .dirs()
            .iter()
            .any(|dir| is_path_executable(&dir.join(program)))
    }
}

impl Source for CommandSource {
    fn name(&self) -> &'static str {
        "command"
    }

    fn search(&self, query: &Query, _cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        let Some(program) = query.text.split_whitespace().next() else {
            return Ok(EntryList::new());
        };
        if self.history.is_in_history(&query.text) {
            debug!("CommandSource: {:?} already in history", query.text);
            return Ok(EntryList::new());
        }
        if !self.is_command(program) {
            return Ok(EntryList::new());
        }
        Ok(EntryList::single(Entry::command_line(&query.text)))
    }
}

pub fn is_path_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| is_executable(&m)).unwrap_or(false)
}

pub fn is_executable(metadata: &Metadata) -> bool {
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryKind;
    use crate::sources::history::MemoryHistory;
    use std::fs::File;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    fn source(dirs: &[&Path], history: &[&str]) -> CommandSource {
        CommandSource::new(
            SearchPath::new(dirs.iter().map(|d| d.to_path_buf()).collect()),
            Arc::new(MemoryHistory::new(history.iter().map(|s| s.to_string()).collect())),
        )
    }

    #[test]
    fn finds_command_in_later_path_dir() {
        let empty = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        write_file(bin.path(), "ls", 0o755);

        let result = source(&[empty.path(), bin.path()], &[])
            .search(&Query::new("  ls -la /tmp "), &CancelToken::never())
            .unwrap();
        assert_eq!(result.len(), 1);
        let entry = result.get(0).unwrap();
        assert_eq!(entry.kind(), EntryKind::CommandLine);
        assert_eq!(entry.command(), "ls -la /tmp");
        assert_eq!(entry.tab_completion(), "ls -la /tmp");
    }

    #[test]
    fn ignores_non_executable_files() {
        let bin = TempDir::new().unwrap();
        write_file(bin.path(), "notes", 0o644);
        let result = source(&[bin.path()], &[]).search(&Query::new("notes"), &CancelToken::never()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn ignores_directories_with_exec_bit() {
        let bin = TempDir::new().unwrap();
        fs::create_dir(bin.path().join("tools")).unwrap();
        let result = source(&[bin.path()], &[]).search(&Query::new("tools"), &CancelToken::never()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn accepts_direct_executable_path() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "run.sh", 0o700);
        let typed = format!("{} --fast", dir.path().join("run.sh").display());

        let result = source(&[], &[]).search(&Query::new(&typed), &CancelToken::never()).unwrap();
        assert_eq!(result.get(0).map(Entry::command), Some(typed.as_str()));
    }

    #[test]
    fn skips_commands_already_in_history() {
        let bin = TempDir::new().unwrap();
        write_file(bin.path(), "ls", 0o755);
        let result = source(&[bin.path()], &["ls"]).search(&Query::new("ls"), &CancelToken::never()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn blank_query_yields_nothing() {
        let result = source(&[], &[]).search(&Query::new("   "), &CancelToken::never()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn empty_search_path_only_checks_paths() {
        let result = source(&[], &[]).search(&Query::new("ls"), &CancelToken::never()).unwrap();
        assert!(result.is_empty());
    }
}
