use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::matcher;
use crate::model::{Entry, EntryList};
use crate::sources::command::is_executable;
use crate::sources::{Query, Source};
use directories::BaseDirs;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub icon: String,
    pub is_dir: bool,
}

pub trait FileInfoResolver: Send + Sync {
    fn query_info(&self, path: &Path) -> Result<FileInfo, ProviderError>;
}

/// Picks freedesktop icon names from file metadata and the guessed MIME type.
#[derive(Debug, Default, Clone, Copy)]
pub struct MimeIconResolver;

impl FileInfoResolver for MimeIconResolver {
    fn query_info(&self, path: &Path) -> Result<FileInfo, ProviderError> {
        let metadata = fs::metadata(path).map_err(|source| ProviderError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.is_dir() {
            return Ok(FileInfo { icon: "folder".to_string(), is_dir: true });
        }
        let icon = if is_executable(&metadata) {
            "application-x-executable".to_string()
        } else {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            mime.essence_str().replace('/', "-")
        };
        Ok(FileInfo { icon, is_dir: false })
    }
}

/// Resolves queries that look like paths: the path itself, if it exists, and
/// the siblings whose names start with the typed file name.
pub struct FileSource<R = MimeIconResolver> {
    resolver: R,
    opener: String,
    home: Option<PathBuf>,
    max_results: usize,
}

impl FileSource<MimeIconResolver> {
    pub fn new(opener: &str, max_results: usize) -> Self {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self::with_resolver(MimeIconResolver, opener, home, max_results)
    }
}

impl<R: FileInfoResolver> FileSource<R> {
    pub fn with_resolver(resolver: R, opener: &str, home: Option<PathBuf>, max_results: usize) -> Self {
        Self {
            resolver,
            opener: opener.to_string(),
            home,
            max_results,
        }
    }

    /// Expands a leading `~`. Returns `None` for text that is not a path.
    fn expand(&self, typed: &str) -> Option<PathBuf> {
        if typed.starts_with('/') {
            return Some(PathBuf::from(typed));
        }
        let rest = typed.strip_prefix('~')?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let home = self.home.as_ref()?;
        Some(home.join(rest.trim_start_matches('/')))
    }

    fn entry(&self, display: &str, path: &Path, query: &Query) -> Option<Entry> {
        let info = match self.resolver.query_info(path) {
            Ok(info) => info,
            Err(err) => {
                debug!("FileSource: {}", err);
                return None;
            }
        };
        let mut tab = display.to_string();
        if info.is_dir && !tab.ends_with('/') {
            tab.push('/');
        }
        let command = format!("{} {}", self.opener, shell_quote(&path.to_string_lossy()));
        let mut entry = Entry::file(display, &info.icon, command, tab);
        if let Some(span) = matcher::find(entry.normalized_name(), &query.normalized) {
            entry.highlight(span.offset, span.len);
        }
        Some(entry)
    }

    fn siblings(&self, typed: &str, path: &Path, query: &Query, cancel: &CancelToken) -> EntryList {
        let (dir, prefix, display_dir) = if typed.ends_with('/') {
            (path.to_path_buf(), String::new(), typed.to_string())
        } else {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return EntryList::new();
            };
            // a bare `~` names the home directory itself
            let Some(i) = typed.rfind('/') else {
                return EntryList::new();
            };
            let display_dir = typed[..=i].to_string();
            (parent.to_path_buf(), matcher::normalize(&name.to_string_lossy()), display_dir)
        };

        let Ok(read_dir) = fs::read_dir(&dir) else {
            return EntryList::new();
        };
        let show_hidden = prefix.starts_with('.');

        let mut names: Vec<String> = read_dir
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| show_hidden || !name.starts_with('.'))
            .filter(|name| {
                let normalized = matcher::normalize(name);
                normalized.starts_with(&prefix) && normalized != prefix
            })
            .collect();
        names.sort_by_cached_key(|name| matcher::normalize(name));
        names.truncate(self.max_results);

        let mut list: EntryList = names
            .iter()
            .take_while(|_| !cancel.is_cancelled())
            .filter_map(|name| self.entry(&format!("{display_dir}{name}"), &dir.join(name), query))
            .collect();
        list.sort_by_name();
        list
    }
}

impl<R: FileInfoResolver> Source for FileSource<R> {
    fn name(&self) -> &'static str {
        "file"
    }

    fn search(&self, query: &Query, cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        let typed = query.text.as_str();
        let Some(path) = self.expand(typed) else {
            return Ok(EntryList::new());
        };

        let mut list = EntryList::new();
        let display = typed.trim_end_matches('/');
        if !display.is_empty() {
            list.extend(self.entry(display, &path, query));
        }
        list.extend(self.siblings(typed, &path, query, cancel));
        Ok(list)
    }
}

/// Quotes `text` for `sh` unless it consists of characters that never need it.
pub fn shell_quote(text: &str) -> String {
    let safe = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | ':' | '~' | '+' | ',' | '@' | '%'));
    if safe {
        text.to_string()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Generation;
    use crate::model::EntryKind;
    use tempfile::TempDir;

    fn source(home: Option<PathBuf>) -> FileSource {
        FileSource::with_resolver(MimeIconResolver, "xdg-open", home, 20)
    }

    fn names(list: &EntryList) -> Vec<&str> {
        list.iter().map(Entry::name).collect()
    }

    #[test]
    fn existing_file_opens_with_opener() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hi").unwrap();
        let typed = path.to_string_lossy().into_owned();

        let list = source(None).search(&Query::new(&typed), &CancelToken::never()).unwrap();
        let entry = list.get(0).unwrap();
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.command(), format!("xdg-open {typed}"));
        assert_eq!(entry.icon(), "text-plain");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn missing_path_yields_nothing() {
        let list = source(None)
            .search(&Query::new("/definitely/not/here/at/all"), &CancelToken::never())
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn non_paths_are_ignored() {
        assert!(source(None).search(&Query::new("firefox"), &CancelToken::never()).unwrap().is_empty());
        assert!(source(None).search(&Query::new("~user"), &CancelToken::never()).unwrap().is_empty());
    }

    #[test]
    fn lists_matching_siblings_with_home_expansion() {
        let home = TempDir::new().unwrap();
        fs::create_dir(home.path().join("Documents")).unwrap();
        fs::create_dir(home.path().join("Downloads")).unwrap();
        fs::write(home.path().join("Desktop.txt"), "").unwrap();
        fs::write(home.path().join(".dotfile"), "").unwrap();

        let list = source(Some(home.path().to_path_buf()))
            .search(&Query::new("~/do"), &CancelToken::never())
            .unwrap();
        assert_eq!(names(&list), ["~/Documents", "~/Downloads"]);
        let docs = list.get(0).unwrap();
        assert_eq!(docs.tab_completion(), "~/Documents/");
        assert_eq!(docs.icon(), "folder");
        assert_eq!(docs.highlight_span().map(|s| (s.offset, s.len)), Some((0, 4)));
        assert!(docs.command().ends_with("/Documents"));
    }

    #[test]
    fn trailing_slash_lists_directory_without_hidden() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("b"), "").unwrap();
        fs::write(home.path().join("a"), "").unwrap();
        fs::write(home.path().join(".hidden"), "").unwrap();

        let list = source(Some(home.path().to_path_buf())).search(&Query::new("~/"), &CancelToken::never()).unwrap();
        assert_eq!(names(&list), ["~", "~/a", "~/b"]);
    }

    #[test]
    fn bare_tilde_is_the_home_directory() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("a"), "").unwrap();
        let list = source(Some(home.path().to_path_buf())).search(&Query::new("~"), &CancelToken::never()).unwrap();
        assert_eq!(names(&list), ["~"]);
        assert_eq!(list.get(0).map(Entry::tab_completion), Some("~/"));
    }

    #[test]
    fn dot_prefix_reveals_hidden_files() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join(".bashrc"), "").unwrap();
        let list = source(Some(home.path().to_path_buf())).search(&Query::new("~/.b"), &CancelToken::never()).unwrap();
        assert_eq!(names(&list), ["~/.bashrc"]);
    }

    #[test]
    fn result_cap_keeps_first_names_ignoring_case() {
        let home = TempDir::new().unwrap();
        for name in ["Zeta", "Yak", "alpha", "beta", "gamma"] {
            fs::write(home.path().join(name), "").unwrap();
        }
        let capped = FileSource::with_resolver(MimeIconResolver, "xdg-open", Some(home.path().to_path_buf()), 3);
        let list = capped.search(&Query::new("~/"), &CancelToken::never()).unwrap();
        assert_eq!(names(&list), ["~", "~/alpha", "~/beta", "~/gamma"]);
    }

    #[test]
    fn cancelled_listing_stops_early() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("a"), "").unwrap();
        let generation = Generation::new();
        let stale = generation.next_token();
        generation.next_token();

        let list = source(Some(home.path().to_path_buf()))
            .search(&Query::new("~/"), &stale)
            .unwrap();
        assert_eq!(names(&list), ["~"]);
    }

    #[test]
    fn quotes_unsafe_paths() {
        assert_eq!(shell_quote("/tmp/a.txt"), "/tmp/a.txt");
        assert_eq!(shell_quote("/tmp/my file"), "'/tmp/my file'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
