use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::model::{Entry, EntryList};
use crate::sources::{Query, Source};
use log::{debug, info, trace};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Fields of a `[Desktop Entry]` group that the launcher cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopRecord {
    pub name: String,
    pub icon: String,
    pub exec: String,
    pub hidden: bool,
    pub no_display: bool,
    pub terminal: bool,
}

impl DesktopRecord {
    pub fn is_visible(&self) -> bool {
        !self.hidden && !self.no_display
    }
}

pub trait DesktopEntryReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<DesktopRecord, ProviderError>;
}

/// Reads desktop entry files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopFileReader;

impl DesktopEntryReader for DesktopFileReader {
    fn read(&self, path: &Path) -> Result<DesktopRecord, ProviderError> {
        let content = fs::read_to_string(path).map_err(|source| ProviderError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        parse_desktop_file(&content).map_err(|reason| ProviderError::DesktopEntry {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        })
    }
}

pub fn parse_desktop_file(content: &str) -> Result<DesktopRecord, &'static str> {
    let mut name = None;
    let mut exec = None;
    let mut record = DesktopRecord::default();
    let mut seen_group = false;
    let mut in_group = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        if line == "[Desktop Entry]" {
            seen_group = true;
            in_group = true;
            continue;
        }

        if line.starts_with('[') {
            in_group = false;
            continue;
        }

        if !in_group { continue; }

        let Some((key, value)) = line.split_once('=') else { continue };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => exec = Some(strip_field_codes(value)),
            "Icon" => record.icon = value.to_string(),
            "Hidden" => record.hidden = value == "true",
            "NoDisplay" => record.no_display = value == "true",
            "Terminal" => record.terminal = value == "true",
            _ => {}
        }
    }

    if !seen_group {
        return Err("no [Desktop Entry] group");
    }
    record.name = name.ok_or("missing Name")?;
    record.exec = exec.ok_or("missing Exec")?;
    Ok(record)
}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid token pattern"));

/// Drops `%f`-style placeholders together with the whitespace in front of
/// them; the launcher never has files or URLs to pass. Everything else in the
/// Exec value is kept byte for byte, except `%%` which becomes `%`.
pub fn strip_field_codes(exec: &str) -> String {
    let mut out = String::with_capacity(exec.len());
    let mut last = 0;
    for token in TOKEN.find_iter(exec) {
        if !is_field_code(token.as_str()) {
            out.push_str(&exec[last..token.start()]);
            out.push_str(&token.as_str().replace("%%", "%"));
        }
        last = token.end();
    }
    out.trim().to_string()
}

fn is_field_code(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('%'), Some('f' | 'F' | 'u' | 'U' | 'd' | 'D' | 'n' | 'N' | 'i' | 'c' | 'k' | 'v' | 'm'), None)
    )
}

/// Lists installed applications. Filtering by the query happens in the
/// dispatcher.
pub struct ApplicationSource<R = DesktopFileReader> {
    dirs: Vec<PathBuf>,
    reader: R,
    exclude: Vec<Regex>,
}

impl ApplicationSource<DesktopFileReader> {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self::with_reader(dirs, DesktopFileReader)
    }
}

impl<R: DesktopEntryReader> ApplicationSource<R> {
    pub fn with_reader(dirs: Vec<PathBuf>, reader: R) -> Self {
        Self { dirs, reader, exclude: Vec::new() }
    }

    pub fn with_exclude(mut self, exclude: Vec<Regex>) -> Self {
        self.exclude = exclude;
        self
    }

    fn is_excluded(&self, id: &str, record: &DesktopRecord) -> bool {
        self.exclude.iter().any(|re| re.is_match(&record.name) || re.is_match(id))
    }
}

/// Desktop file id: the path below the applications dir with `/` as `-`.
fn desktop_id(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('/', "-")
}

impl<R: DesktopEntryReader> Source for ApplicationSource<R> {
    fn name(&self) -> &'static str {
        "application"
    }

    fn search(&self, _query: &Query, cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        let mut entries = EntryList::new();
        let mut seen_ids = HashSet::new();

        for dir in &self.dirs {
            if !dir.exists() { continue; }
            debug!("Scanning desktop files in {:?}", dir);

            let files = WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .flatten()
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("desktop"));

            for file in files {
                if cancel.is_cancelled() {
                    debug!("ApplicationSource: scan abandoned for a newer query");
                    return Ok(EntryList::new());
                }
                let id = desktop_id(dir, file.path());
                // earlier directories override later ones
                if !seen_ids.insert(id.clone()) { continue; }

                let record = match self.reader.read(file.path()) {
                    Ok(record) => record,
                    Err(err) => {
                        trace!("Skipping {:?}: {}", file.path(), err);
                        continue;
                    }
                };
                if !record.is_visible() || self.is_excluded(&id, &record) { continue; }

                entries.push(Entry::application(&record.name, &record.icon, &record.exec, record.terminal));
            }
        }
        info!("ApplicationSource: found {} entries", entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Generation;
    use crate::model::EntryKind;
    use tempfile::TempDir;

    const FIREFOX: &str = "\
[Desktop Entry]
Name=Firefox
Icon=firefox
Exec=firefox %u
Terminal=false

[Desktop Action new-window]
Name=New Window
Exec=firefox --new-window %u
";

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn parses_main_group_only() {
        let record = parse_desktop_file(FIREFOX).unwrap();
        assert_eq!(record.name, "Firefox");
        assert_eq!(record.exec, "firefox");
        assert_eq!(record.icon, "firefox");
        assert!(record.is_visible());
    }

    #[test]
    fn rejects_missing_group_or_fields() {
        assert!(parse_desktop_file("Name=x\nExec=y\n").is_err());
        assert!(parse_desktop_file("[Desktop Entry]\nName=x\n").is_err());
    }

    #[test]
    fn strips_every_field_code() {
        assert_eq!(strip_field_codes("gimp-2.10 %U"), "gimp-2.10");
        assert_eq!(strip_field_codes("app %f --icon %i %c"), "app --icon");
        assert_eq!(strip_field_codes("printf 100%%"), "printf 100%");
        assert_eq!(strip_field_codes("app --mode=%foo"), "app --mode=%foo");
        assert_eq!(strip_field_codes("%U app"), "app");
    }

    #[test]
    fn field_code_stripping_keeps_quoted_spacing() {
        assert_eq!(
            strip_field_codes(r#"sh -c "echo  two  spaces" %f"#),
            r#"sh -c "echo  two  spaces""#
        );
        assert_eq!(strip_field_codes("app\t--flag  %u  --other"), "app\t--flag  --other");
    }

    #[test]
    fn cancelled_scan_returns_nothing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "firefox.desktop", FIREFOX);
        let generation = Generation::new();
        let stale = generation.next_token();
        generation.next_token();

        let source = ApplicationSource::new(vec![dir.path().to_path_buf()]);
        assert!(source.search(&Query::new("f"), &stale).unwrap().is_empty());
        assert_eq!(source.search(&Query::new("f"), &generation.next_token()).unwrap().len(), 1);
    }

    #[test]
    fn hidden_and_no_display_are_dropped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "firefox.desktop", FIREFOX);
        write(dir.path(), "hidden.desktop", "[Desktop Entry]\nName=Ghost\nExec=ghost\nHidden=true\n");
        write(dir.path(), "nodisplay.desktop", "[Desktop Entry]\nName=Helper\nExec=helper\nNoDisplay=true\n");
        write(dir.path(), "broken.desktop", "garbage");
        write(dir.path(), "readme.txt", "[Desktop Entry]\nName=Text\nExec=text\n");

        let list = ApplicationSource::new(vec![dir.path().to_path_buf()])
            .search(&Query::new("x"), &CancelToken::never())
            .unwrap();
        let names: Vec<_> = list.iter().map(Entry::name).collect();
        assert_eq!(names, ["Firefox"]);
        assert_eq!(list.get(0).map(Entry::kind), Some(EntryKind::Application));
        assert_eq!(list.get(0).map(Entry::tab_completion), Some("firefox"));
    }

    #[test]
    fn user_dir_overrides_system_dir() {
        let user = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        write(user.path(), "kde/editor.desktop", "[Desktop Entry]\nName=My Editor\nExec=myedit\n");
        write(system.path(), "kde/editor.desktop", "[Desktop Entry]\nName=Editor\nExec=edit\n");
        write(system.path(), "other.desktop", "[Desktop Entry]\nName=Other\nExec=other\n");

        let list = ApplicationSource::new(vec![user.path().to_path_buf(), system.path().to_path_buf()])
            .search(&Query::new("e"), &CancelToken::never())
            .unwrap();
        let names: Vec<_> = list.iter().map(Entry::name).collect();
        assert_eq!(names, ["My Editor", "Other"]);
    }

    #[test]
    fn exclude_patterns_match_name_or_id() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "firefox.desktop", FIREFOX);
        write(dir.path(), "org.gnome.Settings.desktop", "[Desktop Entry]\nName=Settings\nExec=gnome-control-center\n");

        let list = ApplicationSource::new(vec![dir.path().to_path_buf()])
            .with_exclude(vec![Regex::new(r"^org\.gnome\.").unwrap()])
            .search(&Query::new("s"), &CancelToken::never())
            .unwrap();
        let names: Vec<_> = list.iter().map(Entry::name).collect();
        assert_eq!(names, ["Firefox"]);
    }

    #[test]
    fn custom_reader_records_are_filtered() {
        struct Fixed;
        impl DesktopEntryReader for Fixed {
            fn read(&self, path: &Path) -> Result<DesktopRecord, ProviderError> {
                Ok(DesktopRecord {
                    name: path.file_stem().unwrap().to_string_lossy().into_owned(),
                    exec: "true".to_string(),
                    hidden: path.ends_with("b.desktop"),
                    ..DesktopRecord::default()
                })
            }
        }
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.desktop", "");
        write(dir.path(), "b.desktop", "");

        let list = ApplicationSource::with_reader(vec![dir.path().to_path_buf()], Fixed)
            .search(&Query::new("a"), &CancelToken::never())
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).map(Entry::name), Some("a"));
    }
}
