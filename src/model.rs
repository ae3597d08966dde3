use crate::markup;
use crate::matcher::{self, Span};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Application,
    CommandLine,
    File,
    Url,
    History,
    Calculation,
    WebSearch,
}

impl EntryKind {
    /// Text shown in front of the display markup.
    pub fn glyph(self) -> Option<&'static str> {
        match self {
            EntryKind::CommandLine => Some("\u{2192}"),
            EntryKind::History => Some("\u{231a}"),
            EntryKind::Calculation => Some("="),
            EntryKind::WebSearch => Some("Search for:"),
            EntryKind::Application | EntryKind::File | EntryKind::Url => None,
        }
    }

    /// Kinds whose providers return their whole catalogue; the dispatcher
    /// keeps only the entries whose name contains the query.
    pub fn is_catalog(self) -> bool {
        match self {
            EntryKind::Application | EntryKind::History => true,
            EntryKind::CommandLine
            | EntryKind::File
            | EntryKind::Url
            | EntryKind::Calculation
            | EntryKind::WebSearch => false,
        }
    }
}

/// Display priority, lower sorts first. `order` breaks ties inside a tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Rank {
    pub tier: u32,
    pub order: u32,
}

const INTERIOR_MATCH: u32 = 1 << 16;

impl Rank {
    pub fn new(tier: u32, order: u32) -> Self {
        Self { tier, order }
    }

    /// Prefix matches before interior ones, then shorter names first.
    pub fn for_match(tier: u32, span: Span, name_len: usize) -> Self {
        let class = if span.is_prefix() { 0 } else { INTERIOR_MATCH };
        let len = u32::try_from(name_len).unwrap_or(u32::MAX).min(INTERIOR_MATCH - 1);
        Self::new(tier, class + len)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    kind: EntryKind,
    name: String,
    #[serde(skip)]
    normalized_name: String,
    markup: String,
    highlight: Option<Span>,
    tab_completion: String,
    icon: String,
    command: String,
    terminal: bool,
    rank: Rank,
}

impl Entry {
    fn new(kind: EntryKind, name: String, icon: String, command: String, tab_completion: String) -> Self {
        let normalized_name = matcher::normalize(&name);
        let mut entry = Self {
            kind,
            name,
            normalized_name,
            markup: String::new(),
            highlight: None,
            tab_completion,
            icon,
            command,
            terminal: false,
            rank: Rank::default(),
        };
        entry.render_markup();
        entry
    }

    pub fn application(name: &str, icon: &str, command: &str, terminal: bool) -> Self {
        let mut entry = Self::new(
            EntryKind::Application,
            name.to_string(),
            icon.to_string(),
            command.to_string(),
            command.to_string(),
        );
        entry.terminal = terminal;
        entry
    }

    pub fn command_line(command: &str) -> Self {
        let mut entry = Self::new(
            EntryKind::CommandLine,
            command.to_string(),
            "application-default-icon".to_string(),
            command.to_string(),
            command.to_string(),
        );
        entry.highlight_all();
        entry
    }

    pub fn history(command: &str) -> Self {
        Self::new(
            EntryKind::History,
            command.to_string(),
            "document-open-recent".to_string(),
            command.to_string(),
            command.to_string(),
        )
    }

    /// `name` is the path as displayed, `command` the open action.
    pub fn file(name: &str, icon: &str, command: String, tab_completion: String) -> Self {
        Self::new(EntryKind::File, name.to_string(), icon.to_string(), command, tab_completion)
    }

    pub fn url(url: &str, icon: &str, command: String) -> Self {
        Self::new(EntryKind::Url, url.to_string(), icon.to_string(), command, url.to_string())
    }

    pub fn calculation(value: &str) -> Self {
        let mut entry = Self::new(
            EntryKind::Calculation,
            value.to_string(),
            "accessories-calculator".to_string(),
            String::new(),
            value.to_string(),
        );
        entry.highlight_all();
        entry
    }

    pub fn web_search(query: &str, icon: &str, command: String) -> Self {
        let mut entry = Self::new(
            EntryKind::WebSearch,
            query.to_string(),
            icon.to_string(),
            command,
            query.to_string(),
        );
        entry.highlight_all();
        entry
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn highlight_span(&self) -> Option<Span> {
        self.highlight
    }

    pub fn tab_completion(&self) -> &str {
        &self.tab_completion
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Shell command line run on activation. Empty for calculations.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn terminal(&self) -> bool {
        self.terminal
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub(crate) fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    /// Bolds `len` characters of the name starting at `offset` and rebuilds
    /// the display markup from scratch. Out of range values are clamped.
    pub fn highlight(&mut self, offset: usize, len: usize) {
        let name_len = self.name.chars().count();
        let offset = offset.min(name_len);
        let len = len.min(name_len - offset);
        self.highlight = Some(Span { offset, len });
        self.render_markup();
    }

    fn highlight_all(&mut self) {
        self.highlight(0, self.name.chars().count());
    }

    fn render_markup(&mut self) {
        let body = markup::bold_span(&self.name, self.highlight);
        self.markup = match self.kind.glyph() {
            Some(glyph) => format!("{glyph} {body}"),
            None => body,
        };
    }
}

/// Ordered entries. Uniqueness is not enforced here.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct EntryList(Vec<Entry>);

impl EntryList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(entry: Entry) -> Self {
        Self(vec![entry])
    }

    pub fn push(&mut self, entry: Entry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.0.iter()
    }

    pub fn retain(&mut self, keep: impl FnMut(&Entry) -> bool) {
        self.0.retain(keep);
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn sort_by_name(&mut self) {
        self.0.sort_by(|a, b| a.normalized_name.cmp(&b.normalized_name));
    }

    pub fn sort_by_rank(&mut self) {
        self.0.sort_by(by_rank);
    }
}

fn by_rank(a: &Entry, b: &Entry) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| a.normalized_name.cmp(&b.normalized_name))
}

impl From<Vec<Entry>> for EntryList {
    fn from(entries: Vec<Entry>) -> Self {
        Self(entries)
    }
}

impl Extend<Entry> for EntryList {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Entry> for EntryList {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for EntryList {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
