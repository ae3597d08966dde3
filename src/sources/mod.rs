use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::matcher;
use crate::model::EntryList;

pub mod calc;
pub mod command;
pub mod desktop;
pub mod file;
pub mod history;
pub mod url;
pub mod web;

/// One query in the forms providers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Trimmed text exactly as typed, used to build commands and URLs.
    pub text: String,
    /// Lowercased `text`, used for matching.
    pub normalized: String,
}

impl Query {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let normalized = matcher::normalize(&text);
        Self { text, normalized }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// An independent source of candidate entries. A provider that has nothing
/// to offer returns an empty list; errors are reserved for failures, which
/// the dispatcher absorbs. Sources that do slow work poll `cancel` and give
/// up early once a newer query has started.
pub trait Source: Send + Sync {
    fn name(&self) -> &'static str;
    fn search(&self, query: &Query, cancel: &CancelToken) -> Result<EntryList, ProviderError>;
}
