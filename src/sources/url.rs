use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::model::{Entry, EntryList};
use crate::sources::file::shell_quote;
use crate::sources::{Query, Source};
use ::url::Url;

/// Recognizes URLs by syntax alone; nothing is fetched.
pub struct UrlSource {
    opener: String,
    icon: String,
}

impl UrlSource {
    pub fn new(opener: &str, icon: &str) -> Self {
        Self {
            opener: opener.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// `scheme://...` or `mailto:`; bare words with a colon such as `foo:bar`
/// are not treated as links.
pub fn is_url(text: &str) -> bool {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(text) {
        Ok(url) => !url.cannot_be_a_base() || url.scheme() == "mailto",
        Err(_) => false,
    }
}

impl Source for UrlSource {
    fn name(&self) -> &'static str {
        "url"
    }

    fn search(&self, query: &Query, _cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        if !is_url(&query.text) {
            return Ok(EntryList::new());
        }
        let command = format!("{} {}", self.opener, shell_quote(&query.text));
        Ok(EntryList::single(Entry::url(&query.text, &self.icon, command)))
    }
}
