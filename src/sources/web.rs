use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::model::{Entry, EntryList};
use crate::sources::file::shell_quote;
use crate::sources::{Query, Source};
use url::form_urlencoded;

pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Fallback that always offers a web search for a non-empty query.
pub struct WebSearchSource {
    opener: String,
    engine: String,
    icon: String,
}

impl WebSearchSource {
    pub fn new(opener: &str, engine: &str, icon: &str) -> Self {
        Self {
            opener: opener.to_string(),
            engine: engine.to_string(),
            icon: icon.to_string(),
        }
    }

    pub fn search_url(&self, text: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(text.as_bytes()).collect();
        self.engine.replace(QUERY_PLACEHOLDER, &encoded)
    }
}

impl Source for WebSearchSource {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn search(&self, query: &Query, _cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        if query.is_empty() {
            return Ok(EntryList::new());
        }
        let command = format!("{} {}", self.opener, shell_quote(&self.search_url(&query.text)));
        Ok(EntryList::single(Entry::web_search(&query.text, &self.icon, command)))
    }
}
