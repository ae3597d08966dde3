use crate::cancel::{CancelToken, Generation};
use crate::dispatcher::Dispatcher;
use crate::model::{Entry, EntryList};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

/// Result of a background query, tagged with the token it was started with.
pub struct QueryResult {
    pub query: String,
    pub entries: EntryList,
    token: CancelToken,
}

/// What a shell keeps between keystrokes: the current query, its result
/// list and the selected row. Each new query replaces the whole list.
pub struct Session {
    dispatcher: Arc<Dispatcher>,
    generation: Generation,
    pub query: String,
    pub results: EntryList,
    pub selected_index: usize,
}

impl Session {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            generation: Generation::new(),
            query: String::new(),
            results: EntryList::new(),
            selected_index: 0,
        }
    }

    /// Searches synchronously; any query still running in the background is
    /// superseded.
    pub fn update_query(&mut self, query: &str) {
        let token = self.generation.next_token();
        if let Some(results) = self.dispatcher.search_with(query, &token) {
            self.set_results(query, results);
        }
    }

    /// Searches on a worker thread and posts the result to `tx`. Feed it back
    /// through [`Session::apply`].
    pub fn spawn_query(&self, query: &str, tx: Sender<QueryResult>) {
        let token = self.generation.next_token();
        let dispatcher = Arc::clone(&self.dispatcher);
        let query = query.to_string();
        thread::spawn(move || {
            if let Some(entries) = dispatcher.search_with(&query, &token) {
                let _ = tx.send(QueryResult { query, entries, token });
            }
        });
    }

    /// Installs a background result unless a newer query was started since.
    /// Returns whether the result was used.
    pub fn apply(&mut self, result: QueryResult) -> bool {
        if result.token.is_cancelled() {
            log::debug!("Session: dropping stale results for {:?}", result.query);
            return false;
        }
        self.set_results(&result.query, result.entries);
        true
    }

    fn set_results(&mut self, query: &str, results: EntryList) {
        self.query = query.to_string();
        self.results = results;
        self.selected_index = 0;
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.results.is_empty() {
            self.selected_index = 0;
            return;
        }

        let len = self.results.len() as i64;
        let new_index = (self.selected_index as i64 + i64::from(delta)).rem_euclid(len);
        self.selected_index = new_index as usize;
    }

    pub fn get_selected(&self) -> Option<&Entry> {
        self.results.get(self.selected_index)
    }

    /// Text to put into the query box when the user asks for completion.
    pub fn tab_completion(&self) -> Option<&str> {
        self.get_selected().map(Entry::tab_completion)
    }
}
