//! Runs a query against every source and merges the answers into one ranked
//! list.
//!
//! Sources run concurrently, one scoped thread each. Every source gets the
//! query's [`CancelToken`]; once a newer query takes a token from the same
//! [`crate::cancel::Generation`], slow sources stop scanning and the merged
//! result of the older query is discarded.

use crate::cancel::CancelToken;
use crate::config::{Config, RankingConfig};
use crate::error::ConfigError;
use crate::matcher;
use crate::model::{Entry, EntryKind, EntryList, Rank};
use crate::sources::calc::CalcSource;
use crate::sources::command::CommandSource;
use crate::sources::desktop::ApplicationSource;
use crate::sources::file::FileSource;
use crate::sources::history::{HistorySource, HistoryStore};
use crate::sources::url::UrlSource;
use crate::sources::web::WebSearchSource;
use crate::sources::{Query, Source};
use log::{debug, info, trace, warn};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

/// Maps entry kinds to tiers and computes the order inside a tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankPolicy {
    tiers: RankingConfig,
}

impl RankPolicy {
    pub fn new(tiers: RankingConfig) -> Result<Self, ConfigError> {
        tiers.validate()?;
        Ok(Self { tiers })
    }

    pub fn tier(&self, kind: EntryKind) -> u32 {
        self.tiers.tier(kind)
    }

    pub fn rank(&self, entry: &Entry) -> Rank {
        let tier = self.tier(entry.kind());
        match entry.highlight_span() {
            Some(span) if entry.kind().is_catalog() || entry.kind() == EntryKind::File => {
                Rank::for_match(tier, span, entry.name().chars().count())
            }
            _ => Rank::new(tier, 0),
        }
    }
}

pub struct Dispatcher {
    sources: Vec<Box<dyn Source>>,
    policy: RankPolicy,
}

impl Dispatcher {
    pub fn new(policy: RankPolicy) -> Self {
        Self {
            sources: Vec::new(),
            policy,
        }
    }

    pub fn with_source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// The standard source set, in a fixed invocation order.
    pub fn from_config(config: &Config, history: Arc<dyn HistoryStore>) -> Result<Self, ConfigError> {
        let policy = RankPolicy::new(config.ranking)?;
        let exclude = config
            .applications
            .exclude
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let opener = config.general.opener.as_str();

        Ok(Self::new(policy)
            .with_source(HistorySource::new(Arc::clone(&history)))
            .with_source(CommandSource::new(config.search.search_path(), history))
            .with_source(ApplicationSource::new(config.search.application_dirs()).with_exclude(exclude))
            .with_source(FileSource::new(opener, config.search.file_results))
            .with_source(UrlSource::new(opener, &config.url.icon))
            .with_source(CalcSource)
            .with_source(WebSearchSource::new(opener, &config.web_search.engine, &config.web_search.icon)))
    }

    /// Never fails; a blank query gives an empty list.
    pub fn search(&self, query: &str) -> EntryList {
        self.search_with(query, &CancelToken::never()).unwrap_or_default()
    }

    /// Like [`Dispatcher::search`], but returns `None` once `cancel` fires.
    pub fn search_with(&self, query: &str, cancel: &CancelToken) -> Option<EntryList> {
        let query = Query::new(query);
        if query.is_empty() {
            return Some(EntryList::new());
        }

        let partials: Vec<EntryList> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| {
                    let query = &query;
                    scope.spawn(move || {
                        if cancel.is_cancelled() {
                            return EntryList::new();
                        }
                        run_source(&**source, query, cancel)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        warn!("Dispatcher: a source panicked, ignoring its results");
                        EntryList::new()
                    })
                })
                .collect()
        });

        if cancel.is_cancelled() {
            debug!("Dispatcher: query {:?} superseded", query.text);
            return None;
        }

        let results = self.merge(&query, partials);
        info!("Dispatcher: query='{}', result_count={}", query.text, results.len());
        Some(results)
    }

    fn merge(&self, query: &Query, partials: Vec<EntryList>) -> EntryList {
        let mut merged: EntryList = partials
            .into_iter()
            .flatten()
            .filter_map(|entry| filter_catalog(entry, query))
            .collect();

        dedup_commands(&mut merged);

        let ranked: Vec<Entry> = merged
            .into_iter()
            .map(|mut entry| {
                entry.set_rank(self.policy.rank(&entry));
                entry
            })
            .collect();
        let mut list = EntryList::from(ranked);
        list.sort_by_rank();
        list
    }
}

fn run_source(source: &dyn Source, query: &Query, cancel: &CancelToken) -> EntryList {
    match source.search(query, cancel) {
        Ok(list) => {
            debug!("{}: {} entries", source.name(), list.len());
            list
        }
        Err(err) => {
            trace!("{}: no entries ({})", source.name(), err);
            EntryList::new()
        }
    }
}

/// Catalogue entries only survive when their name contains the query; the
/// match is highlighted.
fn filter_catalog(mut entry: Entry, query: &Query) -> Option<Entry> {
    if !entry.kind().is_catalog() {
        return Some(entry);
    }
    let span = matcher::find(entry.normalized_name(), &query.normalized)?;
    entry.highlight(span.offset, span.len);
    Some(entry)
}

/// A command line already offered by a history entry is dropped.
fn dedup_commands(list: &mut EntryList) {
    let remembered: HashSet<String> = list
        .iter()
        .filter(|e| e.kind() == EntryKind::History)
        .map(|e| e.command().to_string())
        .collect();
    list.retain(|e| e.kind() != EntryKind::CommandLine || !remembered.contains(e.command()));
}
