//! Supersession of in-flight queries.
//!
//! Each keystroke takes a token from the session's [`Generation`]; taking a
//! new one cancels every token handed out before it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&self) -> CancelToken {
        let issued = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        CancelToken {
            current: Arc::clone(&self.current),
            issued,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    /// A token nothing can cancel.
    pub fn never() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
            issued: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_cancels_older_ones() {
        let generation = Generation::new();
        let first = generation.next_token();
        let second = generation.next_token();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        let third = generation.next_token();
        assert!(second.is_cancelled());
        assert!(!third.is_cancelled());
    }

    #[test]
    fn never_stays_live() {
        let token = CancelToken::never();
        Generation::new().next_token();
        assert!(!token.is_cancelled());
    }
}
