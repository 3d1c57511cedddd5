//! Cooperative cancellation for background work

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked by background work before it publishes anything
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Monotonic stamp of the active query. Anything computed under an older
/// token is never published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryToken(u64);

impl QueryToken {
    pub fn next(self) -> Self {
        QueryToken(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancel_is_shared_across_clones() {
        let token = CancellationToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());

        token.cancel();
        let seen = thread::spawn(move || worker.is_cancelled()).join().unwrap();
        assert!(seen);
    }

    #[test]
    fn test_query_token_is_monotonic() {
        let a = QueryToken::default();
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.next().value(), 2);
    }
}
