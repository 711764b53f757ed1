//! Generation markers for issued fetches.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued fetch. Later fetches carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchToken(u64);

impl FetchToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FetchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`FetchToken`]s shared by the controller that issues
/// fetches and the reconciler that applies them.
#[derive(Debug, Default)]
pub struct FetchSequence {
    latest: AtomicU64,
}

impl FetchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token; it becomes the only authoritative one
    pub fn issue(&self) -> FetchToken {
        FetchToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Most recently issued token, if any
    pub fn latest(&self) -> Option<FetchToken> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(FetchToken(n)),
        }
    }

    pub fn is_latest(&self, token: FetchToken) -> bool {
        self.latest() == Some(token)
    }
}
