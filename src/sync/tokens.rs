//! Monotonic request tokens for the stale-response guard.

use std::sync::atomic::{AtomicU64, Ordering};

/// One counter per collection. A result may be committed only while its token
/// is still the latest one issued.
#[derive(Debug, Default)]
pub struct RequestTokens {
    latest: AtomicU64,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next token; tokens start at 1
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    /// Latest issued token, 0 when none has been issued
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}
