//! Error taxonomy of the synchronization core.
//!
//! Every network-origin failure is converted into a `SyncError` at the
//! orchestrator/engine boundary and recorded on the owning state container;
//! nothing propagates to the presentation shell as a panic.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Synchronization error
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SyncError {
    /// Transport failure, timeout or an unexpected HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Missing id, page or detail record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed payload shape reaching the normalizer
    #[error("Validation error: {0}")]
    Validation(String),

    /// Navigation outside `[1, max_page]`; no fetch is issued
    #[error("Page {requested} is out of range (max page {max_page})")]
    OutOfRange { requested: u32, max_page: u32 },

    /// A newer request for the same collection was issued before this one resolved
    #[error("Request {token} was superseded by a newer request")]
    Superseded { token: u64 },
}

impl SyncError {
    /// Whether the error should be surfaced to the user as a notice.
    /// Superseded results are silently discarded.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Superseded { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Validation(err.to_string());
        }
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            return Self::NotFound(err.to_string());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
