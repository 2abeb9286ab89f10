use session_store::SessionStoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetmapError>;

#[derive(Error, Debug)]
pub enum NetmapError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),

    /// A single live getter call failed (revert, timeout, ABI mismatch). Recovered per
    /// probe: the variable is left out of `external_addresses`.
    #[error("Address probe {getter}() on {contract} failed: {reason}")]
    AddressProbe {
        contract: String,
        getter: String,
        reason: String,
    },

    /// The analysis service rejected or failed a dispatched target. Recovered by the
    /// scheduler, which records it and moves on to the next frontier entry.
    #[error("Dispatch of {target} failed: {reason}")]
    Dispatch { target: String, reason: String },

    #[error("Unsupported crawl level {0}: expected no level, 0 (unbounded) or 1 (single hop)")]
    UnsupportedCrawlLevel(u32),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
