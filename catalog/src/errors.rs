use thiserror::Error;

/// Message recorded for items rejected before execution. Part of the batch
/// report contract, so it stays a fixed string.
pub const INVALID_FORMAT: &str = "invalid item format";

/// Errors from the remote entity store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("store rejected credentials")]
    Unauthorized,

    #[error("store request failed with status {status}: {detail}")]
    Request { status: u16, detail: String },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}
