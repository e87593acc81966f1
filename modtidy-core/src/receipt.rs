//! Tidy results written to disk by an external tool.

use camino::Utf8Path;
use fs_err as fs;
use modtidy_types::TidyResult;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiptLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

/// Load a tidy result. Unknown fields are ignored and missing collections
/// default to empty.
pub fn load_tidy_receipt(path: &Utf8Path) -> Result<TidyResult, ReceiptLoadError> {
    debug!(path = %path, "loading tidy receipt");
    let text = fs::read_to_string(path).map_err(|e| ReceiptLoadError::Io {
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| ReceiptLoadError::Json {
        message: e.to_string(),
    })
}
