//! Error types for modtidy-core.
//!
//! Two kinds of failure leave a request:
//! - Interruptions (exit code 2): the caller cancelled or the deadline passed.
//!   Retrying later may succeed.
//! - Upstream failures (exit code 1): a collaborator (analysis, parser, diff,
//!   file resolution) failed. The whole request fails fast.
//!
//! An unsupported analysis and a workspace without a manifest are not errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("upstream failure: {0:#}")]
    Upstream(anyhow::Error),
}

impl CoreError {
    /// True for cancellation and deadline expiry.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CoreError::Cancelled | CoreError::DeadlineExceeded)
    }

    /// Recommended process exit code.
    pub fn exit_code(&self) -> u8 {
        if self.is_interrupted() { 2 } else { 1 }
    }
}

/// Failure reported by a tidy analyzer.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The analysis cannot run for this workspace. Callers treat this as "no
    /// results".
    #[error("tidy analysis is not supported here")]
    Unsupported,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}
