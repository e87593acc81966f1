//! Per-request cancellation and deadline.

use crate::error::CoreError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Carried through every operation and handed to every collaborator.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Err` once the request is cancelled or past its deadline.
    /// Cancellation wins when both hold.
    pub fn checkpoint(&self) -> Result<(), CoreError> {
        match self.interruption() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Classify a collaborator failure. A failure seen after the request was
    /// interrupted is reported as the interruption.
    pub(crate) fn upstream(&self, err: anyhow::Error) -> CoreError {
        self.interruption().unwrap_or(CoreError::Upstream(err))
    }

    fn interruption(&self) -> Option<CoreError> {
        if self.cancel.is_cancelled() {
            return Some(CoreError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CoreError::DeadlineExceeded),
            _ => None,
        }
    }
}
