//! Clap-free settings for the operations.

use crate::context::RequestContext;
use modtidy_edit::DiffAlgorithm;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoreSettings {
    /// Line diff used when synthesizing patches.
    pub diff_algorithm: DiffAlgorithm,
    /// Memoize analysis results per manifest version (`CachedTidy`).
    pub cache_analysis: bool,
    /// Per-request deadline.
    pub deadline: Option<Duration>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            diff_algorithm: DiffAlgorithm::default(),
            cache_analysis: true,
            deadline: None,
        }
    }
}

impl CoreSettings {
    /// Fresh context honoring the configured deadline.
    pub fn request_context(&self) -> RequestContext {
        match self.deadline {
            Some(timeout) => RequestContext::new().with_timeout(timeout),
            None => RequestContext::new(),
        }
    }
}
