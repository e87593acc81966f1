//! Error types for modtidy-modfile.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModFileError {
    /// The manifest text is not well formed. `line` is 1-based.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("invalid module version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("invalid module path {path:?}")]
    InvalidPath { path: String },
}

impl ModFileError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line of a syntax error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}
