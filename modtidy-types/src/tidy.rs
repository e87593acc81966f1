//! Output of the tidy analysis.
//!
//! modtidy reads these "as found": unknown fields are ignored and optional
//! collections default to empty, so a receipt written by an older or newer
//! analyzer still loads.

use crate::file::FileUri;
use crate::position::Range;
use crate::protocol::TextEdit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category the analysis uses for manifest syntax errors.
pub const SYNTAX_CATEGORY: &str = "syntax";

/// A module requirement the manifest should declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub path: String,
    pub version: String,
    #[serde(default)]
    pub indirect: bool,
}

impl Requirement {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            indirect: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFix {
    pub title: String,
    #[serde(default)]
    pub edits: BTreeMap<FileUri, Vec<TextEdit>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidyError {
    pub message: String,
    pub range: Range,
    pub category: String,
    #[serde(default)]
    pub suggested_fixes: Vec<SuggestedFix>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidyResult {
    /// Keyed by dependency name; one candidate patch per key.
    #[serde(default)]
    pub missing_dependencies: BTreeMap<String, Requirement>,
    #[serde(default)]
    pub errors: Vec<TidyError>,
}

impl TidyResult {
    pub fn is_clean(&self) -> bool {
        self.missing_dependencies.is_empty() && self.errors.is_empty()
    }
}
