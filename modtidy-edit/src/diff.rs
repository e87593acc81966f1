//! Line diffs expressed as byte-offset replacements.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, TextDiff};

/// Line diff algorithm used to derive edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl DiffAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            DiffAlgorithm::Myers => "myers",
            DiffAlgorithm::Patience => "patience",
            DiffAlgorithm::Lcs => "lcs",
        }
    }
}

impl std::str::FromStr for DiffAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "myers" => Ok(DiffAlgorithm::Myers),
            "patience" => Ok(DiffAlgorithm::Patience),
            "lcs" => Ok(DiffAlgorithm::Lcs),
            other => Err(format!(
                "unknown diff algorithm `{other}` (expected myers, patience or lcs)"
            )),
        }
    }
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(value: DiffAlgorithm) -> Self {
        match value {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        }
    }
}

/// Replace `old[start..end]` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetEdit {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

/// Line-granular edits turning `old` into `new`.
///
/// Adjacent deletions and insertions are merged, so every edit covers a
/// maximal run of changed lines. Edits are ordered and never overlap.
pub fn compute_edits(old: &str, new: &str, algorithm: DiffAlgorithm) -> Vec<OffsetEdit> {
    let diff = TextDiff::configure()
        .algorithm(algorithm.into())
        .diff_lines(old, new);

    let mut edits: Vec<OffsetEdit> = Vec::new();
    let mut offset = 0;
    for op in diff.ops() {
        let removed: usize = diff.old_slices()[op.old_range()]
            .iter()
            .map(|line| line.len())
            .sum();
        if op.tag() == DiffTag::Equal {
            offset += removed;
            continue;
        }

        let inserted = diff.new_slices()[op.new_range()].concat();
        match edits.last_mut() {
            Some(last) if last.end == offset => {
                last.end += removed;
                last.new_text.push_str(&inserted);
            }
            _ => edits.push(OffsetEdit {
                start: offset,
                end: offset + removed,
                new_text: inserted,
            }),
        }
        offset += removed;
    }
    edits
}
