//! Edit engine for modtidy.
//!
//! Responsibilities:
//! - Diff two versions of a document line by line (`similar`).
//! - Anchor the resulting replacements to editor positions.
//! - Apply position-anchored edits to text.
//! - Render a unified diff preview (`diffy`).

mod diff;
mod error;

pub use diff::{DiffAlgorithm, OffsetEdit, compute_edits};
pub use error::EditError;

use diffy::PatchFormatter;
use modtidy_modfile::LineIndex;
use modtidy_types::{Position, Range, TextEdit};
use tracing::trace;

/// Translate byte-offset edits against `index`'s text into `TextEdit`s.
pub fn to_text_edits(index: &LineIndex, edits: &[OffsetEdit]) -> Result<Vec<TextEdit>, EditError> {
    edits
        .iter()
        .map(|edit| -> Result<TextEdit, EditError> {
            let position = |offset: usize| {
                index
                    .position(offset)
                    .ok_or(EditError::OffsetOutOfRange { offset })
            };
            Ok(TextEdit::new(
                Range::new(position(edit.start)?, position(edit.end)?),
                edit.new_text.clone(),
            ))
        })
        .collect()
}

/// Diff `index.text()` against `new` and anchor the result to positions.
pub fn diff_to_text_edits(
    index: &LineIndex,
    new: &str,
    algorithm: DiffAlgorithm,
) -> Result<Vec<TextEdit>, EditError> {
    let edits = compute_edits(index.text(), new, algorithm);
    trace!(edits = edits.len(), algorithm = algorithm.as_str(), "computed line diff");
    to_text_edits(index, &edits)
}

/// Apply edits to `content`.
///
/// Ranges refer to the original content. Edits are applied in range order;
/// insertions at the same position keep their given order. Overlapping
/// ranges are rejected.
pub fn apply_edits(content: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let index = LineIndex::new(content);
    let mut spans = Vec::with_capacity(edits.len());
    for edit in edits {
        let offset = |position: Position| {
            index
                .offset(position)
                .ok_or(EditError::PositionOutOfRange { position })
        };
        let (start, end) = (offset(edit.range.start)?, offset(edit.range.end)?);
        if end < start {
            return Err(EditError::PositionOutOfRange {
                position: edit.range.end,
            });
        }
        spans.push((start, end, edit));
    }
    spans.sort_by_key(|(start, end, _)| (*start, *end));

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    let mut previous: Option<&TextEdit> = None;
    for (start, end, edit) in spans {
        if start < cursor
            && let Some(first) = previous
        {
            return Err(EditError::Overlapping {
                first: first.range,
                second: edit.range,
            });
        }
        out.push_str(&content[cursor..start]);
        out.push_str(&edit.new_text);
        cursor = end;
        previous = Some(edit);
    }
    out.push_str(&content[cursor..]);
    Ok(out)
}

/// Unified diff of `old` → `new` with `label` in the file headers. Empty when
/// nothing changed.
pub fn render_patch(label: &str, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }
    let patch = diffy::create_patch(old, new);
    let body = PatchFormatter::new().fmt_patch(&patch).to_string();
    let header = format!("--- a/{label}\n+++ b/{label}\n");

    let mut out = body.replacen("--- original\n+++ modified\n", &header, 1);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
