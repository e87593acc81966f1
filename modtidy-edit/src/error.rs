//! Error types for modtidy-edit.

use modtidy_types::{Position, Range};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A byte offset produced by the diff does not fall on a character of the
    /// original text.
    #[error("offset {offset} is outside the document")]
    OffsetOutOfRange { offset: usize },

    #[error("position {}:{} is outside the document", .position.line, .position.character)]
    PositionOutOfRange { position: Position },

    #[error(
        "edits overlap at {}:{}..{}:{}",
        .second.start.line, .second.start.character, .second.end.line, .second.end.character
    )]
    Overlapping { first: Range, second: Range },
}
