//! Shared DTOs for the modtidy workspace.
//!
//! # Design constraints
//! - Editor-facing types serialize with camelCase field names.
//! - Collections that end up in output are ordered maps so results are deterministic.
//! - Prefer adding optional fields over changing semantics.

pub mod file;
pub mod position;
pub mod protocol;
pub mod tidy;

pub use file::{FileHandle, FileIdentity, FileUri};
pub use position::{Position, Range, compare_range};
pub use protocol::{
    CodeAction, CodeActionKind, Diagnostic, DiagnosticSeverity, TextDocumentEdit, TextEdit,
    VersionedTextDocumentIdentifier, WorkspaceEdit,
};
pub use tidy::{Requirement, SYNTAX_CATEGORY, SuggestedFix, TidyError, TidyResult};
