//! Parser and editor for go.mod-style dependency manifests.
//!
//! Responsibilities:
//! - Parse manifest text into a private syntax tree (directives, blocks, comments).
//! - Apply requirement edits (`add_require`, `drop_require`, `set_indirect`).
//! - Normalize blocks and print the canonical text.
//! - Map byte offsets to editor positions (`LineIndex`).
//!
//! Every mutation works on a `ModFile` the caller owns. Parsing the same text
//! twice yields two trees that share nothing.

mod error;
mod lex;
mod line_index;
mod modfile;
mod syntax;
mod version;

pub use error::ModFileError;
pub use line_index::LineIndex;
pub use modfile::{ModFile, Require};
pub use version::check_version;
