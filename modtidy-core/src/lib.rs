//! Embeddable core library for modtidy.
//!
//! Turns a tidy analysis of a dependency manifest into editor-facing results.
//! Clap-free and I/O-abstracted.
//!
//! # Port traits
//!
//! All collaborators are abstracted behind port traits in [`ports`]:
//! - [`Snapshot`](ports::Snapshot): versioned workspace files and manifest parsing
//! - [`TidyAnalyzer`](ports::TidyAnalyzer): the tidy analysis
//!
//! The [`adapters`] module provides in-memory and filesystem implementations,
//! plus a version-keyed memoizing analyzer.
//!
//! # Entry points
//!
//! - [`diagnostics`](diagnostics::diagnostics): severity-tagged diagnostics
//! - [`suggested_fixes`](fixes::suggested_fixes): quick fixes for given diagnostics
//! - [`suggested_patches`](patches::suggested_patches): one edit per missing dependency

pub mod adapters;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod fixes;
pub mod patches;
pub mod ports;
pub mod receipt;
pub mod settings;

pub use context::{CancelToken, RequestContext};
pub use diagnostics::{DiagnosticsOutcome, diagnostics};
pub use error::{AnalysisError, CoreError};
pub use fixes::suggested_fixes;
pub use patches::suggested_patches;
pub use receipt::{ReceiptLoadError, load_tidy_receipt};
pub use settings::CoreSettings;
