//! Tidy errors as severity-tagged diagnostics.

use crate::context::RequestContext;
use crate::error::CoreError;
use crate::ports::{Snapshot, read_file, run_tidy};
use modtidy_types::{
    Diagnostic, DiagnosticSeverity, FileIdentity, Requirement, SYNTAX_CATEGORY, TidyError,
};
use std::collections::BTreeMap;
use tracing::{debug, debug_span};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsOutcome {
    /// Diagnostics per observed manifest state, in analysis order. A clean
    /// analysis still yields an entry with an empty list.
    pub reports: BTreeMap<FileIdentity, Vec<Diagnostic>>,
    /// Passed through from the analysis unchanged.
    pub missing_dependencies: BTreeMap<String, Requirement>,
}

impl DiagnosticsOutcome {
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty() && self.missing_dependencies.is_empty()
    }
}

/// Syntax errors are errors; everything else the analysis reports is a warning.
pub fn severity_for(category: &str) -> DiagnosticSeverity {
    if category == SYNTAX_CATEGORY {
        DiagnosticSeverity::Error
    } else {
        DiagnosticSeverity::Warning
    }
}

pub fn to_diagnostic(error: &TidyError) -> Diagnostic {
    Diagnostic {
        range: error.range,
        severity: severity_for(&error.category),
        message: error.message.clone(),
        source: error.category.clone(),
    }
}

/// Diagnostics for the workspace manifest.
///
/// Empty when there is no manifest or the analysis is unsupported.
pub fn diagnostics(
    ctx: &RequestContext,
    snapshot: &dyn Snapshot,
) -> Result<DiagnosticsOutcome, CoreError> {
    let Some(uri) = snapshot.manifest_uri() else {
        debug!("no manifest in workspace");
        return Ok(DiagnosticsOutcome::default());
    };
    let span = debug_span!("mod.diagnostics", uri = %uri);
    let _enter = span.enter();

    let manifest = read_file(ctx, snapshot, &uri)?;
    let Some(tidy) = run_tidy(ctx, snapshot, &manifest)? else {
        return Ok(DiagnosticsOutcome::default());
    };

    let diagnostics: Vec<_> = tidy.errors.iter().map(to_diagnostic).collect();
    debug!(count = diagnostics.len(), "classified tidy errors");

    let mut outcome = DiagnosticsOutcome {
        missing_dependencies: tidy.missing_dependencies.clone(),
        ..DiagnosticsOutcome::default()
    };
    outcome.reports.insert(manifest.identity(), diagnostics);
    Ok(outcome)
}
