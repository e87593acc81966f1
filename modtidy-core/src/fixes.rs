//! Correlate caller diagnostics with the analysis' suggested fixes.

use crate::context::RequestContext;
use crate::error::CoreError;
use crate::ports::{Snapshot, read_file, run_tidy};
use modtidy_types::{
    CodeAction, CodeActionKind, Diagnostic, FileUri, SuggestedFix, TextDocumentEdit, TidyError,
    WorkspaceEdit, compare_range,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, debug_span};

/// Exact match on message, range and category. Nothing looser counts.
pub fn same_diagnostic(diagnostic: &Diagnostic, error: &TidyError) -> bool {
    diagnostic.message == error.message
        && compare_range(&diagnostic.range, &error.range) == Ordering::Equal
        && diagnostic.source == error.category
}

/// Code actions for the given diagnostics of `manifest_uri`.
///
/// Actions follow the caller's diagnostic order, then the analysis' fix
/// order. Each action resolves exactly one diagnostic. Edits are pinned to
/// the target file's version at the time it was resolved; failing to resolve
/// any target fails the whole request.
pub fn suggested_fixes(
    ctx: &RequestContext,
    snapshot: &dyn Snapshot,
    manifest_uri: &FileUri,
    diagnostics: &[Diagnostic],
) -> Result<Vec<CodeAction>, CoreError> {
    let span = debug_span!("mod.suggested_fixes", uri = %manifest_uri);
    let _enter = span.enter();

    let manifest = read_file(ctx, snapshot, manifest_uri)?;
    let Some(tidy) = run_tidy(ctx, snapshot, &manifest)? else {
        return Ok(Vec::new());
    };

    let mut by_message: HashMap<&str, Vec<&TidyError>> = HashMap::new();
    for error in &tidy.errors {
        by_message
            .entry(error.message.as_str())
            .or_default()
            .push(error);
    }

    let mut actions = Vec::new();
    for diagnostic in diagnostics {
        let Some(candidates) = by_message.get(diagnostic.message.as_str()) else {
            continue;
        };
        for error in candidates.iter().filter(|e| same_diagnostic(diagnostic, e)) {
            for fix in &error.suggested_fixes {
                actions.push(CodeAction {
                    title: fix.title.clone(),
                    kind: CodeActionKind::QuickFix,
                    diagnostics: vec![diagnostic.clone()],
                    edit: workspace_edit(ctx, snapshot, fix)?,
                });
            }
        }
    }

    debug!(
        requested = diagnostics.len(),
        actions = actions.len(),
        "correlated diagnostics"
    );
    Ok(actions)
}

fn workspace_edit(
    ctx: &RequestContext,
    snapshot: &dyn Snapshot,
    fix: &SuggestedFix,
) -> Result<WorkspaceEdit, CoreError> {
    let mut edit = WorkspaceEdit::default();
    for (uri, edits) in &fix.edits {
        let target = read_file(ctx, snapshot, uri)?;
        edit.document_changes.push(TextDocumentEdit {
            text_document: target.versioned_id(),
            edits: edits.clone(),
        });
    }
    Ok(edit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modtidy_types::{DiagnosticSeverity, Position, Range};

    fn range(line: u32) -> Range {
        Range::new(Position::new(line, 0), Position::new(line, 10))
    }

    fn error(message: &str, line: u32, category: &str) -> TidyError {
        TidyError {
            message: message.to_string(),
            range: range(line),
            category: category.to_string(),
            suggested_fixes: Vec::new(),
        }
    }

    fn diagnostic(message: &str, line: u32, source: &str) -> Diagnostic {
        Diagnostic {
            range: range(line),
            severity: DiagnosticSeverity::Warning,
            message: message.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn all_three_fields_must_match() {
        let e = error("unused a", 2, "tidy");
        assert!(same_diagnostic(&diagnostic("unused a", 2, "tidy"), &e));
        assert!(!same_diagnostic(&diagnostic("unused b", 2, "tidy"), &e));
        assert!(!same_diagnostic(&diagnostic("unused a", 3, "tidy"), &e));
        assert!(!same_diagnostic(&diagnostic("unused a", 2, "syntax"), &e));
    }

    #[test]
    fn severity_is_not_part_of_the_match() {
        let mut d = diagnostic("unused a", 2, "tidy");
        d.severity = DiagnosticSeverity::Hint;
        assert!(same_diagnostic(&d, &error("unused a", 2, "tidy")));
    }
}
