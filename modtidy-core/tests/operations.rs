//! End-to-end behaviour of the three operations over an in-memory snapshot.

use modtidy_core::adapters::{CachedTidy, InMemorySnapshot, ScriptedTidy};
use modtidy_core::ports::{Snapshot, TidyAnalyzer};
use modtidy_core::{
    AnalysisError, CancelToken, CoreError, CoreSettings, RequestContext, diagnostics,
    suggested_fixes, suggested_patches,
};
use modtidy_edit::apply_edits;
use modtidy_modfile::ModFile;
use modtidy_types::{
    CodeActionKind, Diagnostic, DiagnosticSeverity, FileHandle, FileUri, Position, Range,
    Requirement, SuggestedFix, TextEdit, TidyError, TidyResult,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

const MANIFEST: &str = "file:///w/go.mod";
const OTHER: &str = "file:///w/main.go";

fn manifest_uri() -> FileUri {
    FileUri::new(MANIFEST)
}

fn range(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

fn tidy_error(message: &str, range: Range, category: &str, fixes: Vec<SuggestedFix>) -> TidyError {
    TidyError {
        message: message.to_string(),
        range,
        category: category.to_string(),
        suggested_fixes: fixes,
    }
}

fn fix(title: &str, targets: &[(&str, &str)]) -> SuggestedFix {
    let mut edits = BTreeMap::new();
    for (uri, text) in targets {
        edits.insert(
            FileUri::new(*uri),
            vec![TextEdit::new(range(0, 0, 0), *text)],
        );
    }
    SuggestedFix {
        title: title.to_string(),
        edits,
    }
}

fn as_diagnostic(error: &TidyError) -> Diagnostic {
    Diagnostic {
        range: error.range,
        severity: DiagnosticSeverity::Warning,
        message: error.message.clone(),
        source: error.category.clone(),
    }
}

fn missing(deps: &[(&str, &str)]) -> TidyResult {
    let mut result = TidyResult::default();
    for (path, version) in deps {
        result
            .missing_dependencies
            .insert(path.to_string(), Requirement::new(*path, *version));
    }
    result
}

fn snapshot(content: &str, result: TidyResult) -> InMemorySnapshot {
    InMemorySnapshot::new(ScriptedTidy::result(result)).with_manifest(manifest_uri(), content)
}

fn ctx() -> RequestContext {
    RequestContext::new()
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[test]
fn diagnostics_classify_by_category_and_keep_order() {
    let mut result = missing(&[("b", "v2.0.0")]);
    result.errors = vec![
        tidy_error("unused a", range(2, 0, 16), "tidy", vec![]),
        tidy_error("unexpected token", range(0, 0, 3), "syntax", vec![]),
    ];
    let snap = snapshot("module m\n\nrequire a v1.0.0\n", result);

    let outcome = diagnostics(&ctx(), &snap).unwrap();
    let identity = FileHandle::new(manifest_uri(), 1, "module m\n\nrequire a v1.0.0\n").identity();
    let diags = &outcome.reports[&identity];

    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].severity, DiagnosticSeverity::Warning);
    assert_eq!(diags[0].message, "unused a");
    assert_eq!(diags[1].severity, DiagnosticSeverity::Error);
    assert_eq!(diags[1].source, "syntax");
    assert_eq!(outcome.missing_dependencies["b"].version, "v2.0.0");
}

#[test]
fn clean_analysis_still_reports_the_manifest() {
    let snap = snapshot("module m\n", TidyResult::default());
    let outcome = diagnostics(&ctx(), &snap).unwrap();
    assert_eq!(outcome.reports.len(), 1);
    assert!(outcome.reports.values().all(Vec::is_empty));
}

#[test]
fn no_manifest_means_empty_results() {
    let snap = InMemorySnapshot::new(ScriptedTidy::result(missing(&[("b", "v1.0.0")])));
    assert!(diagnostics(&ctx(), &snap).unwrap().is_empty());
    assert!(
        suggested_patches(&ctx(), &snap, &CoreSettings::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn unsupported_analysis_empties_all_three_operations() {
    let snap = InMemorySnapshot::new(ScriptedTidy::unsupported())
        .with_manifest(manifest_uri(), "module m\n");
    let diag = Diagnostic {
        range: range(0, 0, 1),
        severity: DiagnosticSeverity::Error,
        message: "x".to_string(),
        source: "syntax".to_string(),
    };

    assert!(diagnostics(&ctx(), &snap).unwrap().is_empty());
    assert!(
        suggested_fixes(&ctx(), &snap, &manifest_uri(), &[diag])
            .unwrap()
            .is_empty()
    );
    assert!(
        suggested_patches(&ctx(), &snap, &CoreSettings::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn analysis_failure_is_upstream() {
    let snap = InMemorySnapshot::new(ScriptedTidy::failing("go command crashed"))
        .with_manifest(manifest_uri(), "module m\n");
    let err = diagnostics(&ctx(), &snap).unwrap_err();
    assert!(matches!(err, CoreError::Upstream(_)));
    assert!(err.to_string().contains("go command crashed"), "{err}");
}

// ---------------------------------------------------------------------------
// Suggested fixes
// ---------------------------------------------------------------------------

#[test]
fn exact_match_yields_one_action_per_fix() {
    let error = tidy_error(
        "unused a",
        range(2, 0, 16),
        "tidy",
        vec![
            fix("Remove dependency: a", &[(MANIFEST, "")]),
            fix("Keep and mark indirect", &[(MANIFEST, "// indirect")]),
        ],
    );
    let mut result = TidyResult::default();
    result.errors = vec![error.clone()];
    let snap = snapshot("module m\n\nrequire a v1.0.0\n", result);
    snap.set_file(manifest_uri(), "module m\n\nrequire a v1.0.0\n");

    let actions = suggested_fixes(&ctx(), &snap, &manifest_uri(), &[as_diagnostic(&error)]).unwrap();
    let titles: Vec<_> = actions.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["Remove dependency: a", "Keep and mark indirect"]);
    for action in &actions {
        assert_eq!(action.kind, CodeActionKind::QuickFix);
        assert_eq!(action.diagnostics, vec![as_diagnostic(&error)]);
        let change = &action.edit.document_changes[0];
        assert_eq!(change.text_document.uri, manifest_uri());
        assert_eq!(change.text_document.version, 2);
    }
}

#[test]
fn changing_any_field_breaks_the_match() {
    let error = tidy_error(
        "unused a",
        range(2, 0, 16),
        "tidy",
        vec![fix("Remove", &[(MANIFEST, "")])],
    );
    let mut result = TidyResult::default();
    result.errors = vec![error.clone()];
    let snap = snapshot("module m\n", result);

    let base = as_diagnostic(&error);
    let mut other_message = base.clone();
    other_message.message = "unused b".to_string();
    let mut other_range = base.clone();
    other_range.range = range(2, 0, 15);
    let mut other_source = base.clone();
    other_source.source = "syntax".to_string();

    for diag in [other_message, other_range, other_source] {
        let actions = suggested_fixes(&ctx(), &snap, &manifest_uri(), &[diag]).unwrap();
        assert!(actions.is_empty());
    }
    assert_eq!(
        suggested_fixes(&ctx(), &snap, &manifest_uri(), &[base])
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn shared_message_with_third_range_matches_nothing() {
    let mut result = TidyResult::default();
    result.errors = vec![
        tidy_error("dup", range(1, 0, 4), "tidy", vec![fix("A", &[(MANIFEST, "")])]),
        tidy_error("dup", range(3, 0, 4), "tidy", vec![fix("B", &[(MANIFEST, "")])]),
    ];
    let snap = snapshot("module m\n", result);
    let diag = Diagnostic {
        range: range(5, 0, 4),
        severity: DiagnosticSeverity::Warning,
        message: "dup".to_string(),
        source: "tidy".to_string(),
    };
    assert!(
        suggested_fixes(&ctx(), &snap, &manifest_uri(), &[diag])
            .unwrap()
            .is_empty()
    );
}

#[test]
fn actions_follow_caller_order_and_pin_each_target_version() {
    let first = tidy_error("one", range(1, 0, 3), "tidy", vec![fix("fix one", &[(MANIFEST, "x")])]);
    let second = tidy_error(
        "two",
        range(2, 0, 3),
        "tidy",
        vec![fix("fix two", &[(MANIFEST, "y"), (OTHER, "z")])],
    );
    let mut result = TidyResult::default();
    result.errors = vec![first.clone(), second.clone()];
    let snap = snapshot("module m\n", result).with_file(FileUri::new(OTHER), "package main\n");
    snap.set_file(FileUri::new(OTHER), "package main\n\nfunc main() {}\n");

    let actions = suggested_fixes(
        &ctx(),
        &snap,
        &manifest_uri(),
        &[as_diagnostic(&second), as_diagnostic(&first)],
    )
    .unwrap();

    assert_eq!(actions[0].title, "fix two");
    assert_eq!(actions[1].title, "fix one");
    let versions: Vec<_> = actions[0]
        .edit
        .document_changes
        .iter()
        .map(|c| (c.text_document.uri.as_str(), c.text_document.version))
        .collect();
    assert_eq!(versions, [(MANIFEST, 1), (OTHER, 2)]);
}

#[test]
fn unresolvable_fix_target_fails_the_request() {
    let error = tidy_error(
        "unused a",
        range(2, 0, 16),
        "tidy",
        vec![fix("Remove", &[("file:///w/missing.go", "")])],
    );
    let mut result = TidyResult::default();
    result.errors = vec![error.clone()];
    let snap = snapshot("module m\n", result);

    let err = suggested_fixes(&ctx(), &snap, &manifest_uri(), &[as_diagnostic(&error)]).unwrap_err();
    assert!(matches!(err, CoreError::Upstream(_)));
    assert!(err.to_string().contains("missing.go"), "{err}");
}

// ---------------------------------------------------------------------------
// Suggested patches
// ---------------------------------------------------------------------------

#[test]
fn single_line_require_scenario() {
    let original = "module m\n\nrequire a v1.0.0\n";
    let snap = snapshot(original, missing(&[("b", "v2.0.0")]));

    let patches = suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap();
    assert_eq!(patches.len(), 1);
    let patch = &patches["b"];
    assert_eq!(patch.text_document.uri, manifest_uri());
    assert_eq!(patch.text_document.version, 1);
    assert_eq!(patch.edits.len(), 1);

    let updated = apply_edits(original, &patch.edits).unwrap();
    assert_eq!(updated, "module m\n\nrequire (\n\ta v1.0.0\n\tb v2.0.0\n)\n");
}

#[test]
fn no_missing_dependencies_means_no_patches() {
    let mut result = TidyResult::default();
    result.errors = vec![tidy_error("unused a", range(2, 0, 16), "tidy", vec![])];
    let snap = snapshot("module m\n\nrequire a v1.0.0\n", result);
    assert!(
        suggested_patches(&ctx(), &snap, &CoreSettings::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn each_patch_adds_its_dependency_and_is_stable() {
    let original = "module m\n\ngo 1.22\n\nrequire (\n\texample.com/a v1.0.0\n\texample.com/z v1.0.0\n)\n";
    let snap = snapshot(
        original,
        missing(&[("example.com/b", "v0.2.0"), ("example.com/q", "v3.1.4")]),
    );
    let patches = suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap();

    for (name, patch) in &patches {
        let updated = apply_edits(original, &patch.edits).unwrap();
        let mut file = ModFile::parse(&updated).unwrap();
        let found = file.require(name).expect("requirement present");
        assert!(found.version.starts_with('v'));
        file.sort_blocks();
        assert_eq!(file.format(), updated, "{name} output is already canonical");
    }
    assert_eq!(
        patches["example.com/q"].edits,
        vec![TextEdit::new(
            Range::new(Position::new(6, 0), Position::new(6, 0)),
            "\texample.com/q v3.1.4\n"
        )]
    );
}

#[test]
fn isolated_patches_compose_to_the_combined_mutation() {
    let original = "module m\n\nrequire (\n\ta v1.0.0\n\tm v1.0.0\n\tz v1.0.0\n)\n";
    let snap = snapshot(original, missing(&[("b", "v1.1.0"), ("y", "v2.0.0")]));
    let patches = suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap();

    let mut combined = ModFile::parse(original).unwrap();
    combined.add_require("b", "v1.1.0").unwrap();
    combined.add_require("y", "v2.0.0").unwrap();
    combined.sort_blocks();
    let expected = combined.format();

    let b = patches["b"].edits.clone();
    let y = patches["y"].edits.clone();
    let forward: Vec<_> = b.iter().chain(&y).cloned().collect();
    let backward: Vec<_> = y.iter().chain(&b).cloned().collect();
    assert_eq!(apply_edits(original, &forward).unwrap(), expected);
    assert_eq!(apply_edits(original, &backward).unwrap(), expected);

    // Apply one, then re-synthesize the other against the result.
    let after_b = apply_edits(original, &b).unwrap();
    let resynth = snapshot(&after_b, missing(&[("y", "v2.0.0")]));
    let y_again = suggested_patches(&ctx(), &resynth, &CoreSettings::default()).unwrap();
    assert_eq!(apply_edits(&after_b, &y_again["y"].edits).unwrap(), expected);
}

#[test]
fn invalid_requirement_aborts_the_batch() {
    let snap = snapshot(
        "module m\n",
        missing(&[("a", "v1.0.0"), ("b", "not-a-version")]),
    );
    let err = suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap_err();
    assert!(matches!(err, CoreError::Upstream(_)));
    assert!(err.to_string().contains("synthesize patch for b"), "{err}");
}

#[test]
fn unparsable_manifest_aborts() {
    let snap = snapshot("module m\nrequire (\n", missing(&[("a", "v1.0.0")]));
    let err = suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap_err();
    assert!(matches!(err, CoreError::Upstream(_)));
}

// ---------------------------------------------------------------------------
// Cancellation and deadlines
// ---------------------------------------------------------------------------

#[test]
fn cancelled_requests_report_cancellation() {
    let snap = snapshot("module m\n", missing(&[("a", "v1.0.0")]));
    let token = CancelToken::new();
    token.cancel();
    let ctx = RequestContext::new().with_cancel(token);

    assert!(matches!(diagnostics(&ctx, &snap), Err(CoreError::Cancelled)));
    assert!(matches!(
        suggested_fixes(&ctx, &snap, &manifest_uri(), &[]),
        Err(CoreError::Cancelled)
    ));
    assert!(matches!(
        suggested_patches(&ctx, &snap, &CoreSettings::default()),
        Err(CoreError::Cancelled)
    ));
}

#[test]
fn elapsed_deadline_reports_deadline_exceeded() {
    let snap = snapshot("module m\n", missing(&[("a", "v1.0.0")]));
    let ctx = RequestContext::new().with_deadline(Instant::now());
    let err = suggested_patches(&ctx, &snap, &CoreSettings::default()).unwrap_err();
    assert!(matches!(err, CoreError::DeadlineExceeded));
    assert!(err.is_interrupted());
}

/// Cancels the request while "running" and then fails.
struct CancelDuringTidy;

impl TidyAnalyzer for CancelDuringTidy {
    fn tidy(
        &self,
        ctx: &RequestContext,
        _manifest: &FileHandle,
    ) -> Result<Arc<TidyResult>, AnalysisError> {
        ctx.cancel_token().cancel();
        Err(AnalysisError::Failed(anyhow::anyhow!("context canceled")))
    }
}

#[test]
fn failure_after_cancellation_is_not_upstream() {
    let snap = InMemorySnapshot::new(CancelDuringTidy).with_manifest(manifest_uri(), "module m\n");
    let err = diagnostics(&RequestContext::new(), &snap).unwrap_err();
    assert!(matches!(err, CoreError::Cancelled));
}

// ---------------------------------------------------------------------------
// Memoized analysis
// ---------------------------------------------------------------------------

#[test]
fn cached_analysis_is_reused_until_the_manifest_changes() {
    let inner = Arc::new(ScriptedTidy::result(missing(&[("b", "v2.0.0")])));
    let snap = InMemorySnapshot::new(CachedTidy::new(Arc::clone(&inner)))
        .with_manifest(manifest_uri(), "module m\n");

    diagnostics(&ctx(), &snap).unwrap();
    suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap();
    assert_eq!(inner.calls(), 1);

    snap.set_file(manifest_uri(), "module m\n\ngo 1.22\n");
    let patches = suggested_patches(&ctx(), &snap, &CoreSettings::default()).unwrap();
    assert_eq!(inner.calls(), 2);
    assert_eq!(patches["b"].text_document.version, 2);
}

#[test]
fn snapshot_trait_objects_are_usable() {
    let snap: Box<dyn Snapshot> = Box::new(snapshot("module m\n", TidyResult::default()));
    assert_eq!(snap.manifest_uri(), Some(manifest_uri()));
    assert!(diagnostics(&ctx(), snap.as_ref()).is_ok());
}
