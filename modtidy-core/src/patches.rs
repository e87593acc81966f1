//! Minimal manifest edits adding each missing dependency.

use crate::context::RequestContext;
use crate::error::CoreError;
use crate::ports::{Snapshot, read_file, run_tidy};
use crate::settings::CoreSettings;
use anyhow::Context;
use modtidy_edit::{DiffAlgorithm, compute_edits, to_text_edits};
use modtidy_modfile::{LineIndex, ModFile};
use modtidy_types::{Requirement, TextDocumentEdit, TextEdit};
use std::collections::BTreeMap;
use tracing::{debug, debug_span};

/// One edit per missing dependency, keyed by dependency name.
///
/// Every edit is computed against the original manifest text on its own
/// freshly parsed tree, so edits never see each other. All edits carry the
/// manifest version read at the start of the request. The first failure
/// aborts the batch.
pub fn suggested_patches(
    ctx: &RequestContext,
    snapshot: &dyn Snapshot,
    settings: &CoreSettings,
) -> Result<BTreeMap<String, TextDocumentEdit>, CoreError> {
    let mut patches = BTreeMap::new();
    let Some(uri) = snapshot.manifest_uri() else {
        debug!("no manifest in workspace");
        return Ok(patches);
    };
    let span = debug_span!("mod.suggested_patches", uri = %uri);
    let _enter = span.enter();

    let manifest = read_file(ctx, snapshot, &uri)?;
    let Some(tidy) = run_tidy(ctx, snapshot, &manifest)? else {
        return Ok(patches);
    };
    if tidy.missing_dependencies.is_empty() {
        debug!("no missing dependencies");
        return Ok(patches);
    }

    ctx.checkpoint()?;
    let parsed = snapshot
        .parse_manifest(ctx, &manifest)
        .map_err(|e| ctx.upstream(e))?;

    for (name, requirement) in &tidy.missing_dependencies {
        ctx.checkpoint()?;
        let edits = patch_for(
            &manifest.content,
            &parsed.mapper,
            requirement,
            settings.diff_algorithm,
        )
        .with_context(|| format!("synthesize patch for {name}"))
        .map_err(|e| ctx.upstream(e))?;

        debug!(dependency = %name, version = %requirement.version, edits = edits.len(), "synthesized patch");
        patches.insert(
            name.clone(),
            TextDocumentEdit {
                text_document: manifest.versioned_id(),
                edits,
            },
        );
    }
    Ok(patches)
}

/// Edits turning `original` into its canonical form with `requirement` added.
///
/// `mapper` must index `original`.
pub fn patch_for(
    original: &str,
    mapper: &LineIndex,
    requirement: &Requirement,
    algorithm: DiffAlgorithm,
) -> anyhow::Result<Vec<TextEdit>> {
    let mut file = ModFile::parse(original).context("re-parse manifest")?;
    file.add_require(&requirement.path, &requirement.version)?;
    if requirement.indirect {
        file.set_indirect(&requirement.path, true);
    }
    file.sort_blocks();
    let updated = file.format();

    let edits = compute_edits(original, &updated, algorithm);
    Ok(to_text_edits(mapper, &edits)?)
}
