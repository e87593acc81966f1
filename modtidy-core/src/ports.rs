//! Port traits abstracting the snapshot and the tidy analysis away from the
//! operations.

use crate::context::RequestContext;
use crate::error::{AnalysisError, CoreError};
use anyhow::Context;
use modtidy_modfile::{LineIndex, ModFile, ModFileError};
use modtidy_types::{FileHandle, FileUri, TidyResult};
use std::sync::Arc;
use tracing::debug;

/// A manifest parsed once, together with its position mapper.
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub file: ModFile,
    pub mapper: LineIndex,
}

impl ParsedManifest {
    pub fn parse(content: &str) -> Result<Self, ModFileError> {
        Ok(Self {
            file: ModFile::parse(content)?,
            mapper: LineIndex::new(content),
        })
    }
}

/// Computes the minimal correct dependency set for a manifest.
pub trait TidyAnalyzer: Send + Sync {
    fn tidy(
        &self,
        ctx: &RequestContext,
        manifest: &FileHandle,
    ) -> Result<Arc<TidyResult>, AnalysisError>;
}

impl<T: TidyAnalyzer + ?Sized> TidyAnalyzer for Arc<T> {
    fn tidy(
        &self,
        ctx: &RequestContext,
        manifest: &FileHandle,
    ) -> Result<Arc<TidyResult>, AnalysisError> {
        (**self).tidy(ctx, manifest)
    }
}

/// Versioned view of the workspace files.
pub trait Snapshot: Send + Sync {
    /// The workspace manifest, if there is one.
    fn manifest_uri(&self) -> Option<FileUri>;

    /// Current handle for `uri`. Used for the manifest and for every file a
    /// suggested fix targets.
    fn get_file(&self, ctx: &RequestContext, uri: &FileUri) -> anyhow::Result<FileHandle>;

    fn parse_manifest(
        &self,
        _ctx: &RequestContext,
        manifest: &FileHandle,
    ) -> anyhow::Result<Arc<ParsedManifest>> {
        let parsed = ParsedManifest::parse(&manifest.content)
            .with_context(|| format!("parse {}", manifest.uri))?;
        Ok(Arc::new(parsed))
    }

    fn analyzer(&self) -> &dyn TidyAnalyzer;
}

/// Resolve `uri` to a live handle.
pub(crate) fn read_file(
    ctx: &RequestContext,
    snapshot: &dyn Snapshot,
    uri: &FileUri,
) -> Result<FileHandle, CoreError> {
    ctx.checkpoint()?;
    snapshot
        .get_file(ctx, uri)
        .with_context(|| format!("read {uri}"))
        .map_err(|e| ctx.upstream(e))
}

/// Run the analysis. `None` when it is unsupported.
pub(crate) fn run_tidy(
    ctx: &RequestContext,
    snapshot: &dyn Snapshot,
    manifest: &FileHandle,
) -> Result<Option<Arc<TidyResult>>, CoreError> {
    ctx.checkpoint()?;
    match snapshot.analyzer().tidy(ctx, manifest) {
        Ok(result) => Ok(Some(result)),
        Err(AnalysisError::Unsupported) => {
            debug!(uri = %manifest.uri, "tidy analysis unsupported");
            Ok(None)
        }
        Err(AnalysisError::Failed(err)) => Err(ctx.upstream(err.context("tidy analysis"))),
    }
}
