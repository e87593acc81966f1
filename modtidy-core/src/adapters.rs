//! Default snapshot and analyzer implementations.

use crate::context::RequestContext;
use crate::error::AnalysisError;
use crate::ports::{Snapshot, TidyAnalyzer};
use crate::receipt::load_tidy_receipt;
use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use modtidy_types::{FileHandle, FileUri, TidyResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// In-memory overlay of files for embedding and testing.
///
/// Every `set_file` bumps the file's version, starting at 1.
pub struct InMemorySnapshot {
    manifest: Option<FileUri>,
    files: Mutex<BTreeMap<FileUri, (i32, String)>>,
    analyzer: Box<dyn TidyAnalyzer>,
}

impl InMemorySnapshot {
    pub fn new(analyzer: impl TidyAnalyzer + 'static) -> Self {
        Self {
            manifest: None,
            files: Mutex::new(BTreeMap::new()),
            analyzer: Box::new(analyzer),
        }
    }

    /// Store the manifest and make it the workspace manifest.
    pub fn with_manifest(mut self, uri: FileUri, content: impl Into<String>) -> Self {
        self.set_file(uri.clone(), content);
        self.manifest = Some(uri);
        self
    }

    pub fn with_file(self, uri: FileUri, content: impl Into<String>) -> Self {
        self.set_file(uri, content);
        self
    }

    /// Replace a file's content and return its new version.
    pub fn set_file(&self, uri: FileUri, content: impl Into<String>) -> i32 {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = files.entry(uri).or_insert((0, String::new()));
        entry.0 += 1;
        entry.1 = content.into();
        entry.0
    }
}

impl Snapshot for InMemorySnapshot {
    fn manifest_uri(&self) -> Option<FileUri> {
        self.manifest.clone()
    }

    fn get_file(&self, _ctx: &RequestContext, uri: &FileUri) -> anyhow::Result<FileHandle> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let (version, content) = files
            .get(uri)
            .ok_or_else(|| anyhow!("no such file: {uri}"))?;
        Ok(FileHandle::new(uri.clone(), *version, content.clone()))
    }

    fn analyzer(&self) -> &dyn TidyAnalyzer {
        self.analyzer.as_ref()
    }
}

/// Workspace files read from disk.
///
/// A file reports version 0 when first read. The version is bumped whenever a
/// later read sees different content, so version-keyed caches stay valid.
pub struct FsSnapshot {
    manifest: Utf8PathBuf,
    analyzer: Box<dyn TidyAnalyzer>,
    seen: Mutex<HashMap<FileUri, (i32, String)>>,
}

impl FsSnapshot {
    /// `manifest` is resolved against `root` when relative.
    pub fn new(root: &Utf8Path, manifest: &Utf8Path, analyzer: impl TidyAnalyzer + 'static) -> Self {
        let manifest = if manifest.is_absolute() {
            manifest.to_path_buf()
        } else {
            root.join(manifest)
        };
        Self {
            manifest,
            analyzer: Box::new(analyzer),
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn observe(&self, uri: &FileUri, sha256: String) -> i32 {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        match seen.get_mut(uri) {
            Some((version, hash)) if *hash == sha256 => *version,
            Some((version, hash)) => {
                *version += 1;
                *hash = sha256;
                debug!(%uri, version = *version, "file changed on disk");
                *version
            }
            None => {
                seen.insert(uri.clone(), (0, sha256));
                0
            }
        }
    }
}

impl Snapshot for FsSnapshot {
    fn manifest_uri(&self) -> Option<FileUri> {
        if !self.manifest.is_file() {
            debug!(path = %self.manifest, "manifest not found");
            return None;
        }
        Some(FileUri::from_path(&self.manifest))
    }

    fn get_file(&self, _ctx: &RequestContext, uri: &FileUri) -> anyhow::Result<FileHandle> {
        let path = uri
            .to_path()
            .ok_or_else(|| anyhow!("not a file uri: {uri}"))?;
        let content = fs::read_to_string(&path)?;
        let mut fh = FileHandle::new(uri.clone(), 0, content);
        fh.version = self.observe(uri, fh.identity().sha256);
        Ok(fh)
    }

    fn analyzer(&self) -> &dyn TidyAnalyzer {
        self.analyzer.as_ref()
    }
}

/// Analyzer backed by a JSON receipt. Without a receipt the analysis is
/// unsupported.
#[derive(Debug, Clone, Default)]
pub struct ReceiptTidy {
    receipt: Option<Utf8PathBuf>,
}

impl ReceiptTidy {
    pub fn new(receipt: Option<Utf8PathBuf>) -> Self {
        Self { receipt }
    }
}

impl TidyAnalyzer for ReceiptTidy {
    fn tidy(
        &self,
        _ctx: &RequestContext,
        _manifest: &FileHandle,
    ) -> Result<Arc<TidyResult>, AnalysisError> {
        let Some(path) = &self.receipt else {
            return Err(AnalysisError::Unsupported);
        };
        let result =
            load_tidy_receipt(path).with_context(|| format!("load tidy receipt {path}"))?;
        Ok(Arc::new(result))
    }
}

enum Script {
    Result(Arc<TidyResult>),
    Unsupported,
    Failure(String),
}

/// Analyzer returning a fixed outcome and counting calls.
pub struct ScriptedTidy {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedTidy {
    pub fn result(result: TidyResult) -> Self {
        Self::from_script(Script::Result(Arc::new(result)))
    }

    pub fn unsupported() -> Self {
        Self::from_script(Script::Unsupported)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_script(Script::Failure(message.into()))
    }

    fn from_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TidyAnalyzer for ScriptedTidy {
    fn tidy(
        &self,
        _ctx: &RequestContext,
        _manifest: &FileHandle,
    ) -> Result<Arc<TidyResult>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Result(result) => Ok(Arc::clone(result)),
            Script::Unsupported => Err(AnalysisError::Unsupported),
            Script::Failure(message) => Err(AnalysisError::Failed(anyhow!("{message}"))),
        }
    }
}

/// Memoizes another analyzer per manifest URI and version.
///
/// A result is reused only while the manifest version is unchanged. Failures
/// are not cached. The lock is never held while the wrapped analyzer runs.
pub struct CachedTidy<A> {
    inner: A,
    cache: Mutex<HashMap<FileUri, (i32, Arc<TidyResult>)>>,
}

impl<A: TidyAnalyzer> CachedTidy<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: TidyAnalyzer> TidyAnalyzer for CachedTidy<A> {
    fn tidy(
        &self,
        ctx: &RequestContext,
        manifest: &FileHandle,
    ) -> Result<Arc<TidyResult>, AnalysisError> {
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((version, result)) = cache.get(&manifest.uri)
                && *version == manifest.version
            {
                debug!(uri = %manifest.uri, version, "reusing tidy result");
                return Ok(Arc::clone(result));
            }
        }

        let result = self.inner.tidy(ctx, manifest)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest.uri.clone(), (manifest.version, Arc::clone(&result)));
        Ok(result)
    }
}
