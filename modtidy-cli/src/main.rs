mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use config::{CliOverrides, ConfigMerger};
use fs_err as fs;
use modtidy_core::adapters::{CachedTidy, FsSnapshot, ReceiptTidy};
use modtidy_core::ports::Snapshot;
use modtidy_core::{CoreError, CoreSettings, diagnostics, suggested_fixes, suggested_patches};
use modtidy_edit::{DiffAlgorithm, apply_edits, render_patch};
use modtidy_types::{Diagnostic, FileHandle, FileUri, Requirement, TextDocumentEdit};
use serde::Serialize;
use std::collections::BTreeMap;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "modtidy",
    version,
    about = "Diagnostics, quick fixes and missing-dependency patches for go.mod manifests."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report tidy errors as diagnostics.
    Diagnostics(DiagnosticsArgs),
    /// Produce quick fixes for the given diagnostics.
    Fixes(FixesArgs),
    /// Produce one manifest edit per missing dependency.
    Patches(PatchesArgs),
}

#[derive(Debug, Args)]
struct WorkspaceArgs {
    /// Workspace root (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Manifest path, relative to the root.
    #[arg(long, default_value = "go.mod")]
    manifest: Utf8PathBuf,

    /// Tidy receipt (JSON). Without one the analysis is unsupported.
    #[arg(long)]
    tidy: Option<Utf8PathBuf>,

    /// Per-request deadline in milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Line diff algorithm (myers, patience, lcs).
    #[arg(long)]
    diff_algorithm: Option<DiffAlgorithm>,

    /// Do not memoize the analysis.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Write JSON output to this file instead of stdout.
    #[arg(long)]
    out: Option<Utf8PathBuf>,
}

#[derive(Debug, Args)]
struct DiagnosticsArgs {
    #[command(flatten)]
    workspace: WorkspaceArgs,
}

#[derive(Debug, Args)]
struct FixesArgs {
    #[command(flatten)]
    workspace: WorkspaceArgs,

    /// JSON array of diagnostics to find fixes for.
    #[arg(long)]
    diagnostics: Utf8PathBuf,
}

#[derive(Debug, Args)]
struct PatchesArgs {
    #[command(flatten)]
    workspace: WorkspaceArgs,

    /// Print a unified diff per dependency instead of JSON.
    #[arg(long, default_value_t = false)]
    diff: bool,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        let code = e.downcast_ref::<CoreError>().map_or(1, CoreError::exit_code);
        error!("{:?}", e);
        return ExitCode::from(code);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Diagnostics(args) => cmd_diagnostics(args),
        Command::Fixes(args) => cmd_fixes(args),
        Command::Patches(args) => cmd_patches(args),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticsReport<'a> {
    files: Vec<FileReport<'a>>,
    missing_dependencies: &'a BTreeMap<String, Requirement>,
}

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    uri: &'a FileUri,
    sha256: &'a str,
    diagnostics: &'a [Diagnostic],
}

fn cmd_diagnostics(args: DiagnosticsArgs) -> anyhow::Result<()> {
    let (snapshot, settings) = open_workspace(&args.workspace)?;
    let ctx = settings.request_context();

    let outcome = diagnostics(&ctx, &snapshot)?;
    let report = DiagnosticsReport {
        files: outcome
            .reports
            .iter()
            .map(|(identity, diagnostics)| FileReport {
                uri: &identity.uri,
                sha256: &identity.sha256,
                diagnostics,
            })
            .collect(),
        missing_dependencies: &outcome.missing_dependencies,
    };
    emit_json(args.workspace.out.as_deref(), &report)
}

fn cmd_fixes(args: FixesArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.diagnostics)
        .with_context(|| format!("read {}", args.diagnostics))?;
    let requested: Vec<Diagnostic> = serde_json::from_str(&text)
        .with_context(|| format!("parse diagnostics {}", args.diagnostics))?;

    let (snapshot, settings) = open_workspace(&args.workspace)?;
    let ctx = settings.request_context();

    let actions = match snapshot.manifest_uri() {
        Some(uri) => suggested_fixes(&ctx, &snapshot, &uri, &requested)?,
        None => {
            debug!("no manifest; no fixes");
            Vec::new()
        }
    };
    emit_json(args.workspace.out.as_deref(), &actions)
}

fn cmd_patches(args: PatchesArgs) -> anyhow::Result<()> {
    let (snapshot, settings) = open_workspace(&args.workspace)?;
    let ctx = settings.request_context();

    let patches = suggested_patches(&ctx, &snapshot, &settings)?;
    if !args.diff {
        return emit_json(args.workspace.out.as_deref(), &patches);
    }

    let Some(uri) = snapshot.manifest_uri() else {
        return Ok(());
    };
    let manifest = snapshot.get_file(&ctx, &uri)?;
    let out = render_previews(args.workspace.manifest.as_str(), &manifest, &patches)?;
    emit_text(args.workspace.out.as_deref(), &out)
}

/// Unified diff per patch. Patches must be pinned to `manifest`'s version.
fn render_previews(
    label: &str,
    manifest: &FileHandle,
    patches: &BTreeMap<String, TextDocumentEdit>,
) -> anyhow::Result<String> {
    let mut out = String::new();
    for (name, patch) in patches {
        let pinned = patch.text_document.version;
        if pinned != manifest.version {
            anyhow::bail!(
                "{} changed while patches were computed (version {pinned}, now {})",
                manifest.uri,
                manifest.version
            );
        }
        let updated = apply_edits(&manifest.content, &patch.edits)
            .with_context(|| format!("apply patch for {name}"))?;
        out.push_str(&format!("# {name}\n"));
        out.push_str(&render_patch(label, &manifest.content, &updated));
    }
    Ok(out)
}

fn open_workspace(args: &WorkspaceArgs) -> anyhow::Result<(FsSnapshot, CoreSettings)> {
    let root = args
        .root
        .canonicalize_utf8()
        .with_context(|| format!("resolve workspace root {}", args.root))?;
    let file_config = config::load_or_default(&root).context("load modtidy.toml config")?;
    let merged = ConfigMerger::new(file_config).merge(CliOverrides {
        diff_algorithm: args.diff_algorithm,
        deadline_ms: args.deadline_ms,
        no_cache: args.no_cache,
        receipt: args.tidy.clone(),
    });

    debug!(
        "merged config: diff_algorithm={}, cache={}, deadline={:?}, receipt={:?}",
        merged.settings.diff_algorithm.as_str(),
        merged.settings.cache_analysis,
        merged.settings.deadline,
        merged.receipt
    );

    let analyzer = ReceiptTidy::new(merged.receipt.map(|p| abs_path(&root, &p)));
    let snapshot = if merged.settings.cache_analysis {
        FsSnapshot::new(&root, &args.manifest, CachedTidy::new(analyzer))
    } else {
        FsSnapshot::new(&root, &args.manifest, analyzer)
    };
    Ok((snapshot, merged.settings))
}

fn abs_path(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn emit_json<T: Serialize>(out: Option<&Utf8Path>, value: &T) -> anyhow::Result<()> {
    let mut s = serde_json::to_string_pretty(value).context("serialize json")?;
    s.push('\n');
    emit_text(out, &s)
}

fn emit_text(out: Option<&Utf8Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("write {}", path))?;
            info!("wrote {}", path);
        }
        None => print!("{text}"),
    }
    Ok(())
}
