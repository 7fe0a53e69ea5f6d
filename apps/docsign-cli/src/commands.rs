//! Subcommand implementations, kept out of `main` so tests can drive them

use anyhow::{bail, Context};
use docsign_core::{
    prepare_view, ActorDescriptor, Document, Identity, ResolverOptions, SigningView,
};
use pdfjoin_core::{EngineOptions, EntrySummary, MergeEngine, MergeProgress, SourceFile};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid document JSON: {}", path.display()))
}

pub fn load_actor(path: &Path) -> anyhow::Result<Identity> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read actor: {}", path.display()))?;
    let descriptor: ActorDescriptor = serde_json::from_str(&content)
        .with_context(|| format!("Invalid actor JSON: {}", path.display()))?;
    Ok(descriptor.into())
}

/// `docsign project`: the signing view for one document and actor
pub fn run_project(
    document: &Path,
    actor: &Path,
    options: ResolverOptions,
) -> anyhow::Result<SigningView> {
    let document = load_document(document)?;
    let identity = load_actor(actor)?;
    Ok(prepare_view(&document, &identity, options))
}

/// Inputs of `docsign merge`
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub base: PathBuf,
    /// Each group becomes one history entry, applied in order
    pub groups: Vec<Vec<PathBuf>>,
    /// History entry to remove after all groups are applied
    pub drop: Option<usize>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub output: PathBuf,
    pub page_count: u32,
    pub entries: Vec<EntrySummary>,
}

/// Split a `--group` value (`a.pdf,b.pdf`) into paths
pub fn parse_group(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// `docsign merge`: apply each group to the base, optionally drop one, write the result
pub async fn run_merge<F>(
    request: &MergeRequest,
    options: EngineOptions,
    mut progress: F,
) -> anyhow::Result<MergeReport>
where
    F: FnMut(MergeProgress),
{
    if request.groups.is_empty() {
        bail!("At least one --group is required");
    }

    let base = read_pdf(&request.base).await?;
    let engine = MergeEngine::new(base.bytes, options).context("Invalid base PDF")?;

    for (i, group) in request.groups.iter().enumerate() {
        let mut files = Vec::with_capacity(group.len());
        for path in group {
            files.push(read_pdf(path).await?);
        }
        engine
            .append_with_progress(files, &mut progress)
            .await
            .with_context(|| format!("Merge of group {} failed", i + 1))?;
    }

    if let Some(index) = request.drop {
        engine
            .remove(index)
            .await
            .with_context(|| format!("Could not drop history entry {}", index))?;
    }

    let bytes = engine.current().await;
    tokio::fs::write(&request.output, &bytes)
        .await
        .with_context(|| format!("Failed to write output: {}", request.output.display()))?;

    let report = MergeReport {
        output: request.output.clone(),
        page_count: engine.page_count().await,
        entries: engine.entries().await,
    };
    info!(
        output = %request.output.display(),
        page_count = report.page_count,
        entries = report.entries.len(),
        "merged PDF written"
    );
    Ok(report)
}

async fn read_pdf(path: &Path) -> anyhow::Result<SourceFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(name, bytes))
}
