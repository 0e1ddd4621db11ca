use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::AnalyzeArgs;
use crate::model::{ArtifactEntry, InferenceArtifact, ModelKind, ResultRow};
use crate::util::sha256_hex;

/// Loader configuration derived from the command line: which rows survive
/// into the analysis table.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub accepted_topk: Vec<u32>,
    pub accepted_masks: Vec<String>,
    pub min_true_count: usize,
}

impl AnalysisConfig {
    pub fn from_args(args: &AnalyzeArgs) -> Self {
        Self {
            accepted_topk: vec![args.topk_mask],
            accepted_masks: args
                .mask_set
                .accepted_masks()
                .iter()
                .map(|mask| mask.to_string())
                .collect(),
            min_true_count: args.min_true_count,
        }
    }

    /// Whether a loaded row survives into the analysis table. Absent
    /// `topk_mask` is accepted so baseline rows are kept.
    pub fn accepts(&self, row: &ResultRow) -> bool {
        let topk_ok = match row.topk_mask {
            None => true,
            Some(topk) => self.accepted_topk.contains(&topk),
        };

        topk_ok && self.accepted_masks.iter().any(|mask| *mask == row.mask)
    }
}

/// List the regular files of a results directory, sorted for a deterministic
/// row order.
pub fn discover_artifact_files(results_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(results_dir)
        .with_context(|| format!("failed to read {}", results_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", results_dir.display()))?;
        let path = entry.path();

        if entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Deserialize one artifact file. `Ok(None)` means the file is not an
/// inference artifact and is skipped; a malformed artifact is a fatal error.
pub fn artifact_row(file_name: &str, raw: &[u8]) -> Result<Option<ResultRow>> {
    let Some(model) = ModelKind::from_artifact_name(file_name) else {
        return Ok(None);
    };

    let artifact: InferenceArtifact = serde_json::from_slice(raw)
        .with_context(|| format!("failed to parse inference artifact: {file_name}"))?;

    Ok(Some(ResultRow {
        model,
        data: artifact.data,
        tok: artifact.tok,
        mask: artifact.mask,
        topk_mask: artifact.topk_mask,
        preds: artifact.preds,
        labels: artifact.labels,
        masked_records: artifact.masked_records,
        masked_tokens: artifact.masked_tokens,
    }))
}

/// Load every recognized artifact into the analysis table and drop rows
/// outside the accepted `topk_mask`/`mask` sets. The returned `Vec` gives the
/// contiguous row indexing the metric stage writes back into.
pub fn load_results(
    files: &[PathBuf],
    config: &AnalysisConfig,
) -> Result<(Vec<ResultRow>, Vec<ArtifactEntry>)> {
    let mut rows = Vec::new();
    let mut artifacts = Vec::new();

    for path in files {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        let Some(row) = artifact_row(&file_name, &raw)? else {
            continue;
        };

        artifacts.push(ArtifactEntry {
            filename: file_name,
            model: row.model.as_str().to_string(),
            sha256: sha256_hex(&raw),
        });

        if config.accepts(&row) {
            rows.push(row);
        }
    }

    info!(
        artifact_count = artifacts.len(),
        loaded_rows = rows.len(),
        "loaded inference artifacts"
    );

    Ok((rows, artifacts))
}
