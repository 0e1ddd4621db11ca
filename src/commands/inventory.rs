use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{ArtifactEntry, ArtifactInventoryManifest, ModelKind};
use crate::util::{sha256_hex, utc_timestamp, write_manifest};

pub fn run(args: InventoryArgs) -> Result<()> {
    let results_dir = args.results_root.join(args.experiment.subdir());
    let manifest = build_manifest(&results_dir)?;

    if args.dry_run {
        info!(
            artifact_count = manifest.artifact_count,
            results_dir = %manifest.results_dir,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| results_dir.join("manifests").join("artifact_inventory.json"));

    write_manifest(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote artifact inventory manifest");
    info!(artifact_count = manifest.artifact_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(results_dir: &Path) -> Result<ArtifactInventoryManifest> {
    let files = super::analyze::discover_artifact_files(results_dir)?;

    let mut artifacts = Vec::new();
    for path in &files {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let Some(model) = ModelKind::from_artifact_name(&filename) else {
            continue;
        };

        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        artifacts.push(ArtifactEntry {
            filename,
            model: model.as_str().to_string(),
            sha256: sha256_hex(&raw),
        });
    }

    if artifacts.is_empty() {
        bail!("no inference artifacts found in {}", results_dir.display());
    }

    let count_for = |model: ModelKind| {
        artifacts
            .iter()
            .filter(|entry| entry.model == model.as_str())
            .count()
    };

    Ok(ArtifactInventoryManifest {
        manifest_version: 1,
        generated_at: utc_timestamp(),
        results_dir: results_dir.display().to_string(),
        artifact_count: artifacts.len(),
        bert_count: count_for(ModelKind::Bert),
        sbert_count: count_for(ModelKind::Sbert),
        ditto_count: count_for(ModelKind::Ditto),
        supcon_count: count_for(ModelKind::SupCon),
        artifacts,
    })
}
