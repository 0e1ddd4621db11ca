use anyhow::{Result, bail};
use chrono::Utc;
use tracing::info;

use super::load::{AnalysisConfig, discover_artifact_files, load_results};
use super::metrics::compute_performance;
use super::plot::{save_masking_plot, save_masking_pair_plot};
use super::report::{build_report, retained_datasets, write_report_csv};
use crate::cli::AnalyzeArgs;
use crate::model::AnalysisRunManifest;
use crate::util::{compact_timestamp, ensure_directory, utc_timestamp, write_manifest};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = utc_timestamp();
    let run_id = format!("run-{}", compact_timestamp(started_ts));

    let results_dir = args.results_root.join(args.experiment.subdir());
    let config = AnalysisConfig::from_args(&args);

    info!(results_dir = %results_dir.display(), run_id = %run_id, "starting analysis");

    let files = discover_artifact_files(&results_dir)?;
    let (rows, artifacts) = load_results(&files, &config)?;
    if rows.is_empty() {
        bail!(
            "no inference rows survived loading from {}",
            results_dir.display()
        );
    }

    let perf = compute_performance(&rows)?;

    let retained = retained_datasets(&perf, config.min_true_count);
    let report = build_report(&perf, &retained)?;
    info!(
        retained_datasets = retained.len(),
        report_rows = report.len(),
        "computed masked performance"
    );

    let report_csv_path = results_dir.join("report.csv");
    write_report_csv(&report_csv_path, &report)?;
    info!(path = %report_csv_path.display(), "wrote report csv");

    ensure_directory(&args.plot_dir)?;
    let single_plot_path = args.plot_dir.join("em_masking.svg");
    save_masking_plot(&report, "sent_pair", &single_plot_path)?;
    let pair_plot_path = args.plot_dir.join("sbert_masking_all.svg");
    save_masking_pair_plot(&report, &pair_plot_path)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        results_dir.join("manifests").join(format!(
            "analysis_run_{}.json",
            compact_timestamp(started_ts)
        ))
    });

    let manifest = AnalysisRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        started_at,
        updated_at: utc_timestamp(),
        command: render_analyze_command(&args),
        results_dir: results_dir.display().to_string(),
        artifact_count: artifacts.len(),
        loaded_rows: rows.len(),
        retained_datasets: retained,
        report_rows: report.len(),
        report_csv_path: report_csv_path.display().to_string(),
        plot_paths: vec![
            single_plot_path.display().to_string(),
            pair_plot_path.display().to_string(),
        ],
        artifacts,
    };

    write_manifest(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote analysis run manifest");
    info!(run_id = %run_id, "analysis completed");

    Ok(())
}

fn render_analyze_command(args: &AnalyzeArgs) -> String {
    let mut command = vec![
        "emrobust".to_string(),
        "analyze".to_string(),
        "--results-root".to_string(),
        args.results_root.display().to_string(),
        "--experiment".to_string(),
        args.experiment.as_str().to_string(),
        "--mask-set".to_string(),
        args.mask_set.as_str().to_string(),
        "--topk-mask".to_string(),
        args.topk_mask.to_string(),
        "--min-true-count".to_string(),
        args.min_true_count.to_string(),
        "--plot-dir".to_string(),
        args.plot_dir.display().to_string(),
    ];

    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
