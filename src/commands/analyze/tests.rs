use super::load::{AnalysisConfig, artifact_row};
use super::metrics::{binary_f1, common_group_masks, compute_performance};
use super::plot::grouped_f1;
use super::report::{
    CategoryOrder, build_report, ordered_categorical_sort, remap_masking, retained_datasets,
    write_report_csv_to,
};
use crate::model::{ModelKind, ReportRecord, ResultRow};
use crate::util::sha256_hex;

fn row(model: ModelKind, mask: &str, topk_mask: Option<u32>) -> ResultRow {
    ResultRow {
        model,
        data: "Structured_Fodors-Zagats".to_string(),
        tok: "sent_pair".to_string(),
        mask: mask.to_string(),
        topk_mask,
        preds: vec![1, 0, 1],
        labels: vec![1, 0, 0],
        masked_records: vec![true, true, true],
        masked_tokens: vec![3, 3, 3],
    }
}

fn scenario_group() -> Vec<ResultRow> {
    let baseline = row(ModelKind::Bert, "off", None);

    let mut syn = row(ModelKind::Bert, "maskSyn", Some(2));
    syn.masked_records = vec![true, true, false];
    syn.masked_tokens = vec![3, 1, 0];

    let mut sem = row(ModelKind::Bert, "maskSem", Some(2));
    sem.masked_records = vec![true, false, true];
    sem.masked_tokens = vec![2, 0, 4];

    vec![baseline, syn, sem]
}

#[test]
fn model_kind_follows_filename_prefixes() {
    assert_eq!(
        ModelKind::from_artifact_name("INFERENCE_SBERT_foo"),
        Some(ModelKind::Sbert)
    );
    assert_eq!(
        ModelKind::from_artifact_name("INFERENCE_DITTO_foo"),
        Some(ModelKind::Ditto)
    );
    assert_eq!(
        ModelKind::from_artifact_name("INFERENCE_SUPCON_foo"),
        Some(ModelKind::SupCon)
    );
    assert_eq!(
        ModelKind::from_artifact_name("INFERENCE_foo"),
        Some(ModelKind::Bert)
    );
    assert_eq!(ModelKind::from_artifact_name("summary.txt"), None);
}

#[test]
fn artifact_row_parses_inference_artifacts_and_skips_others() {
    let raw = br#"{
        "data": "Structured_Fodors-Zagats",
        "tok": "sent_pair",
        "mask": "maskSyn",
        "topk_mask": 3,
        "preds": [1, 0],
        "labels": [1, 1],
        "masked_records": [true, false],
        "masked_tokens": [4, 0]
    }"#;

    let parsed = artifact_row("INFERENCE_SBERT_run", raw).unwrap().unwrap();
    assert_eq!(parsed.model, ModelKind::Sbert);
    assert_eq!(parsed.data, "Structured_Fodors-Zagats");
    assert_eq!(parsed.topk_mask, Some(3));
    assert_eq!(parsed.masked_records, vec![true, false]);

    assert!(artifact_row("notes.json", raw).unwrap().is_none());
    assert!(artifact_row("INFERENCE_broken", b"not json").is_err());
}

#[test]
fn artifact_digest_matches_known_vector() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn config_filter_keeps_baselines_and_accepted_rows() {
    let config = AnalysisConfig {
        accepted_topk: vec![3],
        accepted_masks: vec![
            "off".to_string(),
            "maskSyn".to_string(),
            "maskSem".to_string(),
            "random".to_string(),
        ],
        min_true_count: 100,
    };

    assert!(config.accepts(&row(ModelKind::Bert, "off", None)));
    assert!(config.accepts(&row(ModelKind::Bert, "maskSyn", Some(3))));
    assert!(!config.accepts(&row(ModelKind::Bert, "maskSyn", Some(5))));
    assert!(!config.accepts(&row(ModelKind::Bert, "maskStop", Some(3))));
}

#[test]
fn common_masks_and_over_all_masked_configurations() {
    let rows = scenario_group();
    let refs: Vec<&ResultRow> = rows.iter().collect();

    let masks = common_group_masks(&refs).unwrap().unwrap();
    assert_eq!(masks.common, vec![true, false, false]);
    assert_eq!(masks.common_true, vec![true, false, false]);
}

#[test]
fn common_masks_absent_without_masked_configurations() {
    let rows = vec![row(ModelKind::Bert, "off", None)];
    let refs: Vec<&ResultRow> = rows.iter().collect();
    assert!(common_group_masks(&refs).unwrap().is_none());
}

#[test]
fn masked_configuration_without_topk_is_an_error() {
    let rows = vec![row(ModelKind::Bert, "maskSyn", None)];
    let refs: Vec<&ResultRow> = rows.iter().collect();
    assert!(common_group_masks(&refs).is_err());
}

#[test]
fn binary_f1_counts_the_positive_class() {
    // tp=2, fp=1, fn=1 -> 2*2 / (2*2 + 1 + 1)
    let f1 = binary_f1(&[1, 0, 1, 1], &[1, 1, 0, 1]);
    assert!((f1 - 4.0 / 6.0).abs() < 1e-12);

    assert_eq!(binary_f1(&[0, 0], &[0, 0]), 0.0);
    assert_eq!(binary_f1(&[], &[]), 0.0);
}

#[test]
fn baseline_loose_f1_restricted_to_common_records() {
    let perf = compute_performance(&scenario_group()).unwrap();

    // Only index 0 survives the common mask: pred 1 against label 1.
    let baseline = &perf[0];
    assert_eq!(baseline.row.mask, "off");
    assert_eq!(baseline.metrics.count, 1);
    assert_eq!(baseline.metrics.f1, 1.0);
    assert_eq!(baseline.metrics.true_count, 1);
    assert_eq!(baseline.metrics.true_f1, 1.0);
    assert!((baseline.metrics.mask_perc - 100.0 / 3.0).abs() < 1e-12);
}

#[test]
fn loose_f1_scores_only_common_mask_positions() {
    let mut masked = row(ModelKind::Bert, "maskSyn", Some(1));
    masked.masked_records = vec![true, true, false];
    masked.masked_tokens = vec![1, 1, 0];
    masked.preds = vec![1, 1, 1];
    masked.labels = vec![1, 0, 1];

    let perf = compute_performance(&[masked]).unwrap();
    let metrics = &perf[0].metrics;

    // Indices 0 and 1 survive the common mask: tp=1, fp=1, fn=0. Scoring
    // index 2 as well would lift the result to 0.8.
    assert_eq!(metrics.count, 2);
    assert!((metrics.f1 - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn strict_counts_never_exceed_loose_counts() {
    let mut rows = scenario_group();
    // Push the semantic row below threshold everywhere so the strict set
    // shrinks to empty while the loose set keeps index 0.
    rows[2].masked_tokens = vec![1, 0, 4];

    let perf = compute_performance(&rows).unwrap();
    for row in &perf {
        assert!(row.metrics.true_count <= row.metrics.count);
        assert!(row.metrics.true_mask_perc <= row.metrics.mask_perc);
        assert!(row.metrics.mask_perc >= 0.0 && row.metrics.mask_perc <= 100.0);
        assert!(row.metrics.true_mask_perc >= 0.0);
    }
    assert_eq!(perf[0].metrics.true_count, 0);
    assert_eq!(perf[0].metrics.count, 1);
}

#[test]
fn group_without_masked_configurations_aborts_performance() {
    let rows = vec![row(ModelKind::Bert, "off", None)];
    assert!(compute_performance(&rows).is_err());
}

#[test]
fn masking_remap_is_total_over_accepted_codes() {
    assert_eq!(remap_masking("maskSem").unwrap(), "semantic");
    assert_eq!(remap_masking("maskSyn").unwrap(), "syntax");
    assert_eq!(remap_masking("off").unwrap(), "off");
    assert_eq!(remap_masking("random").unwrap(), "random");
    assert!(remap_masking("maskStop").is_err());
}

#[test]
fn dataset_retention_is_monotonic_in_the_threshold() {
    let perf = compute_performance(&scenario_group()).unwrap();

    let loose = retained_datasets(&perf, 0);
    let strict = retained_datasets(&perf, 1);
    assert_eq!(loose, vec!["Structured_Fodors-Zagats".to_string()]);
    assert!(strict.is_empty());
    assert!(strict.iter().all(|dataset| loose.contains(dataset)));
}

#[test]
fn report_partitions_baseline_rows_first() {
    let perf = compute_performance(&scenario_group()).unwrap();
    let retained = retained_datasets(&perf, 0);

    let report = build_report(&perf, &retained).unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report[0].masking, "off");
    // Treatment rows keep their relative load order.
    assert_eq!(report[1].masking, "syntax");
    assert_eq!(report[2].masking, "semantic");
    assert_eq!(report[0].f1, perf[0].metrics.true_f1);
}

#[test]
fn report_drops_datasets_below_threshold() {
    let perf = compute_performance(&scenario_group()).unwrap();
    let report = build_report(&perf, &[]).unwrap();
    assert!(report.is_empty());
}

#[test]
fn category_order_rejects_unranked_values() {
    let order = CategoryOrder::new(&["off", "semantic", "syntax", "random"]);
    assert_eq!(order.rank("off").unwrap(), 0);
    assert_eq!(order.rank("random").unwrap(), 3);
    assert!(order.rank("shuffled").is_err());
}

#[test]
fn categorical_sort_is_stable_within_equal_ranks() {
    let order = CategoryOrder::new(&["a", "b"]);
    let rows = vec![("b", 1), ("a", 1), ("b", 2), ("a", 2)];

    let sorted = ordered_categorical_sort(rows, |(category, _)| order.rank(category)).unwrap();
    assert_eq!(
        sorted,
        vec![(0, ("a", 1)), (0, ("a", 2)), (1, ("b", 1)), (1, ("b", 2))]
    );

    let rows = vec![("b", 1), ("c", 1)];
    assert!(ordered_categorical_sort(rows, |(category, _)| order.rank(category)).is_err());
}

fn sample_report() -> Vec<ReportRecord> {
    vec![
        ReportRecord {
            model: "BERT".to_string(),
            encoding: "sent_pair".to_string(),
            masking: "off".to_string(),
            f1: 0.9315789473684211,
        },
        ReportRecord {
            model: "SBERT".to_string(),
            encoding: "attr_pair".to_string(),
            masking: "semantic".to_string(),
            f1: 0.5,
        },
        ReportRecord {
            model: "Ditto".to_string(),
            encoding: "sent_pair".to_string(),
            masking: "random".to_string(),
            f1: 0.25,
        },
    ]
}

#[test]
fn report_csv_round_trips_values_and_order() {
    let records = sample_report();

    let mut buf = Vec::new();
    write_report_csv_to(&mut buf, &records).unwrap();

    let mut reader = csv::Reader::from_reader(buf.as_slice());
    assert_eq!(
        reader.headers().unwrap(),
        &csv::StringRecord::from(vec!["", "model", "encoding", "masking", "F1"])
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|row| row.unwrap()).collect();
    assert_eq!(rows.len(), records.len());
    for (index, (row, record)) in rows.iter().zip(&records).enumerate() {
        assert_eq!(&row[0], index.to_string().as_str());
        assert_eq!(&row[1], record.model.as_str());
        assert_eq!(&row[2], record.encoding.as_str());
        assert_eq!(&row[3], record.masking.as_str());
        assert_eq!(row[4].parse::<f64>().unwrap(), record.f1);
    }
}

#[test]
fn plot_grouping_filters_encoding_and_orders_by_rank() {
    let groups = grouped_f1(&sample_report(), "sent_pair").unwrap();

    // BERT/off and Ditto/random, nothing from the attr_pair row.
    assert_eq!(groups.len(), 2);
    assert_eq!(groups.get(&(0, 0)), Some(&vec![0.9315789473684211]));
    assert_eq!(groups.get(&(2, 3)), Some(&vec![0.25]));
}

#[test]
fn plot_grouping_rejects_unranked_categories() {
    let mut records = sample_report();
    records[0].masking = "shuffled".to_string();
    assert!(grouped_f1(&records, "sent_pair").is_err());
}
