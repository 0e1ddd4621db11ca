use std::collections::BTreeMap;

use anyhow::{Context, Result, bail, ensure};
use tracing::warn;

use crate::model::{MaskedMetrics, PerformanceRow, ResultRow};

/// Record subsets shared by every non-baseline configuration of a dataset.
///
/// `common` is true where every configuration masked the record at all;
/// `common_true` is true where every configuration masked at least
/// `topk_mask` tokens. Comparing F1 on these subsets keeps the comparison on
/// an identical record set across models and configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMasks {
    pub common: Vec<bool>,
    pub common_true: Vec<bool>,
}

/// AND-reduce the masked-record and threshold indicators of every non-"off"
/// row in a dataset group. `None` if the group has no non-baseline rows.
pub fn common_group_masks(rows: &[&ResultRow]) -> Result<Option<GroupMasks>> {
    rows.iter()
        .filter(|row| row.mask != "off")
        .try_fold(None, |acc: Option<GroupMasks>, row| {
            let topk = row.topk_mask.with_context(|| {
                format!(
                    "masked configuration without topk_mask in dataset '{}' (mask={})",
                    row.data, row.mask
                )
            })?;

            ensure!(
                row.masked_tokens.len() == row.masked_records.len(),
                "misaligned masked_tokens/masked_records in dataset '{}'",
                row.data
            );

            let true_mask = row.masked_tokens.iter().map(|&tokens| tokens >= topk);

            match acc {
                None => Ok(Some(GroupMasks {
                    common: row.masked_records.clone(),
                    common_true: true_mask.collect(),
                })),
                Some(mut masks) => {
                    ensure!(
                        masks.common.len() == row.masked_records.len(),
                        "misaligned record counts in dataset '{}'",
                        row.data
                    );
                    for (slot, &masked) in masks.common.iter_mut().zip(&row.masked_records) {
                        *slot &= masked;
                    }
                    for (slot, truly) in masks.common_true.iter_mut().zip(true_mask) {
                        *slot &= truly;
                    }
                    Ok(Some(masks))
                }
            }
        })
}

/// Positive-class F1 over aligned binary sequences: 2·TP / (2·TP + FP + FN).
/// A restricted set with no positives on either side yields 0.0, matching the
/// default of the metric library the experiments were scored with.
pub fn binary_f1(labels: &[u8], preds: &[u8]) -> f64 {
    let mut tp = 0_usize;
    let mut fp = 0_usize;
    let mut fn_ = 0_usize;

    for (&label, &pred) in labels.iter().zip(preds) {
        match (label != 0, pred != 0) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let denominator = 2 * tp + fp + fn_;
    if denominator == 0 {
        warn!("no positive labels or predictions in restricted set, F1 defaults to 0.0");
        return 0.0;
    }

    (2 * tp) as f64 / denominator as f64
}

fn restricted_f1(labels: &[u8], preds: &[u8], keep: &[bool]) -> f64 {
    let select = |values: &[u8]| -> Vec<u8> {
        values
            .iter()
            .zip(keep)
            .filter(|&(_, &kept)| kept)
            .map(|(&value, _)| value)
            .collect()
    };

    binary_f1(&select(labels), &select(preds))
}

fn count_true(mask: &[bool]) -> usize {
    mask.iter().filter(|&&kept| kept).count()
}

/// Enrich every row with loose and strict metrics computed over its dataset's
/// common masks. Rows are never reordered; metrics are written back by row
/// index.
pub fn compute_performance(rows: &[ResultRow]) -> Result<Vec<PerformanceRow>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (ix, row) in rows.iter().enumerate() {
        groups.entry(row.data.as_str()).or_default().push(ix);
    }

    let mut metrics: Vec<Option<MaskedMetrics>> = vec![None; rows.len()];

    for (dataset, indices) in groups {
        let group_rows: Vec<&ResultRow> = indices.iter().map(|&ix| &rows[ix]).collect();

        let Some(masks) = common_group_masks(&group_rows)? else {
            bail!("dataset group '{dataset}' has no masked configurations");
        };

        let joint_true: Vec<bool> = masks
            .common
            .iter()
            .zip(&masks.common_true)
            .map(|(&masked, &truly)| masked && truly)
            .collect();

        let record_count = masks.common.len();
        let count = count_true(&masks.common);
        let true_count = count_true(&joint_true);

        for &ix in &indices {
            let row = &rows[ix];
            ensure!(
                row.preds.len() == record_count && row.labels.len() == record_count,
                "misaligned preds/labels in dataset '{dataset}' (expected {record_count} records)"
            );

            metrics[ix] = Some(MaskedMetrics {
                f1: restricted_f1(&row.labels, &row.preds, &masks.common),
                mask_perc: (count as f64 / record_count as f64) * 100.0,
                count,
                true_f1: restricted_f1(&row.labels, &row.preds, &joint_true),
                true_mask_perc: (true_count as f64 / record_count as f64) * 100.0,
                true_count,
            });
        }
    }

    rows.iter()
        .zip(metrics)
        .map(|(row, slot)| {
            let metrics = slot.with_context(|| {
                format!("no metrics computed for dataset '{}' row", row.data)
            })?;
            Ok(PerformanceRow {
                row: row.clone(),
                metrics,
            })
        })
        .collect()
}
