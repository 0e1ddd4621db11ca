use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::model::{PerformanceRow, ReportRecord};

/// Datasets whose strictly-masked record count clears the reporting
/// threshold. Raising the threshold can only shrink this set.
pub fn retained_datasets(perf: &[PerformanceRow], min_true_count: usize) -> Vec<String> {
    let retained: BTreeSet<&str> = perf
        .iter()
        .filter(|row| row.metrics.true_count > min_true_count)
        .map(|row| row.row.data.as_str())
        .collect();

    retained.into_iter().map(ToOwned::to_owned).collect()
}

/// Presentation label for a masking condition code. Every code surviving the
/// loader filter is covered; anything else is a mapping error.
pub fn remap_masking(code: &str) -> Result<&'static str> {
    Ok(match code {
        "maskSem" => "semantic",
        "maskSyn" => "syntax",
        "off" => "off",
        "random" => "random",
        other => bail!("unmapped masking category: {other}"),
    })
}

/// Project the enriched table to the report columns, keeping only retained
/// datasets, and stable-partition baseline rows ahead of the treatments.
pub fn build_report(perf: &[PerformanceRow], retained: &[String]) -> Result<Vec<ReportRecord>> {
    let retained: BTreeSet<&str> = retained.iter().map(String::as_str).collect();

    let mut records = Vec::new();
    for row in perf {
        if !retained.contains(row.row.data.as_str()) {
            continue;
        }

        records.push(ReportRecord {
            model: row.row.model.as_str().to_string(),
            encoding: row.row.tok.clone(),
            masking: remap_masking(&row.row.mask)?.to_string(),
            f1: row.metrics.true_f1,
        });
    }

    let (baseline, treatments): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|record| record.masking == "off");

    Ok(baseline.into_iter().chain(treatments).collect())
}

/// Explicit display-rank table for a categorical column.
#[derive(Debug, Clone)]
pub struct CategoryOrder {
    categories: &'static [&'static str],
}

impl CategoryOrder {
    pub fn new(categories: &'static [&'static str]) -> Self {
        Self { categories }
    }

    /// The rank table must be exhaustive over observed categories; an
    /// unranked value is an error rather than an undefined sort position.
    pub fn rank(&self, value: &str) -> Result<usize> {
        self.categories
            .iter()
            .position(|category| *category == value)
            .with_context(|| format!("category '{value}' missing from display order"))
    }
}

/// Stable sort by a categorical rank key, returning each row paired with its
/// key so callers can group without re-ranking. Fails before reordering
/// anything if any row carries an unranked category.
pub fn ordered_categorical_sort<T, K, F>(rows: Vec<T>, rank_of: F) -> Result<Vec<(K, T)>>
where
    K: Ord,
    F: Fn(&T) -> Result<K>,
{
    let mut keyed = rows
        .into_iter()
        .map(|row| rank_of(&row).map(|key| (key, row)))
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(keyed)
}

/// Write the report table with the leading integer index column:
/// `,model,encoding,masking,F1`.
pub fn write_report_csv(path: &Path, records: &[ReportRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create report csv: {}", path.display()))?;
    write_report_csv_to(file, records)
        .with_context(|| format!("failed to write report csv: {}", path.display()))
}

pub fn write_report_csv_to<W: Write>(writer: W, records: &[ReportRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["", "model", "encoding", "masking", "F1"])?;
    for (index, record) in records.iter().enumerate() {
        csv_writer.write_record([
            index.to_string(),
            record.model.clone(),
            record.encoding.clone(),
            record.masking.clone(),
            record.f1.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
