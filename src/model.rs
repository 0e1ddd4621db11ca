use serde::{Deserialize, Serialize};

/// Matching model that produced an inference artifact, inferred from the
/// artifact filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Bert,
    Sbert,
    Ditto,
    SupCon,
}

impl ModelKind {
    /// Classify an artifact by filename. Returns `None` for files that are
    /// not inference artifacts at all.
    pub fn from_artifact_name(file_name: &str) -> Option<Self> {
        if !file_name.starts_with("INFERENCE") {
            return None;
        }

        Some(if file_name.starts_with("INFERENCE_SBERT") {
            Self::Sbert
        } else if file_name.starts_with("INFERENCE_DITTO") {
            Self::Ditto
        } else if file_name.starts_with("INFERENCE_SUPCON") {
            Self::SupCon
        } else {
            Self::Bert
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bert => "BERT",
            Self::Sbert => "SBERT",
            Self::Ditto => "Ditto",
            Self::SupCon => "SupCon",
        }
    }
}

/// On-disk schema of one inference artifact. Sequences are positionally
/// aligned: one element per record of the dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceArtifact {
    pub data: String,
    pub tok: String,
    pub mask: String,
    #[serde(default)]
    pub topk_mask: Option<u32>,
    pub preds: Vec<u8>,
    pub labels: Vec<u8>,
    pub masked_records: Vec<bool>,
    pub masked_tokens: Vec<u32>,
}

/// One loaded inference run: the artifact content plus the model tag.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub model: ModelKind,
    pub data: String,
    pub tok: String,
    pub mask: String,
    pub topk_mask: Option<u32>,
    pub preds: Vec<u8>,
    pub labels: Vec<u8>,
    pub masked_records: Vec<bool>,
    pub masked_tokens: Vec<u32>,
}

/// Metrics computed for one row over the dataset's common masks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskedMetrics {
    pub f1: f64,
    pub mask_perc: f64,
    pub count: usize,
    pub true_f1: f64,
    pub true_mask_perc: f64,
    pub true_count: usize,
}

/// A result row enriched with its conditional metrics.
#[derive(Debug, Clone)]
pub struct PerformanceRow {
    pub row: ResultRow,
    pub metrics: MaskedMetrics,
}

/// One line of the final report table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub model: String,
    pub encoding: String,
    pub masking: String,
    #[serde(rename = "F1")]
    pub f1: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub filename: String,
    pub model: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub results_dir: String,
    pub artifact_count: usize,
    pub bert_count: usize,
    pub sbert_count: usize,
    pub ditto_count: usize,
    pub supcon_count: usize,
    pub artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub results_dir: String,
    pub artifact_count: usize,
    pub loaded_rows: usize,
    pub retained_datasets: Vec<String>,
    pub report_rows: usize,
    pub report_csv_path: String,
    pub plot_paths: Vec<String>,
    pub artifacts: Vec<ArtifactEntry>,
}
