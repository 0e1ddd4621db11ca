use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "emrobust",
    version,
    about = "Entity-matching masking robustness analysis tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Analyze(AnalyzeArgs),
}

/// Which experiment's results directory to analyze.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Experiment {
    Masking,
    Syn4,
    Syn5,
}

impl Experiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Masking => "masking",
            Self::Syn4 => "syn4",
            Self::Syn5 => "syn5",
        }
    }

    pub fn subdir(self) -> &'static str {
        match self {
            Self::Masking => "masking",
            Self::Syn4 => "inference/syn4",
            Self::Syn5 => "inference/syn5",
        }
    }
}

/// Which masking conditions participate in the analysis. Baseline ("off")
/// and "random" rows are always accepted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum MaskSet {
    Syn,
    Sem,
    SynSem,
}

impl MaskSet {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syn => "syn",
            Self::Sem => "sem",
            Self::SynSem => "syn-sem",
        }
    }

    pub fn accepted_masks(self) -> &'static [&'static str] {
        match self {
            Self::Syn => &["off", "maskSyn", "random"],
            Self::Sem => &["off", "maskSem", "random"],
            Self::SynSem => &["off", "maskSyn", "maskSem", "random"],
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "results")]
    pub results_root: PathBuf,

    #[arg(long, value_enum, default_value_t = Experiment::Masking)]
    pub experiment: Experiment,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "results")]
    pub results_root: PathBuf,

    #[arg(long, value_enum, default_value_t = Experiment::Masking)]
    pub experiment: Experiment,

    #[arg(long, value_enum, default_value_t = MaskSet::SynSem)]
    pub mask_set: MaskSet,

    /// Minimum masked-token count for a record to count as truly masked.
    #[arg(long, default_value_t = 3)]
    pub topk_mask: u32,

    /// Datasets need a strictly-masked record count above this to be reported.
    #[arg(long, default_value_t = 100)]
    pub min_true_count: usize,

    #[arg(long, default_value = ".")]
    pub plot_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}
