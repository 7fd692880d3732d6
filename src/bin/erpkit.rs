//! Run the P300 pipeline and print the cross-validated accuracy.
//!
//! ```bash
//! # Synthetic recording, figures in ./results
//! erpkit
//!
//! # A real recording
//! erpkit --data ~/mne_data/MNE-sample-data/MEG/sample/sample_audvis_raw.fif --out out
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use erpkit::{run_p300_pipeline, PipelineConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "erpkit")]
#[command(version, about = "P300 ERP classification pipeline", long_about = None)]
struct Cli {
    /// FIF or EDF recording; a synthetic one is generated when omitted
    #[arg(long, value_parser = existing_path)]
    data: Option<PathBuf>,

    /// Output directory for figures
    #[arg(long, default_value = "results")]
    out: PathBuf,

    /// Logging verbosity level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn existing_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("{s} does not exist"))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_level.to_lowercase()))
        .context("invalid --log-level")?;
    fmt().with_env_filter(filter).with_target(false).init();

    let cfg = PipelineConfig::default();
    let report = run_p300_pipeline(cli.data.as_deref(), &cli.out, &cfg)?;
    tracing::info!(erp = %report.erp_path.display(), folds = ?report.fold_scores, "done");

    println!("Final accuracy: {:.3}", report.accuracy);
    Ok(())
}
