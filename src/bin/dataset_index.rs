//! Print the BigP3BCI directory index as JSON.
//!
//! ```bash
//! BIGP3BCI_ROOT=~/data/bigP3BCI-data dataset_index --ext edf > index.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use erpkit::{list_dataset_structure, DataPaths};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "dataset_index", about = "Index a BigP3BCI dataset tree")]
struct Cli {
    /// Dataset root (default: $BIGP3BCI_ROOT or ~/data/bigP3BCI-data)
    #[arg(long)]
    root: Option<PathBuf>,

    /// File extension to index, without the dot
    #[arg(long, default_value = "edf")]
    ext: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let root = cli.root.unwrap_or_else(|| DataPaths::from_env().bigp3bci_root);
    let index = list_dataset_structure(&root, &cli.ext)?;
    eprintln!("{} files under {}", index.len(), root.display());
    println!("{}", index.to_json()?);
    Ok(())
}
