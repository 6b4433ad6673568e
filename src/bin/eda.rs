use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use pitch_lab::config::{self, DataPaths, PipelineConfig};
use pitch_lab::eda::{Outcome, Scope, run_all};
use pitch_lab::print::render_report;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Only {
    /// Polymarket tables only
    Pm,
    /// Statsbomb tables only
    Sb,
}

/// Exploratory summaries of the Polymarket and Statsbomb parquet files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// data root holding the Statsbomb/ and Polymarket/ directories
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// rows shown in top-N tables
    #[arg(long)]
    top: Option<usize>,

    /// restrict to one provider
    #[arg(long, value_enum)]
    only: Option<Only>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let args = Args::parse();

    let paths = match &args.data_dir {
        Some(root) => DataPaths::with_root(root.clone()),
        None => DataPaths::from_env(),
    };
    let top_n = args.top.unwrap_or(PipelineConfig::from_env().top_n).max(1);
    let scope = match args.only {
        Some(Only::Pm) => Scope::Polymarket,
        Some(Only::Sb) => Scope::Statsbomb,
        None => Scope::All,
    };
    info!(root = %paths.root.display(), top_n, ?scope, "running analyzers");

    let outcomes = run_all(&paths, top_n, scope);
    let mut done = 0;
    for outcome in &outcomes {
        match outcome {
            Outcome::Done(report) => {
                done += 1;
                println!("{}", render_report(report));
            }
            other => {
                if let Some(line) = other.status_line() {
                    warn!("{line}");
                }
            }
        }
    }
    info!(done, total = outcomes.len(), "analysis complete");
    Ok(())
}
