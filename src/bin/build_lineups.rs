use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info, warn};

use pitch_lab::config::{self, DataPaths, PipelineConfig};
use pitch_lab::error::LineupError;
use pitch_lab::export::{export_workbook, write_derived_tables};
use pitch_lab::formations::{aggregate, formation_frequency, staffing_audit};
use pitch_lab::period_lineups::reconstruct;
use pitch_lab::position_type::{PositionTaxonomy, build_taxonomy};
use pitch_lab::possession::{PossessionSummary, summarize};
use pitch_lab::print::{render, tabulate};
use pitch_lab::statsbomb::{self, MatchFilter, MatchRecord};
use pitch_lab::store::{self, BuildRun};

/// Rebuilds the position taxonomy, period lineups and team formations.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// data root holding the Statsbomb/ and Polymarket/ directories
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// where the derived parquet tables go
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// warehouse to fill
    #[arg(long)]
    db: Option<PathBuf>,

    /// restrict to these match ids
    #[arg(long = "match")]
    matches: Vec<u64>,

    /// restrict to one competition, by name
    #[arg(long)]
    competition: Option<String>,

    /// also write an xlsx workbook here
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

impl Args {
    fn paths(&self) -> DataPaths {
        let mut paths = DataPaths::from_env();
        if let Some(root) = &self.data_dir {
            let output_dir = paths.output_dir.clone();
            let db_path = paths.db_path.clone();
            paths = DataPaths::with_root(root.clone());
            paths.output_dir = output_dir;
            paths.db_path = db_path;
        }
        if let Some(dir) = &self.output_dir {
            paths.output_dir = dir.clone();
        }
        if let Some(db) = &self.db {
            paths.db_path = db.clone();
        }
        paths
    }

    /// Matches in scope after the id and competition restrictions.
    fn scope<'a>(&self, matches: &'a [MatchRecord]) -> Vec<&'a MatchRecord> {
        let ids: BTreeSet<u64> = self.matches.iter().copied().collect();
        matches
            .iter()
            .filter(|m| ids.is_empty() || ids.contains(&m.match_id))
            .filter(|m| {
                self.competition
                    .as_deref()
                    .is_none_or(|c| m.competition_name.as_deref() == Some(c))
            })
            .collect()
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let args = Args::parse();
    debug!("args: {args:?}");

    let paths = args.paths();
    let pipeline = PipelineConfig::from_env();
    let started_at = Utc::now().to_rfc3339();

    let all_matches = statsbomb::load_matches(&paths)?;
    let in_scope: Vec<MatchRecord> = args.scope(&all_matches).into_iter().cloned().collect();
    if in_scope.is_empty() {
        return Err(LineupError::EmptyInput {
            what: "matches in scope".to_string(),
        }
        .into());
    }
    let filter = MatchFilter::only(in_scope.iter().map(|m| m.match_id));
    info!(matches = in_scope.len(), "loading events and lineups");

    let events = statsbomb::load_events(&paths, &filter)?;
    let lineups = statsbomb::load_lineups(&paths, &filter)?;
    if lineups.is_empty() {
        return Err(LineupError::EmptyInput {
            what: "lineup rows".to_string(),
        }
        .into());
    }

    let types = build_taxonomy(statsbomb::distinct_position_names(&lineups));
    let taxonomy = PositionTaxonomy::new(types.clone());
    info!(positions = taxonomy.len(), "position taxonomy built");

    let (reconstruction, formations) = pipeline.install(|| {
        let reconstruction = reconstruct(&lineups, &events);
        let formations = aggregate(&reconstruction.windows, &reconstruction.players, &taxonomy);
        (reconstruction, formations)
    });
    info!(
        windows = reconstruction.windows.len(),
        players = reconstruction.players.len(),
        formations = formations.len(),
        "lineups reconstructed"
    );
    for issue in &reconstruction.issues {
        warn!("{issue}");
    }
    let staffing = staffing_audit(&formations, pipeline.min_players as u32);
    for issue in &staffing {
        warn!(
            match_id = issue.key.match_id,
            team_id = issue.key.team_id,
            period = issue.key.period,
            start = %issue.key.start,
            players = issue.players_on_pitch,
            "window is {:?} staffed",
            issue.staffing
        );
    }

    for (path, rows) in
        write_derived_tables(&paths.output_dir, &types, &reconstruction.players, &formations)?
    {
        info!(rows, "wrote {}", path.display());
    }

    let mut conn = store::open_db(&paths.db_path)?;
    store::replace_position_types(&mut conn, &types)?;
    store::replace_lineups(&mut conn, &reconstruction)?;
    store::replace_match_players(&mut conn, &lineups)?;
    store::replace_formations(&mut conn, &formations, &statsbomb::team_names(&events))?;
    store::replace_match_summaries(&mut conn, &in_scope, &events)?;
    let run_id = store::record_build_run(
        &conn,
        &BuildRun {
            started_at,
            matches: in_scope.len(),
            windows: reconstruction.windows.len(),
            players: reconstruction.players.len(),
            formations: formations.len(),
            issues: reconstruction
                .issues
                .iter()
                .map(|issue| issue.to_string())
                .collect(),
        },
    )?;
    info!(run_id, db = %paths.db_path.display(), "warehouse updated");

    if let Some(xlsx) = &args.xlsx {
        let possessions: Vec<PossessionSummary> = reconstruction
            .match_ids()
            .into_iter()
            .flat_map(|match_id| summarize(&events, match_id))
            .collect();
        let report = export_workbook(xlsx, &formations, &possessions)?;
        info!(
            formations = report.formations,
            labels = report.formation_labels,
            possessions = report.possessions,
            "wrote {}",
            xlsx.display()
        );
    }

    let rows: Vec<Vec<String>> = formation_frequency(&formations)
        .into_iter()
        .take(pipeline.top_n)
        .map(|(label, n)| vec![label, n.to_string()])
        .collect();
    let table = tabulate(&["formation".to_string(), "windows".to_string()], &rows);
    info!("\n{}", render(&table));
    Ok(())
}
