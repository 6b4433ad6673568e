use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use pitch_lab::config::{self, DataPaths, PipelineConfig};
use pitch_lab::formations::{aggregate, lineup_combinations, staffing_audit};
use pitch_lab::period_lineups::reconstruct;
use pitch_lab::position_type::PositionTaxonomy;
use pitch_lab::print::{render, tabulate};
use pitch_lab::statsbomb::{self, MatchFilter};
use pitch_lab::store;

/// Full line-up per window for one match, plus the staffing audit.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// data root holding the Statsbomb/ directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long = "match")]
    match_id: u64,

    /// also list the formations the warehouse holds for the match
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let args = Args::parse();

    let paths = match &args.data_dir {
        Some(root) => DataPaths::with_root(root.clone()),
        None => DataPaths::from_env(),
    };
    let pipeline = PipelineConfig::from_env();
    let filter = MatchFilter::only([args.match_id]);
    let events = statsbomb::load_events(&paths, &filter)?;
    let lineups = statsbomb::load_lineups(&paths, &filter)?;
    let taxonomy = PositionTaxonomy::from_names(statsbomb::distinct_position_names(&lineups));

    let reconstruction = reconstruct(&lineups, &events);
    for issue in &reconstruction.issues {
        warn!("{issue}");
    }

    let combinations = lineup_combinations(args.match_id, &reconstruction, &taxonomy);
    let widest = combinations
        .iter()
        .map(|c| c.players_on_pitch())
        .max()
        .unwrap_or(0);
    let mut headers: Vec<String> = ["team", "period", "start", "end", "formation"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    headers.extend((1..=widest).map(|n| format!("p{n}")));
    let rows: Vec<Vec<String>> = combinations
        .iter()
        .map(|c| {
            let mut row = vec![
                c.key.team_id.to_string(),
                c.key.period.to_string(),
                c.key.start.to_string(),
                c.end.to_string(),
                c.formation.clone(),
            ];
            row.extend((0..widest).map(|idx| {
                c.slots.get(idx).map(|id| id.to_string()).unwrap_or_default()
            }));
            row
        })
        .collect();
    info!(match_id = args.match_id, windows = combinations.len(), "lineup combinations");
    info!("\n{}", render(&tabulate(&headers, &rows)));

    let formations = aggregate(&reconstruction.windows, &reconstruction.players, &taxonomy);
    let staffing = staffing_audit(&formations, pipeline.min_players as u32);
    if staffing.is_empty() {
        info!(min_players = pipeline.min_players, "every window is fully staffed");
    }
    for issue in &staffing {
        warn!(
            team_id = issue.key.team_id,
            period = issue.key.period,
            start = %issue.key.start,
            players = issue.players_on_pitch,
            "window is {:?} staffed",
            issue.staffing
        );
    }

    if let Some(db) = &args.db {
        let conn = store::open_db(db)?;
        let stored = store::load_formations(&conn, args.match_id)?;
        if stored.len() != formations.len() {
            warn!(
                stored = stored.len(),
                rebuilt = formations.len(),
                "warehouse window count differs from a fresh rebuild"
            );
        }
        let headers: Vec<String> = ["team", "period", "start", "end", "formation", "players"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows: Vec<Vec<String>> = stored
            .iter()
            .map(|f| {
                vec![
                    f.team_name.clone().unwrap_or_else(|| f.team_id.to_string()),
                    f.period.to_string(),
                    f.start.clone(),
                    f.end.clone(),
                    f.formation.clone(),
                    f.players_on_pitch.to_string(),
                ]
            })
            .collect();
        info!("\n{}", render(&tabulate(&headers, &rows)));
    }
    Ok(())
}
