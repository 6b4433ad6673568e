use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;

use pitch_lab::config::{self, DataPaths};
use pitch_lab::freeze_frame::{event_frame, frames_for_season};
use pitch_lab::print::{render, tabulate};
use pitch_lab::statsbomb::{self, MatchFilter};

/// Distances from one event to every player in its 360 freeze frame.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// data root holding the Statsbomb/ directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long = "match")]
    match_id: u64,

    /// event index within the match
    #[arg(long)]
    index: i64,

    /// also report 360 coverage for a season, e.g. "2022"
    #[arg(long)]
    season: Option<String>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let args = Args::parse();

    let paths = match &args.data_dir {
        Some(root) => DataPaths::with_root(root.clone()),
        None => DataPaths::from_env(),
    };
    let filter = MatchFilter::only([args.match_id]);
    let events = statsbomb::load_events(&paths, &filter)?;
    let frames = statsbomb::load_freeze_frames(&paths, &filter)?;

    let frame = event_frame(&events, &frames, args.match_id, args.index).ok_or_else(|| {
        anyhow!(
            "match {} has no located event at index {}",
            args.match_id,
            args.index
        )
    })?;
    info!(
        event = %frame.event_id,
        period = ?frame.period,
        x = frame.location.0,
        y = frame.location.1,
        players = frame.entries.len(),
        "freeze frame"
    );

    let headers: Vec<String> = ["category", "teammate", "keeper", "x", "y", "distance", "rank"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut entries: Vec<_> = frame.entries.iter().collect();
    entries.sort_by(|a, b| a.category.cmp(&b.category).then(a.rank.cmp(&b.rank)));
    let rows: Vec<Vec<String>> = entries
        .into_iter()
        .map(|e| {
            vec![
                e.category.to_string(),
                e.teammate.to_string(),
                e.keeper.to_string(),
                e.location.map(|l| format!("{:.1}", l.0)).unwrap_or_default(),
                e.location.map(|l| format!("{:.1}", l.1)).unwrap_or_default(),
                e.distance.map(|d| format!("{d:.2}")).unwrap_or_default(),
                e.rank.to_string(),
            ]
        })
        .collect();
    info!("\n{}", render(&tabulate(&headers, &rows)));

    if let Some(season) = &args.season {
        let matches = statsbomb::load_matches(&paths)?;
        let all_frames = statsbomb::load_freeze_frames(&paths, &MatchFilter::all())?;
        let covered = frames_for_season(&matches, &all_frames, season);
        let events: HashSet<&str> = covered.iter().map(|f| f.event_uuid.as_str()).collect();
        info!(
            season = %season,
            frames = covered.len(),
            events = events.len(),
            "season 360 coverage"
        );
    }
    Ok(())
}
