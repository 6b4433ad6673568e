use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use pitch_lab::config::{self, DataPaths, PipelineConfig};
use pitch_lab::eda::event_type_counts;
use pitch_lab::possession::{PossessionSummary, possession_audit, summarize};
use pitch_lab::print::{render, tabulate};
use pitch_lab::statsbomb::{self, EventRecord, MatchFilter};

/// Per-possession summaries for one match, with an optional consistency audit.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// data root holding the Statsbomb/ directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long = "match")]
    match_id: u64,

    /// list events whose team disagrees with the possession team
    #[arg(long)]
    audit: bool,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let args = Args::parse();

    let paths = match &args.data_dir {
        Some(root) => DataPaths::with_root(root.clone()),
        None => DataPaths::from_env(),
    };
    let top_n = PipelineConfig::from_env().top_n;
    let events = statsbomb::load_events(&paths, &MatchFilter::only([args.match_id]))?;
    if events.is_empty() {
        warn!(match_id = args.match_id, "no events for match");
        return Ok(());
    }

    let counts: Vec<Vec<String>> = event_type_counts(&events, args.match_id)
        .into_iter()
        .map(|(kind, n)| vec![kind, n.to_string()])
        .collect();
    info!(
        "\n{}",
        render(&tabulate(&["event type".to_string(), "count".to_string()], &counts))
    );

    let summaries = summarize(&events, args.match_id);
    info!(match_id = args.match_id, possessions = summaries.len(), "possessions summarised");
    let headers: Vec<String> = [
        "possession", "period", "team", "pattern", "secs", "passes", "carries", "shots", "players",
        "distance", "relative",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let mut longest: Vec<&PossessionSummary> = summaries.iter().collect();
    longest.sort_by(|a, b| b.total_duration.total_cmp(&a.total_duration));
    let rows: Vec<Vec<String>> = longest.into_iter().take(top_n).map(summary_row).collect();
    info!("\n{}", render(&tabulate(&headers, &rows)));

    if args.audit {
        let audit = possession_audit(&events, args.match_id);
        if audit.is_clean() {
            info!(match_id = args.match_id, "possession attribution is consistent");
        } else {
            warn!(
                foreign = audit.foreign_events.len(),
                multi_team = audit.multi_team_players.len(),
                players = ?audit.flagged_players(),
                "possession attribution issues"
            );
            let headers: Vec<String> = ["index", "type", "team", "possession team", "player"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            let rows: Vec<Vec<String>> = audit
                .foreign_events
                .iter()
                .chain(audit.multi_team_players.iter())
                .map(|e| audit_row(e))
                .collect();
            info!("\n{}", render(&tabulate(&headers, &rows)));
        }
    }
    Ok(())
}

fn summary_row(p: &PossessionSummary) -> Vec<String> {
    vec![
        opt(p.possession),
        opt(p.period),
        opt(p.possession_team_id),
        p.play_pattern.clone().unwrap_or_default(),
        format!("{:.1}", p.total_duration),
        p.passes.to_string(),
        p.carries.to_string(),
        p.shots.to_string(),
        p.possessing_players.to_string(),
        opt(p.total_distance.map(|d| format!("{d:.1}"))),
        opt(p.relative_distance().map(|d| format!("{d:.1}"))),
    ]
}

fn audit_row(e: &EventRecord) -> Vec<String> {
    vec![
        e.index_num.to_string(),
        e.event_type.clone().unwrap_or_default(),
        opt(e.team_id),
        opt(e.possession_team_id),
        e.player.clone().unwrap_or_default(),
    ]
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
