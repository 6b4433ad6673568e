use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::columnar::count_rows;
use crate::config::DataPaths;
use crate::polymarket::{
    self, EventStat, Market, MarketSummary, OddsSnapshot, Token, Trade, format_millis,
};
use crate::statsbomb::{
    self, EventRecord, FreezeFrameRecord, LineupRecord, MatchFilter, MatchRecord, ReferenceRecord,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    pub fn new(title: &str, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: Vec<String>) -> Self {
        self.rows.push(cells);
        self
    }

    fn counts(title: &str, column: &str, counts: &[(String, usize)]) -> Self {
        let mut section = Section::new(title, &[column, "count"]);
        for (value, count) in counts {
            section.rows.push(vec![value.clone(), thousands(*count as u64)]);
        }
        section
    }

    fn describe(title: &str, stats: &Describe) -> Self {
        let mut section = Section::new(title, &["statistic", "value"]);
        for (name, value) in stats.rows() {
            section.rows.push(vec![name.to_string(), value]);
        }
        section
    }
}

/// Output of one analyzer: headline metrics followed by tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub title: String,
    pub metrics: Vec<(String, String)>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn metric(mut self, name: &str, value: impl ToString) -> Self {
        self.metrics.push((name.to_string(), value.to_string()));
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn metric_value(&self, name: &str) -> Option<&str> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Value counts, most frequent first; ties break on the value. Missing values count as `null`.
pub fn distribution<'a, I>(values: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.unwrap_or("null")).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out.truncate(n);
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "null".into());
        vec![
            ("count", self.count.to_string()),
            ("null_count", self.null_count.to_string()),
            ("mean", fmt(self.mean)),
            ("std", fmt(self.std)),
            ("min", fmt(self.min)),
            ("25%", fmt(self.q25)),
            ("50%", fmt(self.median)),
            ("75%", fmt(self.q75)),
            ("max", fmt(self.max)),
        ]
    }
}

fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Summary statistics with a sample standard deviation and linear-interpolated quantiles.
pub fn describe<I>(values: I) -> Describe
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut present = Vec::new();
    let mut null_count = 0;
    for value in values {
        match value {
            Some(v) => present.push(v),
            None => null_count += 1,
        }
    }
    present.sort_by(f64::total_cmp);

    let count = present.len();
    let mean = (count > 0).then(|| present.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        let var = present.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    });
    Describe {
        count,
        null_count,
        mean,
        std,
        min: present.first().copied(),
        q25: quantile(&present, 0.25),
        median: quantile(&present, 0.5),
        q75: quantile(&present, 0.75),
        max: present.last().copied(),
    }
}

/// The `n` rows with the largest key, largest first.
pub fn top_by<T>(rows: &[T], key: impl Fn(&T) -> f64, n: usize) -> Vec<&T> {
    let mut sorted: Vec<&T> = rows.iter().collect();
    sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
    sorted.truncate(n);
    sorted
}

pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}.{:02}", thousands(cents / 100), cents % 100)
}

fn distinct<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> usize {
    values.into_iter().flatten().collect::<HashSet<_>>().len()
}

fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or("null").to_string()
}

pub fn markets_report(markets: &[Market], top_n: usize) -> Report {
    let active = markets.iter().filter(|m| m.active).count();
    let closed = markets.iter().filter(|m| m.closed).count();
    let volume: f64 = markets.iter().map(|m| m.volume).sum();

    let mut top = Section::new("Top Markets by Volume", &["question", "volume", "active"]);
    for m in top_by(markets, |m| m.volume, top_n) {
        top = top.row(vec![
            opt_str(m.question.as_deref()),
            money(m.volume),
            m.active.to_string(),
        ]);
    }

    Report::new("POLYMARKET: MARKETS")
        .metric("Total", thousands(markets.len() as u64))
        .metric("Active", thousands(active as u64))
        .metric("Closed", thousands(closed as u64))
        .metric("Total volume", money(volume))
        .section(Section::counts(
            "Category Distribution",
            "category",
            &distribution(markets.iter().map(|m| m.category.as_deref()), top_n),
        ))
        .section(top)
}

pub fn tokens_report(tokens: &[Token], top_n: usize) -> Report {
    Report::new("POLYMARKET: TOKENS")
        .metric("Total", thousands(tokens.len() as u64))
        .metric(
            "Markets",
            distinct(tokens.iter().map(|t| t.market_id.as_deref())),
        )
        .metric(
            "Tokens",
            distinct(tokens.iter().map(|t| t.token_id.as_deref())),
        )
        .section(Section::counts(
            "Outcome Distribution",
            "outcome",
            &distribution(tokens.iter().map(|t| t.outcome.as_deref()), top_n),
        ))
}

pub fn trades_report(trades: &[Trade], top_n: usize) -> Report {
    let size: f64 = trades.iter().filter_map(|t| t.size).sum();
    let first = trades.iter().filter_map(|t| t.timestamp).min();
    let last = trades.iter().filter_map(|t| t.timestamp).max();
    let range = match (first, last) {
        (Some(first), Some(last)) => format!("{} to {}", format_millis(first), format_millis(last)),
        _ => "n/a".to_string(),
    };

    Report::new("POLYMARKET: TRADES")
        .metric("Total trades", thousands(trades.len() as u64))
        .metric(
            "Markets",
            distinct(trades.iter().map(|t| t.market_id.as_deref())),
        )
        .metric("Total size", format!("{size:.2}"))
        .metric("Date range", range)
        .section(Section::describe(
            "Size Statistics",
            &describe(trades.iter().map(|t| t.size)),
        ))
        .section(Section::describe(
            "Price Statistics",
            &describe(trades.iter().map(|t| t.price)),
        ))
        .section(Section::counts(
            "Side Distribution",
            "side",
            &distribution(trades.iter().map(|t| t.side.as_deref()), top_n),
        ))
}

pub fn odds_report(odds: &[OddsSnapshot]) -> Report {
    Report::new("POLYMARKET: ODDS HISTORY")
        .metric("Snapshots", thousands(odds.len() as u64))
        .metric(
            "Markets",
            distinct(odds.iter().map(|o| o.market_id.as_deref())),
        )
        .metric(
            "Tokens",
            distinct(odds.iter().map(|o| o.token_id.as_deref())),
        )
        .section(Section::describe(
            "Price Statistics",
            &describe(odds.iter().map(|o| o.price)),
        ))
}

pub fn event_stats_report(stats: &[EventStat], top_n: usize) -> Report {
    let markets: i64 = stats.iter().map(|s| s.market_count).sum();
    let volume: f64 = stats.iter().map(|s| s.total_volume).sum();

    let mut top = Section::new(
        "Top Events by Volume",
        &["event_slug", "market_count", "total_volume"],
    );
    for s in top_by(stats, |s| s.total_volume, top_n) {
        top = top.row(vec![
            opt_str(s.event_slug.as_deref()),
            s.market_count.to_string(),
            money(s.total_volume),
        ]);
    }

    Report::new("POLYMARKET: EVENT STATS")
        .metric("Events", thousands(stats.len() as u64))
        .metric("Total markets", markets)
        .metric("Total volume", money(volume))
        .section(top)
}

pub fn summary_report(summary: &[MarketSummary], top_n: usize) -> Report {
    let trades: i64 = summary.iter().map(|s| s.trade_count).sum();
    let active = summary.iter().filter(|s| s.active).count();

    let mut top = Section::new("Top Markets by Trades", &["question", "trade_count", "volume"]);
    for s in top_by(summary, |s| s.trade_count as f64, top_n) {
        top = top.row(vec![
            opt_str(s.question.as_deref()),
            thousands(s.trade_count.max(0) as u64),
            money(s.volume),
        ]);
    }

    Report::new("POLYMARKET: SUMMARY")
        .metric("Markets", thousands(summary.len() as u64))
        .metric("Trades", trades)
        .metric("Active", active)
        .section(top)
}

pub fn matches_report(matches: &[MatchRecord], top_n: usize) -> Report {
    let goals = describe(matches.iter().map(|m| m.total_goals().map(|g| g as f64)));
    let results = distribution(
        matches
            .iter()
            .map(|m| Some(m.result().map(|r| r.label()).unwrap_or("Draw"))),
        top_n,
    );

    Report::new("STATSBOMB: MATCHES")
        .metric("Total matches", thousands(matches.len() as u64))
        .metric(
            "Goals per match",
            format!(
                "mean={:.2}, median={:.1}",
                goals.mean.unwrap_or(0.0),
                goals.median.unwrap_or(0.0)
            ),
        )
        .section(Section::counts(
            "Competition Distribution",
            "competition_name",
            &distribution(matches.iter().map(|m| m.competition_name.as_deref()), top_n),
        ))
        .section(Section::counts(
            "Season Distribution",
            "season_name",
            &distribution(matches.iter().map(|m| m.season_name.as_deref()), top_n),
        ))
        .section(Section::counts("Match Results", "result", &results))
}

pub fn events_report(events: &[EventRecord], top_n: usize) -> Report {
    let matches: HashSet<u64> = events.iter().map(|e| e.match_id).collect();
    let shots = events.iter().filter(|e| e.is_type("Shot")).count();
    let passes: Vec<&EventRecord> = events.iter().filter(|e| e.is_type("Pass")).collect();
    let completed = passes.iter().filter(|e| e.pass_outcome.is_none()).count();
    let success = if passes.is_empty() {
        0.0
    } else {
        completed as f64 / passes.len() as f64 * 100.0
    };

    let active_players = distribution(
        events
            .iter()
            .filter(|e| e.player.is_some())
            .map(|e| e.player.as_deref()),
        top_n,
    );

    Report::new("STATSBOMB: EVENTS")
        .metric("Events", thousands(events.len() as u64))
        .metric("Matches", thousands(matches.len() as u64))
        .metric(
            "Types",
            distinct(events.iter().map(|e| e.event_type.as_deref())),
        )
        .metric("Total shots", thousands(shots as u64))
        .metric("Passes", thousands(passes.len() as u64))
        .metric("Success rate", format!("{success:.1}%"))
        .section(Section::counts(
            "Event Type Distribution",
            "type",
            &distribution(events.iter().map(|e| e.event_type.as_deref()), 15),
        ))
        .section(Section::counts("Most Active Players", "player", &active_players))
}

pub fn lineups_report(lineups: &[LineupRecord], top_n: usize) -> Report {
    let matches: HashSet<u64> = lineups.iter().map(|l| l.match_id).collect();
    let cards = lineups.iter().filter(|l| l.card_type.is_some()).count();

    Report::new("STATSBOMB: LINEUPS")
        .metric("Records", thousands(lineups.len() as u64))
        .metric("Matches", thousands(matches.len() as u64))
        .metric(
            "Players",
            distinct(lineups.iter().map(|l| l.player_name.as_deref())),
        )
        .metric("Total cards", thousands(cards as u64))
        .section(Section::counts(
            "Position Distribution",
            "position_name",
            &distribution(lineups.iter().map(|l| l.position_name.as_deref()), top_n),
        ))
}

pub fn three_sixty_report(frames: &[FreezeFrameRecord]) -> Report {
    let events: HashSet<&str> = frames.iter().map(|f| f.event_uuid.as_str()).collect();
    let matches: HashSet<u64> = frames.iter().map(|f| f.match_id).collect();

    Report::new("STATSBOMB: THREE SIXTY")
        .metric("Records", thousands(frames.len() as u64))
        .metric("Events", thousands(events.len() as u64))
        .metric("Matches", thousands(matches.len() as u64))
        .section(Section::describe(
            "X coords",
            &describe(frames.iter().map(|f| f.location_x)),
        ))
        .section(Section::describe(
            "Y coords",
            &describe(frames.iter().map(|f| f.location_y)),
        ))
}

pub fn reference_report(reference: &[ReferenceRecord], top_n: usize) -> Report {
    Report::new("STATSBOMB: REFERENCE")
        .metric("Total records", thousands(reference.len() as u64))
        .section(Section::counts(
            "Entity Types",
            "table_name",
            &distribution(reference.iter().map(|r| r.table_name.as_deref()), top_n),
        ))
}

fn text_range<'a>(values: impl Iterator<Item = Option<&'a str>>) -> String {
    let present: Vec<&str> = values.flatten().collect();
    match (present.iter().min(), present.iter().max()) {
        (Some(min), Some(max)) => format!("{min} to {max}"),
        _ => "n/a".to_string(),
    }
}

/// Parquet files of a directory with their row counts, by file name.
pub fn parquet_row_counts(dir: &Path) -> Result<Vec<(String, i64)>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "parquet"))
        .collect();
    files.sort();

    let mut out = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push((name, count_rows(&path)?));
    }
    Ok(out)
}

pub fn cross_report(
    markets: &[Market],
    matches: &[MatchRecord],
    file_counts: &[(&str, Vec<(String, i64)>)],
) -> Report {
    let mut report = Report::new("CROSS-DATASET ANALYSIS")
        .metric(
            "Polymarket",
            format!(
                "{} markets ({})",
                thousands(markets.len() as u64),
                text_range(markets.iter().map(|m| m.created_at.as_deref()))
            ),
        )
        .metric(
            "Statsbomb",
            format!(
                "{} matches ({})",
                thousands(matches.len() as u64),
                text_range(matches.iter().map(|m| m.match_date.as_deref()))
            ),
        );
    for (source, counts) in file_counts {
        let mut section = Section::new(&format!("File Sizes: {source}"), &["file", "rows"]);
        for (file, rows) in counts {
            section = section.row(vec![file.clone(), thousands((*rows).max(0) as u64)]);
        }
        report = report.section(section);
    }
    report
}

/// Event counts by type for one match, most frequent first.
pub fn event_type_counts(events: &[EventRecord], match_id: u64) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events.iter().filter(|e| e.match_id == match_id) {
        if let Some(kind) = event.event_type.as_deref() {
            *counts.entry(kind).or_default() += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(kind, n)| (kind.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Polymarket,
    Statsbomb,
}

impl Scope {
    fn polymarket(self) -> bool {
        matches!(self, Scope::All | Scope::Polymarket)
    }

    fn statsbomb(self) -> bool {
        matches!(self, Scope::All | Scope::Statsbomb)
    }
}

#[derive(Debug)]
pub enum Outcome {
    Done(Report),
    Skipped { name: String, reason: String },
    Failed { name: String, error: String },
}

impl Outcome {
    /// One-line status in the `[SKIP]`/`[ERROR]` console format; `None` for a finished report.
    pub fn status_line(&self) -> Option<String> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Skipped { name, reason } => Some(format!("[SKIP] {name}: {reason}")),
            Outcome::Failed { name, error } => Some(format!("[ERROR] {name}: {error}")),
        }
    }
}

type Analyzer = fn(&DataPaths, usize) -> Result<Report>;

fn safe_run(
    name: &str,
    file: Option<PathBuf>,
    analyzer: Analyzer,
    paths: &DataPaths,
    top_n: usize,
) -> Outcome {
    if let Some(file) = file.filter(|f| !f.exists()) {
        warn!(analyzer = name, file = %file.display(), "input missing");
        return Outcome::Skipped {
            name: name.to_string(),
            reason: "File not found".to_string(),
        };
    }
    match analyzer(paths, top_n) {
        Ok(report) => {
            info!(analyzer = name, "done");
            Outcome::Done(report)
        }
        Err(err) => {
            warn!(analyzer = name, error = %err, "failed");
            Outcome::Failed {
                name: name.to_string(),
                error: format!("{err:#}"),
            }
        }
    }
}

fn analyze_pm_markets(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(markets_report(&polymarket::load_markets(paths)?, top_n))
}

fn analyze_pm_tokens(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(tokens_report(&polymarket::load_tokens(paths)?, top_n))
}

fn analyze_pm_trades(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(trades_report(&polymarket::load_trades(paths)?, top_n))
}

fn analyze_pm_odds(paths: &DataPaths, _top_n: usize) -> Result<Report> {
    Ok(odds_report(&polymarket::load_odds(paths)?))
}

fn analyze_pm_events(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(event_stats_report(&polymarket::load_event_stats(paths)?, top_n))
}

fn analyze_pm_summary(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(summary_report(&polymarket::load_summary(paths)?, top_n))
}

fn analyze_sb_matches(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(matches_report(&statsbomb::load_matches(paths)?, top_n))
}

fn analyze_sb_events(paths: &DataPaths, top_n: usize) -> Result<Report> {
    let events = statsbomb::load_events(paths, &MatchFilter::all())?;
    Ok(events_report(&events, top_n))
}

fn analyze_sb_lineups(paths: &DataPaths, top_n: usize) -> Result<Report> {
    let lineups = statsbomb::load_lineups(paths, &MatchFilter::all())?;
    Ok(lineups_report(&lineups, top_n))
}

fn analyze_sb_360(paths: &DataPaths, _top_n: usize) -> Result<Report> {
    let frames = statsbomb::load_freeze_frames(paths, &MatchFilter::all())?;
    Ok(three_sixty_report(&frames))
}

fn analyze_sb_reference(paths: &DataPaths, top_n: usize) -> Result<Report> {
    Ok(reference_report(&statsbomb::load_reference(paths)?, top_n))
}

fn cross_analysis(paths: &DataPaths, _top_n: usize) -> Result<Report> {
    let markets = polymarket::load_markets(paths)?;
    let matches = statsbomb::load_matches(paths)?;
    let counts = vec![
        ("Polymarket", parquet_row_counts(&paths.polymarket_dir())?),
        ("Statsbomb", parquet_row_counts(&paths.statsbomb_dir())?),
    ];
    Ok(cross_report(&markets, &matches, &counts))
}

fn polymarket_analyzers(paths: &DataPaths) -> [(&'static str, PathBuf, Analyzer); 6] {
    [
        ("analyze_pm_markets", paths.polymarket(polymarket::MARKETS_FILE), analyze_pm_markets),
        ("analyze_pm_tokens", paths.polymarket(polymarket::TOKENS_FILE), analyze_pm_tokens),
        ("analyze_pm_trades", paths.polymarket(polymarket::TRADES_FILE), analyze_pm_trades),
        ("analyze_pm_odds", paths.polymarket(polymarket::ODDS_FILE), analyze_pm_odds),
        ("analyze_pm_events", paths.polymarket(polymarket::EVENT_STATS_FILE), analyze_pm_events),
        ("analyze_pm_summary", paths.polymarket(polymarket::SUMMARY_FILE), analyze_pm_summary),
    ]
}

fn statsbomb_analyzers(paths: &DataPaths) -> [(&'static str, PathBuf, Analyzer); 5] {
    [
        ("analyze_sb_matches", paths.statsbomb(statsbomb::MATCHES_FILE), analyze_sb_matches),
        ("analyze_sb_events", paths.statsbomb(statsbomb::EVENTS_FILE), analyze_sb_events),
        ("analyze_sb_lineups", paths.statsbomb(statsbomb::LINEUPS_FILE), analyze_sb_lineups),
        ("analyze_sb_360", paths.statsbomb(statsbomb::THREE_SIXTY_FILE), analyze_sb_360),
        ("analyze_sb_reference", paths.statsbomb(statsbomb::REFERENCE_FILE), analyze_sb_reference),
    ]
}

/// Runs every analyzer in scope. A failing analyzer never stops the run.
pub fn run_all(paths: &DataPaths, top_n: usize, scope: Scope) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    let pm_present = paths.polymarket_dir().is_dir();
    let sb_present = paths.statsbomb_dir().is_dir();

    if scope.polymarket() {
        if pm_present {
            for (name, file, analyzer) in polymarket_analyzers(paths) {
                outcomes.push(safe_run(name, Some(file), analyzer, paths, top_n));
            }
        } else {
            outcomes.push(Outcome::Skipped {
                name: "Polymarket".to_string(),
                reason: "directory not found".to_string(),
            });
        }
    }

    if scope.statsbomb() {
        if sb_present {
            for (name, file, analyzer) in statsbomb_analyzers(paths) {
                outcomes.push(safe_run(name, Some(file), analyzer, paths, top_n));
            }
        } else {
            outcomes.push(Outcome::Failed {
                name: "Statsbomb".to_string(),
                error: "directory not found".to_string(),
            });
        }
    }

    if scope == Scope::All && pm_present && sb_present {
        outcomes.push(safe_run("cross_analysis", None, cross_analysis, paths, top_n));
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::{describe, distribution, money, thousands, top_by};

    #[test]
    fn distribution_orders_by_count_then_value() {
        let values = [Some("b"), Some("a"), None, Some("b"), Some("a"), Some("c")];
        let dist = distribution(values, 3);
        assert_eq!(
            dist,
            vec![("a".to_string(), 2), ("b".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn describe_matches_sample_statistics() {
        let stats = describe([Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.mean, Some(2.5));
        assert_eq!(stats.median, Some(2.5));
        assert_eq!(stats.q25, Some(1.75));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(4.0));
        let std = stats.std.unwrap_or_default();
        assert!((std - 1.290_994).abs() < 1e-6);
    }

    #[test]
    fn describe_of_nothing_is_empty() {
        let stats = describe(std::iter::empty());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.std, None);
    }

    #[test]
    fn top_by_keeps_largest() {
        let rows = [3.0, 9.0, 1.0, 7.0];
        let top: Vec<f64> = top_by(&rows, |v| *v, 2).into_iter().copied().collect();
        assert_eq!(top, vec![9.0, 7.0]);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(-0.25), "-$0.25");
    }
}
