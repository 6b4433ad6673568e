use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::statsbomb::{MatchRecord, MatchResult};
use crate::store::{DashboardTables, FormationRow};

pub const ALL: &str = "All";
pub const XG_BINS: usize = 30;
pub const TOP_EVENT_TYPES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Formations,
}

/// Active filter values; `None` means `All`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub competition: Option<String>,
    pub season: Option<String>,
    pub team: Option<String>,
}

impl Filters {
    pub fn keeps(&self, m: &MatchRecord) -> bool {
        let competition_ok = self
            .competition
            .as_deref()
            .is_none_or(|c| m.competition_name.as_deref() == Some(c));
        let season_ok = self
            .season
            .as_deref()
            .is_none_or(|s| m.season_name.as_deref() == Some(s));
        let team_ok = self.team.as_deref().is_none_or(|t| m.involves(t));
        competition_ok && season_ok && team_ok
    }
}

pub fn filter_label(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(ALL)
}

/// Next value after `current` in `All, options[0], options[1], ...`, wrapping to `All`.
pub fn cycle_option(current: &Option<String>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(value) => {
            let pos = options.iter().position(|o| o == value)?;
            options.get(pos + 1).cloned()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub total_matches: usize,
    pub total_events: u64,
    pub unique_players: usize,
    pub avg_goals: f64,
}

impl Kpis {
    pub fn avg_goals_label(&self) -> String {
        format!("{:.2}", self.avg_goals)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub tables: DashboardTables,
    pub filters: Filters,
    pub screen: Screen,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
    competitions: Vec<String>,
    seasons: Vec<String>,
    teams: Vec<String>,
}

fn sorted_distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl DashboardState {
    pub fn new(tables: DashboardTables) -> Self {
        let competitions = sorted_distinct(tables.matches.iter().map(|m| m.competition_name.as_deref()));
        let seasons = sorted_distinct(tables.matches.iter().map(|m| m.season_name.as_deref()));
        let teams = sorted_distinct(
            tables
                .matches
                .iter()
                .flat_map(|m| [m.home_team.as_deref(), m.away_team.as_deref()]),
        );
        Self {
            tables,
            filters: Filters::default(),
            screen: Screen::Overview,
            help_overlay: false,
            logs: VecDeque::with_capacity(200),
            competitions,
            seasons,
            teams,
        }
    }

    pub fn competitions(&self) -> &[String] {
        &self.competitions
    }

    pub fn seasons(&self) -> &[String] {
        &self.seasons
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Applies saved filters, dropping values the loaded data no longer has.
    pub fn restore_filters(&mut self, saved: Filters) {
        let known = |value: Option<String>, options: &[String]| {
            value.filter(|v| options.iter().any(|o| o == v))
        };
        self.filters = Filters {
            competition: known(saved.competition, &self.competitions),
            season: known(saved.season, &self.seasons),
            team: known(saved.team, &self.teams),
        };
    }

    pub fn cycle_competition(&mut self) {
        self.filters.competition = cycle_option(&self.filters.competition, &self.competitions);
        let msg = format!("[INFO] Competition: {}", filter_label(&self.filters.competition));
        self.push_log(msg);
    }

    pub fn cycle_season(&mut self) {
        self.filters.season = cycle_option(&self.filters.season, &self.seasons);
        let msg = format!("[INFO] Season: {}", filter_label(&self.filters.season));
        self.push_log(msg);
    }

    pub fn cycle_team(&mut self) {
        self.filters.team = cycle_option(&self.filters.team, &self.teams);
        let msg = format!("[INFO] Team: {}", filter_label(&self.filters.team));
        self.push_log(msg);
    }

    pub fn reset_filters(&mut self) {
        self.filters = Filters::default();
        self.push_log("[INFO] Filters reset");
    }

    pub fn cycle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Overview => Screen::Formations,
            Screen::Formations => Screen::Overview,
        };
    }

    pub fn filtered_matches(&self) -> Vec<&MatchRecord> {
        self.tables
            .matches
            .iter()
            .filter(|m| self.filters.keeps(m))
            .collect()
    }

    fn filtered_ids(&self) -> HashSet<u64> {
        self.filtered_matches().iter().map(|m| m.match_id).collect()
    }

    pub fn kpis(&self) -> Kpis {
        let matches = self.filtered_matches();
        let ids: HashSet<u64> = matches.iter().map(|m| m.match_id).collect();
        let total_events = self
            .tables
            .event_counts
            .iter()
            .filter(|c| ids.contains(&c.match_id))
            .map(|c| c.count)
            .sum();
        let unique_players = self
            .tables
            .players
            .iter()
            .filter(|p| ids.contains(&p.match_id))
            .map(|p| p.player_name.as_str())
            .collect::<HashSet<_>>()
            .len();
        let goals: Vec<i64> = matches.iter().filter_map(|m| m.total_goals()).collect();
        let avg_goals = if goals.is_empty() {
            0.0
        } else {
            goals.iter().sum::<i64>() as f64 / goals.len() as f64
        };
        Kpis {
            total_matches: matches.len(),
            total_events,
            unique_players,
            avg_goals,
        }
    }

    /// Event counts by type over the filtered matches, top fifteen.
    pub fn event_type_distribution(&self) -> Vec<(String, u64)> {
        let ids = self.filtered_ids();
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for c in self.tables.event_counts.iter().filter(|c| ids.contains(&c.match_id)) {
            *totals.entry(c.event_type.as_str()).or_default() += c.count;
        }
        let mut out: Vec<(String, u64)> = totals
            .into_iter()
            .map(|(kind, n)| (kind.to_string(), n))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out.truncate(TOP_EVENT_TYPES);
        out
    }

    pub fn results_distribution(&self) -> Vec<(&'static str, u64)> {
        let matches = self.filtered_matches();
        [MatchResult::HomeWin, MatchResult::AwayWin, MatchResult::Draw]
            .into_iter()
            .map(|r| {
                let n = matches.iter().filter(|m| m.result() == Some(r)).count();
                (r.label(), n as u64)
            })
            .collect()
    }

    pub fn xg_histogram(&self) -> Vec<u64> {
        let ids = self.filtered_ids();
        xg_histogram(
            self.tables
                .shots
                .iter()
                .filter(|s| ids.contains(&s.match_id))
                .map(|s| s.xg),
            XG_BINS,
        )
    }

    /// Mean total goals per competition, highest first.
    pub fn avg_goals_by_competition(&self) -> Vec<(String, f64)> {
        let mut sums: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
        for m in self.filtered_matches() {
            let (Some(name), Some(goals)) = (m.competition_name.as_deref(), m.total_goals()) else {
                continue;
            };
            let entry = sums.entry(name).or_default();
            entry.0 += goals;
            entry.1 += 1;
        }
        let mut out: Vec<(String, f64)> = sums
            .into_iter()
            .map(|(name, (goals, n))| (name.to_string(), goals as f64 / n as f64))
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Formation rows of the filtered matches, narrowed to the selected team when there is one.
    pub fn formations(&self) -> Vec<&FormationRow> {
        let ids = self.filtered_ids();
        self.tables
            .formations
            .iter()
            .filter(|f| ids.contains(&f.match_id))
            .filter(|f| {
                self.filters
                    .team
                    .as_deref()
                    .is_none_or(|t| f.team_name.as_deref() == Some(t))
            })
            .collect()
    }

    pub fn formation_frequency(&self) -> Vec<(String, u64)> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for f in self.formations() {
            *counts.entry(f.formation.as_str()).or_default() += 1;
        }
        let mut out: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(label, n)| (label.to_string(), n))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

/// Equal-width bins over [0, 1]; 1.0 lands in the last bin and values outside are dropped.
pub fn xg_histogram(values: impl IntoIterator<Item = f64>, bins: usize) -> Vec<u64> {
    let mut out = vec![0u64; bins];
    if bins == 0 {
        return out;
    }
    for v in values {
        if !(0.0..=1.0).contains(&v) {
            continue;
        }
        let idx = ((v * bins as f64).floor() as usize).min(bins - 1);
        out[idx] += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{cycle_option, xg_histogram};

    #[test]
    fn cycling_wraps_through_all() {
        let options = vec!["A".to_string(), "B".to_string()];
        let first = cycle_option(&None, &options);
        assert_eq!(first.as_deref(), Some("A"));
        let second = cycle_option(&first, &options);
        assert_eq!(second.as_deref(), Some("B"));
        assert_eq!(cycle_option(&second, &options), None);
        assert_eq!(cycle_option(&Some("gone".to_string()), &options), None);
    }

    #[test]
    fn histogram_edges() {
        let bins = xg_histogram([0.0, 0.01, 0.5, 0.999, 1.0, 1.2, -0.1], 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[15], 1);
        assert_eq!(bins[29], 2);
        assert_eq!(bins.iter().sum::<u64>(), 5);
    }
}
