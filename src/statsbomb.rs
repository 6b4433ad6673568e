use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use parquet::record::Field;
use serde::{Deserialize, Serialize};

use crate::columnar::{FromRow, as_bool, as_f64, as_i64, as_string, as_u64, read_table_where};
use crate::config::DataPaths;

pub const MATCHES_FILE: &str = "matches.parquet";
pub const EVENTS_FILE: &str = "events.parquet";
pub const LINEUPS_FILE: &str = "lineups.parquet";
pub const THREE_SIXTY_FILE: &str = "three_sixty.parquet";
pub const REFERENCE_FILE: &str = "reference.parquet";

pub const HALF_START: &str = "Half Start";
pub const HALF_END: &str = "Half End";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: u64,
    pub match_date: Option<String>,
    pub competition_name: Option<String>,
    pub season_name: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub match_status_360: Option<String>,
}

impl MatchRecord {
    pub fn total_goals(&self) -> Option<i64> {
        Some(self.home_score? + self.away_score?)
    }

    pub fn result(&self) -> Option<MatchResult> {
        let (home, away) = (self.home_score?, self.away_score?);
        Some(if home > away {
            MatchResult::HomeWin
        } else if away > home {
            MatchResult::AwayWin
        } else {
            MatchResult::Draw
        })
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team.as_deref() == Some(team) || self.away_team.as_deref() == Some(team)
    }

    pub fn has_360(&self) -> bool {
        self.match_status_360
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("available"))
    }
}

impl FromRow for MatchRecord {
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "match_date",
        "competition_name",
        "season_name",
        "home_team",
        "away_team",
        "home_score",
        "away_score",
        "match_status_360",
    ];
    const REQUIRED: &'static [&'static str] = &["match_id"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "match_id" => self.match_id = as_u64(field).unwrap_or_default(),
            "match_date" => self.match_date = as_string(field),
            "competition_name" => self.competition_name = as_string(field),
            "season_name" => self.season_name = as_string(field),
            "home_team" => self.home_team = as_string(field),
            "away_team" => self.away_team = as_string(field),
            "home_score" => self.home_score = as_i64(field),
            "away_score" => self.away_score = as_i64(field),
            "match_status_360" => self.match_status_360 = as_string(field),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchResult {
    HomeWin,
    AwayWin,
    Draw,
}

impl MatchResult {
    pub fn label(self) -> &'static str {
        match self {
            MatchResult::HomeWin => "Home Win",
            MatchResult::AwayWin => "Away Win",
            MatchResult::Draw => "Draw",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    pub id: Option<String>,
    pub index_num: i64,
    pub match_id: u64,
    pub team_id: Option<u64>,
    pub team: Option<String>,
    pub period: Option<u8>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub timestamp: Option<String>,
    pub event_type: Option<String>,
    pub duration: Option<f64>,
    pub possession: Option<i64>,
    pub possession_team_id: Option<u64>,
    pub play_pattern: Option<String>,
    pub player_id: Option<u64>,
    pub player: Option<String>,
    pub position_id: Option<i64>,
    pub location_x: Option<f64>,
    pub location_y: Option<f64>,
    pub pass_length: Option<f64>,
    pub pass_height: Option<String>,
    pub pass_body_part: Option<String>,
    pub pass_technique: Option<String>,
    pub pass_outcome: Option<String>,
    pub shot_statsbomb_xg: Option<f64>,
    pub substitution_replacement_id: Option<u64>,
}

impl EventRecord {
    pub fn is_type(&self, name: &str) -> bool {
        self.event_type.as_deref() == Some(name)
    }

    pub fn is_half_marker(&self) -> bool {
        self.is_type(HALF_START) || self.is_type(HALF_END)
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.location_x?, self.location_y?))
    }
}

impl FromRow for EventRecord {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "index_num",
        "match_id",
        "team_id",
        "team",
        "period",
        "minute",
        "second",
        "timestamp",
        "type",
        "duration",
        "possession",
        "possession_team_id",
        "play_pattern",
        "player_id",
        "player",
        "position_id",
        "location_x",
        "location_y",
        "pass_length",
        "pass_height",
        "pass_body_part",
        "pass_technique",
        "pass_outcome",
        "shot_statsbomb_xg",
        "substitution_replacement_id",
    ];
    const REQUIRED: &'static [&'static str] = &["match_id", "type"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "id" => self.id = as_string(field),
            "index_num" => self.index_num = as_i64(field).unwrap_or_default(),
            "match_id" => self.match_id = as_u64(field).unwrap_or_default(),
            "team_id" => self.team_id = as_u64(field),
            "team" => self.team = as_string(field),
            "period" => self.period = as_i64(field).and_then(|v| u8::try_from(v).ok()),
            "minute" => self.minute = as_i64(field).and_then(|v| u32::try_from(v).ok()),
            "second" => self.second = as_i64(field).and_then(|v| u32::try_from(v).ok()),
            "timestamp" => self.timestamp = as_string(field),
            "type" => self.event_type = as_string(field),
            "duration" => self.duration = as_f64(field),
            "possession" => self.possession = as_i64(field),
            "possession_team_id" => self.possession_team_id = as_u64(field),
            "play_pattern" => self.play_pattern = as_string(field),
            "player_id" => self.player_id = as_u64(field),
            "player" => self.player = as_string(field),
            "position_id" => self.position_id = as_i64(field),
            "location_x" => self.location_x = as_f64(field),
            "location_y" => self.location_y = as_f64(field),
            "pass_length" => self.pass_length = as_f64(field),
            "pass_height" => self.pass_height = as_string(field),
            "pass_body_part" => self.pass_body_part = as_string(field),
            "pass_technique" => self.pass_technique = as_string(field),
            "pass_outcome" => self.pass_outcome = as_string(field),
            "shot_statsbomb_xg" => self.shot_statsbomb_xg = as_f64(field),
            "substitution_replacement_id" => self.substitution_replacement_id = as_u64(field),
            _ => {}
        }
    }
}

/// One lineup row: a player's stint in a single position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineupRecord {
    pub match_id: u64,
    pub team_id: u64,
    pub player_id: u64,
    pub player_name: Option<String>,
    pub country_id: Option<u64>,
    pub country_name: Option<String>,
    pub position_name: Option<String>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub from_period: Option<u8>,
    pub to_period: Option<u8>,
    pub card_type: Option<String>,
}

impl FromRow for LineupRecord {
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "team_id",
        "player_id",
        "player_name",
        "country_id",
        "country_name",
        "position_name",
        "from_time",
        "to_time",
        "from_period",
        "to_period",
        "card_type",
    ];
    const REQUIRED: &'static [&'static str] = &["match_id", "team_id", "player_id"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "match_id" => self.match_id = as_u64(field).unwrap_or_default(),
            "team_id" => self.team_id = as_u64(field).unwrap_or_default(),
            "player_id" => self.player_id = as_u64(field).unwrap_or_default(),
            "player_name" => self.player_name = as_string(field),
            "country_id" => self.country_id = as_u64(field),
            "country_name" => self.country_name = as_string(field),
            "position_name" => self.position_name = as_string(field),
            "from_time" => self.from_time = as_string(field),
            "to_time" => self.to_time = as_string(field),
            "from_period" => self.from_period = as_i64(field).and_then(|v| u8::try_from(v).ok()),
            "to_period" => self.to_period = as_i64(field).and_then(|v| u8::try_from(v).ok()),
            "card_type" => self.card_type = as_string(field),
            _ => {}
        }
    }
}

/// One player location inside a 360 freeze frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreezeFrameRecord {
    pub match_id: u64,
    pub event_uuid: String,
    pub teammate: bool,
    pub actor: bool,
    pub keeper: bool,
    pub location_x: Option<f64>,
    pub location_y: Option<f64>,
}

impl FromRow for FreezeFrameRecord {
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "event_uuid",
        "teammate",
        "actor",
        "keeper",
        "location_x",
        "location_y",
    ];
    const REQUIRED: &'static [&'static str] = &["match_id", "event_uuid"];

    fn set(&mut self, column: &str, field: &Field) {
        match column {
            "match_id" => self.match_id = as_u64(field).unwrap_or_default(),
            "event_uuid" => self.event_uuid = as_string(field).unwrap_or_default(),
            "teammate" => self.teammate = as_bool(field).unwrap_or(false),
            "actor" => self.actor = as_bool(field).unwrap_or(false),
            "keeper" => self.keeper = as_bool(field).unwrap_or(false),
            "location_x" => self.location_x = as_f64(field),
            "location_y" => self.location_y = as_f64(field),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceRecord {
    pub table_name: Option<String>,
}

impl FromRow for ReferenceRecord {
    const COLUMNS: &'static [&'static str] = &["table_name"];

    fn set(&mut self, column: &str, field: &Field) {
        if column == "table_name" {
            self.table_name = as_string(field);
        }
    }
}

/// Which matches a load should keep. An empty filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub match_ids: HashSet<u64>,
}

impl MatchFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            match_ids: ids.into_iter().collect(),
        }
    }

    pub fn keeps(&self, match_id: u64) -> bool {
        self.match_ids.is_empty() || self.match_ids.contains(&match_id)
    }
}

pub fn load_matches(paths: &DataPaths) -> Result<Vec<MatchRecord>> {
    read_table_where(&paths.statsbomb(MATCHES_FILE), |_: &MatchRecord| true)
}

pub fn load_events(paths: &DataPaths, filter: &MatchFilter) -> Result<Vec<EventRecord>> {
    load_events_from(&paths.statsbomb(EVENTS_FILE), filter)
}

pub fn load_events_from(path: &Path, filter: &MatchFilter) -> Result<Vec<EventRecord>> {
    read_table_where(path, |e: &EventRecord| filter.keeps(e.match_id))
}

pub fn load_lineups(paths: &DataPaths, filter: &MatchFilter) -> Result<Vec<LineupRecord>> {
    read_table_where(&paths.statsbomb(LINEUPS_FILE), |l: &LineupRecord| {
        filter.keeps(l.match_id)
    })
}

pub fn load_freeze_frames(paths: &DataPaths, filter: &MatchFilter) -> Result<Vec<FreezeFrameRecord>> {
    read_table_where(&paths.statsbomb(THREE_SIXTY_FILE), |f: &FreezeFrameRecord| {
        filter.keeps(f.match_id)
    })
}

pub fn load_reference(paths: &DataPaths) -> Result<Vec<ReferenceRecord>> {
    read_table_where(&paths.statsbomb(REFERENCE_FILE), |_: &ReferenceRecord| true)
}

/// Team names keyed by id, as named in the events.
pub fn team_names(events: &[EventRecord]) -> HashMap<u64, String> {
    let mut out = HashMap::new();
    for event in events {
        if let (Some(id), Some(name)) = (event.team_id, event.team.as_deref()) {
            out.entry(id).or_insert_with(|| name.to_string());
        }
    }
    out
}

/// Distinct non-empty position names, the input of the position taxonomy.
pub fn distinct_position_names(lineups: &[LineupRecord]) -> Vec<String> {
    let mut names: Vec<String> = lineups
        .iter()
        .filter_map(|l| l.position_name.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::{LineupRecord, MatchFilter, MatchRecord, MatchResult, distinct_position_names};

    #[test]
    fn match_result_and_goals() {
        let m = MatchRecord {
            match_id: 1,
            home_score: Some(2),
            away_score: Some(2),
            ..MatchRecord::default()
        };
        assert_eq!(m.result(), Some(MatchResult::Draw));
        assert_eq!(m.total_goals(), Some(4));
        assert_eq!(MatchRecord::default().result(), None);
    }

    #[test]
    fn filter_keeps_everything_when_empty() {
        assert!(MatchFilter::all().keeps(15973));
        let only = MatchFilter::only([7582]);
        assert!(only.keeps(7582));
        assert!(!only.keeps(15973));
    }

    #[test]
    fn position_names_are_distinct_and_sorted() {
        let rows: Vec<LineupRecord> = ["Right Back", "Goalkeeper", "Right Back", " "]
            .iter()
            .map(|name| LineupRecord {
                position_name: Some(name.to_string()),
                ..LineupRecord::default()
            })
            .collect();
        assert_eq!(distinct_position_names(&rows), vec!["Goalkeeper", "Right Back"]);
    }
}
