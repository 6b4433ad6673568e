use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::statsbomb::{EventRecord, HALF_END, HALF_START};

const STARTING_XI: &str = "Starting XI";
const PRESSURE: &str = "Pressure";
const FOUL_COMMITTED: &str = "Foul Committed";

/// Event types that never describe on-ball play.
pub const EXCLUDED_TYPES: &[&str] = &[
    STARTING_XI,
    HALF_START,
    HALF_END,
    "Ball Receipt*",
    "Ball Recovery",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PassProfile {
    pub attempts: u32,
    pub distance: f64,
    pub high: u32,
    pub ground: u32,
    pub low: u32,
    pub drop_kick: u32,
    pub head: u32,
    pub keeper_arm: u32,
    pub left_foot: u32,
    pub right_foot: u32,
    pub other_body_part: u32,
    pub inswinging: u32,
    pub straight: u32,
    pub through_ball: u32,
}

impl PassProfile {
    fn add(&mut self, event: &EventRecord) {
        if let Some(length) = event.pass_length {
            self.attempts += 1;
            self.distance += length;
        }
        match event.pass_height.as_deref() {
            Some("High Pass") => self.high += 1,
            Some("Ground Pass") => self.ground += 1,
            Some("Low Pass") => self.low += 1,
            _ => {}
        }
        match event.pass_body_part.as_deref() {
            Some("Drop Kick") => self.drop_kick += 1,
            Some("Head") => self.head += 1,
            Some("Keeper Arm") => self.keeper_arm += 1,
            Some("Left Foot") => self.left_foot += 1,
            Some("Right Foot") => self.right_foot += 1,
            Some("Other") => self.other_body_part += 1,
            _ => {}
        }
        match event.pass_technique.as_deref() {
            Some("Inswinging") => self.inswinging += 1,
            Some("Straight") => self.straight += 1,
            Some("Through Ball") => self.through_ball += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PossessionSummary {
    pub match_id: u64,
    pub period: Option<u8>,
    pub possession: Option<i64>,
    pub possession_team_id: Option<u64>,
    pub play_pattern: Option<String>,
    pub min_index: i64,
    pub max_index: i64,
    pub total_duration: f64,
    pub carries: u32,
    pub passes: u32,
    pub pressures: u32,
    pub shots: u32,
    pub dribbles: u32,
    pub dribble_pasts: u32,
    pub dispossessions: u32,
    pub miscontrols: u32,
    pub interceptions: u32,
    /// Sum of the step distances; `None` when no event in the group has a successor.
    pub total_distance: Option<f64>,
    pub possessing_players: u32,
    pub pass: PassProfile,
    pub start: Option<(f64, f64)>,
    pub end: Option<(f64, f64)>,
}

impl PossessionSummary {
    /// Straight-line distance between where the possession started and ended.
    pub fn relative_distance(&self) -> Option<f64> {
        Some(euclidean(self.start?, self.end?))
    }
}

pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn on_ball(event: &EventRecord) -> bool {
    let excluded = event
        .event_type
        .as_deref()
        .is_some_and(|t| EXCLUDED_TYPES.contains(&t));
    !excluded
        && event.possession_team_id.is_some()
        && event.possession_team_id == event.team_id
        && event.location().is_some()
}

/// Events kept for possession analysis, ordered by index, each paired with the
/// distance to the next kept event of the same match.
pub fn possession_timeline(
    events: &[EventRecord],
    match_id: u64,
) -> Vec<(&EventRecord, Option<f64>)> {
    let mut kept: Vec<&EventRecord> = events
        .iter()
        .filter(|e| e.match_id == match_id && on_ball(e))
        .collect();
    kept.sort_by_key(|e| e.index_num);

    let mut out = Vec::with_capacity(kept.len());
    for (idx, event) in kept.iter().enumerate() {
        let step = kept
            .get(idx + 1)
            .and_then(|next| Some(euclidean(event.location()?, next.location()?)));
        out.push((*event, step));
    }
    out
}

type GroupKey = (Option<u8>, Option<i64>, Option<u64>, Option<String>);

pub fn summarize(events: &[EventRecord], match_id: u64) -> Vec<PossessionSummary> {
    let timeline = possession_timeline(events, match_id);
    let mut groups: BTreeMap<GroupKey, (PossessionSummary, HashSet<u64>)> = BTreeMap::new();

    for (event, step) in timeline {
        let key = (
            event.period,
            event.possession,
            event.possession_team_id,
            event.play_pattern.clone(),
        );
        let (summary, players) = groups.entry(key).or_insert_with(|| {
            (
                PossessionSummary {
                    match_id,
                    period: event.period,
                    possession: event.possession,
                    possession_team_id: event.possession_team_id,
                    play_pattern: event.play_pattern.clone(),
                    min_index: event.index_num,
                    max_index: event.index_num,
                    start: event.location(),
                    end: event.location(),
                    ..PossessionSummary::default()
                },
                HashSet::new(),
            )
        });

        if event.index_num < summary.min_index {
            summary.min_index = event.index_num;
            summary.start = event.location();
        }
        if event.index_num > summary.max_index {
            summary.max_index = event.index_num;
            summary.end = event.location();
        }
        summary.total_duration += event.duration.unwrap_or(0.0);
        match event.event_type.as_deref() {
            Some("Carry") => summary.carries += 1,
            Some("Pass") => summary.passes += 1,
            Some("Pressure") => summary.pressures += 1,
            Some("Shot") => summary.shots += 1,
            Some("Dribble") => summary.dribbles += 1,
            Some("Dribble Past") => summary.dribble_pasts += 1,
            Some("Dispossessed") => summary.dispossessions += 1,
            Some("Miscontrol") => summary.miscontrols += 1,
            Some("Interception") => summary.interceptions += 1,
            _ => {}
        }
        if let Some(step) = step {
            *summary.total_distance.get_or_insert(0.0) += step;
        }
        if let Some(player) = event.player_id {
            players.insert(player);
        }
        summary.pass.add(event);
    }

    let mut out: Vec<PossessionSummary> = groups
        .into_values()
        .map(|(mut summary, players)| {
            summary.possessing_players = players.len() as u32;
            summary
        })
        .collect();
    out.sort_by(|a, b| {
        a.possession
            .cmp(&b.possession)
            .then(a.period.cmp(&b.period))
            .then(a.min_index.cmp(&b.min_index))
    });
    out
}

/// Events that disagree with their possession attribution.
#[derive(Debug, Clone, Default)]
pub struct PossessionAudit<'a> {
    /// Events by the non-possessing team, pressures aside.
    pub foreign_events: Vec<&'a EventRecord>,
    /// Off-team events of players seen under more than one possession team.
    pub multi_team_players: Vec<&'a EventRecord>,
}

impl PossessionAudit<'_> {
    pub fn is_clean(&self) -> bool {
        self.foreign_events.is_empty() && self.multi_team_players.is_empty()
    }

    pub fn flagged_players(&self) -> BTreeSet<u64> {
        self.multi_team_players
            .iter()
            .filter_map(|e| e.player_id)
            .collect()
    }
}

fn off_team(event: &EventRecord) -> bool {
    matches!((event.possession_team_id, event.team_id), (Some(p), Some(t)) if p != t)
}

pub fn possession_audit(events: &[EventRecord], match_id: u64) -> PossessionAudit<'_> {
    let mut scoped: Vec<&EventRecord> = events
        .iter()
        .filter(|e| e.match_id == match_id)
        .filter(|e| !e.is_type(STARTING_XI) && !e.is_type(HALF_START))
        .collect();
    scoped.sort_by_key(|e| e.index_num);

    let foreign_events = scoped
        .iter()
        .copied()
        .filter(|e| off_team(e) && !e.is_type(PRESSURE))
        .collect();

    let subset: Vec<&EventRecord> = scoped
        .iter()
        .copied()
        .filter(|e| !e.is_type(PRESSURE) && !e.is_type(FOUL_COMMITTED))
        .collect();
    let mut teams_by_player: HashMap<u64, HashSet<u64>> = HashMap::new();
    for event in &subset {
        if let (Some(player), Some(team)) = (event.player_id, event.possession_team_id) {
            teams_by_player.entry(player).or_default().insert(team);
        }
    }
    let multi_team_players = subset
        .into_iter()
        .filter(|e| {
            e.player_id
                .and_then(|p| teams_by_player.get(&p))
                .is_some_and(|teams| teams.len() > 1)
        })
        .filter(|e| off_team(e))
        .collect();

    PossessionAudit {
        foreign_events,
        multi_team_players,
    }
}
