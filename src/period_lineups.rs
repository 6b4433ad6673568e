use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clock::{ClockBound, MatchClock, PeriodInstant};
use crate::statsbomb::{EventRecord, LineupRecord};

/// Identifies one lineup window: a team's span of a period with a fixed set of players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowKey {
    pub match_id: u64,
    pub team_id: u64,
    pub period: u8,
    pub start: MatchClock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupWindow {
    pub key: WindowKey,
    pub end: ClockBound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPlayer {
    pub key: WindowKey,
    pub end: ClockBound,
    pub player_id: u64,
    pub player_name: Option<String>,
    pub country_id: Option<u64>,
    pub country_name: Option<String>,
    pub position_name: Option<String>,
}

/// A lineup row turned into a half-open `[start, end)` interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stint {
    pub match_id: u64,
    pub team_id: u64,
    pub player_id: u64,
    pub player_name: Option<String>,
    pub country_id: Option<u64>,
    pub country_name: Option<String>,
    pub position_name: Option<String>,
    pub start: PeriodInstant,
    pub end: PeriodInstant,
    /// End point that feeds the timeline; `None` when the stint runs to the final whistle.
    pub end_marker: Option<(u8, MatchClock)>,
}

impl Stint {
    pub fn covers(&self, instant: PeriodInstant) -> bool {
        self.start <= instant && instant < self.end
    }

    fn overlaps(&self, other: &Stint) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineupIssue {
    MalformedClock {
        match_id: u64,
        team_id: u64,
        player_id: u64,
        raw: String,
    },
    MissingPeriod {
        match_id: u64,
        team_id: u64,
        player_id: u64,
    },
    EndsBeforeStart {
        match_id: u64,
        team_id: u64,
        player_id: u64,
    },
    OverlappingStints {
        match_id: u64,
        team_id: u64,
        player_id: u64,
        first_position: Option<String>,
        second_position: Option<String>,
    },
}

impl LineupIssue {
    pub fn match_id(&self) -> u64 {
        match self {
            LineupIssue::MalformedClock { match_id, .. }
            | LineupIssue::MissingPeriod { match_id, .. }
            | LineupIssue::EndsBeforeStart { match_id, .. }
            | LineupIssue::OverlappingStints { match_id, .. } => *match_id,
        }
    }
}

impl fmt::Display for LineupIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineupIssue::MalformedClock {
                match_id,
                team_id,
                player_id,
                raw,
            } => write!(
                f,
                "match {match_id} team {team_id} player {player_id}: malformed clock {raw:?}"
            ),
            LineupIssue::MissingPeriod {
                match_id,
                team_id,
                player_id,
            } => write!(
                f,
                "match {match_id} team {team_id} player {player_id}: stint has a time but no period"
            ),
            LineupIssue::EndsBeforeStart {
                match_id,
                team_id,
                player_id,
            } => write!(
                f,
                "match {match_id} team {team_id} player {player_id}: stint ends before it starts"
            ),
            LineupIssue::OverlappingStints {
                match_id,
                team_id,
                player_id,
                first_position,
                second_position,
            } => write!(
                f,
                "match {match_id} team {team_id} player {player_id}: overlapping stints ({} / {})",
                first_position.as_deref().unwrap_or("?"),
                second_position.as_deref().unwrap_or("?")
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineupReconstruction {
    pub windows: Vec<LineupWindow>,
    pub players: Vec<WindowPlayer>,
    pub issues: Vec<LineupIssue>,
}

impl LineupReconstruction {
    pub fn players_in(&self, key: &WindowKey) -> impl Iterator<Item = &WindowPlayer> {
        let key = *key;
        self.players.iter().filter(move |p| p.key == key)
    }

    pub fn match_ids(&self) -> BTreeSet<u64> {
        self.windows.iter().map(|w| w.key.match_id).collect()
    }
}

/// The last period played in each match, taken from the events.
pub fn last_periods(events: &[EventRecord]) -> HashMap<u64, u8> {
    let mut out: HashMap<u64, u8> = HashMap::new();
    for event in events {
        let Some(period) = event.period else {
            continue;
        };
        let entry = out.entry(event.match_id).or_insert(period);
        *entry = (*entry).max(period);
    }
    out
}

/// Builds stints from lineup rows. Rows for unused substitutes (no start) are dropped silently.
pub fn normalize_stints(
    lineups: &[&LineupRecord],
    last_period: Option<u8>,
) -> (Vec<Stint>, Vec<LineupIssue>) {
    let mut stints = Vec::new();
    let mut issues = Vec::new();

    for row in lineups {
        let ids = (row.match_id, row.team_id, row.player_id);
        let Some(from_time) = row.from_time.as_deref() else {
            continue;
        };
        if row.to_time.as_deref() == Some(from_time) {
            continue;
        }
        let Some(from_period) = row.from_period else {
            issues.push(LineupIssue::MissingPeriod {
                match_id: ids.0,
                team_id: ids.1,
                player_id: ids.2,
            });
            continue;
        };

        let malformed = |raw: &str| LineupIssue::MalformedClock {
            match_id: ids.0,
            team_id: ids.1,
            player_id: ids.2,
            raw: raw.to_string(),
        };
        let from_clock = match MatchClock::parse(from_time) {
            Ok(clock) => clock,
            Err(_) => {
                issues.push(malformed(from_time));
                continue;
            }
        };
        // Only the fallback end period is clamped; an explicit one is kept as given.
        let to_period = row
            .to_period
            .unwrap_or_else(|| last_period.unwrap_or(from_period).max(from_period));
        let (end, end_marker) = match row.to_time.as_deref() {
            None => (PeriodInstant::open(to_period), None),
            Some(raw) => match MatchClock::parse(raw) {
                Ok(clock) => (PeriodInstant::at(to_period, clock), Some((to_period, clock))),
                Err(_) => {
                    issues.push(malformed(raw));
                    continue;
                }
            },
        };

        let start = PeriodInstant::at(from_period, from_clock);
        if end <= start {
            issues.push(LineupIssue::EndsBeforeStart {
                match_id: ids.0,
                team_id: ids.1,
                player_id: ids.2,
            });
            continue;
        }

        stints.push(Stint {
            match_id: row.match_id,
            team_id: row.team_id,
            player_id: row.player_id,
            player_name: row.player_name.clone(),
            country_id: row.country_id,
            country_name: row.country_name.clone(),
            position_name: row.position_name.clone(),
            start,
            end,
            end_marker,
        });
    }

    (stints, issues)
}

/// Flags a player holding two stints at once for the same team.
pub fn overlapping_stints(stints: &[Stint]) -> Vec<LineupIssue> {
    let mut by_player: BTreeMap<(u64, u64, u64), Vec<&Stint>> = BTreeMap::new();
    for stint in stints {
        by_player
            .entry((stint.match_id, stint.team_id, stint.player_id))
            .or_default()
            .push(stint);
    }

    let mut issues = Vec::new();
    for ((match_id, team_id, player_id), mut group) in by_player {
        group.sort_by_key(|s| (s.start, s.end));
        for pair in group.windows(2) {
            if pair[0].overlaps(pair[1]) {
                issues.push(LineupIssue::OverlappingStints {
                    match_id,
                    team_id,
                    player_id,
                    first_position: pair[0].position_name.clone(),
                    second_position: pair[1].position_name.clone(),
                });
            }
        }
    }
    issues
}

/// Cuts every (team, period) into windows at stint boundaries and half markers.
/// The last window of a period stays open.
pub fn build_timeline(stints: &[Stint], half_markers: &[&EventRecord]) -> Vec<LineupWindow> {
    let mut points: BTreeMap<(u64, u64, u8), BTreeSet<MatchClock>> = BTreeMap::new();

    for stint in stints {
        if let ClockBound::At(clock) = stint.start.clock {
            points
                .entry((stint.match_id, stint.team_id, stint.start.period))
                .or_default()
                .insert(clock);
        }
        if let Some((period, clock)) = stint.end_marker {
            points
                .entry((stint.match_id, stint.team_id, period))
                .or_default()
                .insert(clock);
        }
    }
    for event in half_markers {
        let (Some(team_id), Some(period), Some(minute), Some(second)) =
            (event.team_id, event.period, event.minute, event.second)
        else {
            continue;
        };
        points
            .entry((event.match_id, team_id, period))
            .or_default()
            .insert(MatchClock::new(minute, second));
    }

    let mut windows = Vec::new();
    for ((match_id, team_id, period), clocks) in points {
        let clocks: Vec<MatchClock> = clocks.into_iter().collect();
        for (idx, start) in clocks.iter().enumerate() {
            let end = clocks
                .get(idx + 1)
                .map(|next| ClockBound::At(*next))
                .unwrap_or(ClockBound::Open);
            windows.push(LineupWindow {
                key: WindowKey {
                    match_id,
                    team_id,
                    period,
                    start: *start,
                },
                end,
            });
        }
    }
    windows
}

/// Puts every stint covering a window's start into that window, once per player.
pub fn assign_players(windows: &[LineupWindow], stints: &[Stint]) -> Vec<WindowPlayer> {
    let mut by_team: HashMap<(u64, u64), Vec<&Stint>> = HashMap::new();
    for stint in stints {
        by_team
            .entry((stint.match_id, stint.team_id))
            .or_default()
            .push(stint);
    }
    for group in by_team.values_mut() {
        group.sort_by_key(|s| (s.start, s.player_id));
    }

    let mut out = Vec::new();
    for window in windows {
        let Some(team_stints) = by_team.get(&(window.key.match_id, window.key.team_id)) else {
            continue;
        };
        let instant = PeriodInstant::at(window.key.period, window.key.start);
        let mut seen = BTreeSet::new();
        let mut assigned: Vec<WindowPlayer> = team_stints
            .iter()
            .filter(|s| s.covers(instant))
            .filter(|s| seen.insert(s.player_id))
            .map(|s| WindowPlayer {
                key: window.key,
                end: window.end,
                player_id: s.player_id,
                player_name: s.player_name.clone(),
                country_id: s.country_id,
                country_name: s.country_name.clone(),
                position_name: s.position_name.clone(),
            })
            .collect();
        assigned.sort_by_key(|p| p.player_id);
        out.extend(assigned);
    }
    out
}

fn reconstruct_match(
    lineups: &[&LineupRecord],
    half_markers: &[&EventRecord],
    last_period: Option<u8>,
) -> LineupReconstruction {
    let (stints, mut issues) = normalize_stints(lineups, last_period);
    issues.extend(overlapping_stints(&stints));
    let windows = build_timeline(&stints, half_markers);
    let players = assign_players(&windows, &stints);
    LineupReconstruction {
        windows,
        players,
        issues,
    }
}

/// Reconstructs who was on the pitch for every match/team/period window.
/// Matches are independent and processed in parallel; output is ordered by match.
pub fn reconstruct(lineups: &[LineupRecord], events: &[EventRecord]) -> LineupReconstruction {
    let last = last_periods(events);

    let mut lineups_by_match: BTreeMap<u64, Vec<&LineupRecord>> = BTreeMap::new();
    for row in lineups {
        lineups_by_match.entry(row.match_id).or_default().push(row);
    }
    let mut markers_by_match: HashMap<u64, Vec<&EventRecord>> = HashMap::new();
    for event in events.iter().filter(|e| e.is_half_marker()) {
        markers_by_match.entry(event.match_id).or_default().push(event);
    }

    let per_match: Vec<LineupReconstruction> = lineups_by_match
        .into_iter()
        .collect::<Vec<_>>()
        .par_iter()
        .map(|(match_id, rows)| {
            let markers = markers_by_match
                .get(match_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            reconstruct_match(rows, markers, last.get(match_id).copied())
        })
        .collect();

    let mut out = LineupReconstruction::default();
    for part in per_match {
        out.windows.extend(part.windows);
        out.players.extend(part.players);
        out.issues.extend(part.issues);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        LineupIssue, Stint, build_timeline, last_periods, normalize_stints, overlapping_stints,
    };
    use crate::clock::{ClockBound, MatchClock, PeriodInstant};
    use crate::statsbomb::{EventRecord, LineupRecord};

    fn stint_row(player: u64, from: &str, to: Option<&str>, fp: u8, tp: Option<u8>) -> LineupRecord {
        LineupRecord {
            match_id: 1,
            team_id: 10,
            player_id: player,
            position_name: Some("Center Back".to_string()),
            from_time: Some(from.to_string()),
            to_time: to.map(str::to_string),
            from_period: Some(fp),
            to_period: tp,
            ..LineupRecord::default()
        }
    }

    #[test]
    fn open_stints_run_to_last_period() {
        let row = stint_row(5, "00:00", None, 1, None);
        let (stints, issues) = normalize_stints(&[&row], Some(2));
        assert!(issues.is_empty());
        assert_eq!(stints[0].end, PeriodInstant::open(2));
        assert_eq!(stints[0].end_marker, None);
    }

    #[test]
    fn zero_length_and_bench_rows_are_skipped() {
        let zero = stint_row(5, "60:00", Some("60:00"), 2, Some(2));
        let bench = LineupRecord {
            from_time: None,
            ..stint_row(6, "00:00", None, 1, None)
        };
        let (stints, issues) = normalize_stints(&[&zero, &bench], Some(2));
        assert!(stints.is_empty());
        assert!(issues.is_empty());
    }

    #[test]
    fn malformed_and_reversed_stints_are_reported() {
        let bad = stint_row(5, "sixty", None, 1, None);
        let reversed = stint_row(6, "70:00", Some("20:00"), 2, Some(1));
        let (stints, issues) = normalize_stints(&[&bad, &reversed], Some(2));
        assert!(stints.is_empty());
        assert!(matches!(issues[0], LineupIssue::MalformedClock { player_id: 5, .. }));
        assert!(matches!(issues[1], LineupIssue::EndsBeforeStart { player_id: 6, .. }));
    }

    #[test]
    fn end_period_before_start_period_is_reported() {
        let row = stint_row(7, "50:00", Some("60:00"), 2, Some(1));
        let (stints, issues) = normalize_stints(&[&row], Some(2));
        assert!(stints.is_empty());
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], LineupIssue::EndsBeforeStart { player_id: 7, .. }));

        let open = stint_row(8, "50:00", None, 2, Some(1));
        let (stints, issues) = normalize_stints(&[&open], Some(2));
        assert!(stints.is_empty());
        assert!(matches!(issues[0], LineupIssue::EndsBeforeStart { player_id: 8, .. }));
    }

    #[test]
    fn overlaps_are_flagged_but_handovers_are_not() {
        let a = stint_row(5, "00:00", Some("60:00"), 1, Some(2));
        let b = stint_row(5, "60:00", None, 2, None);
        let c = stint_row(5, "55:00", None, 2, None);
        let (clean, _) = normalize_stints(&[&a, &b], Some(2));
        assert!(overlapping_stints(&clean).is_empty());
        let (dirty, _) = normalize_stints(&[&a, &c], Some(2));
        assert_eq!(overlapping_stints(&dirty).len(), 1);
    }

    #[test]
    fn timeline_windows_are_contiguous_and_end_open() {
        let rows = [
            stint_row(1, "00:00", None, 1, None),
            stint_row(2, "00:00", Some("62:10"), 1, Some(2)),
            stint_row(3, "62:10", None, 2, None),
        ];
        let refs: Vec<&LineupRecord> = rows.iter().collect();
        let (stints, _) = normalize_stints(&refs, Some(2));
        let half_start = EventRecord {
            match_id: 1,
            team_id: Some(10),
            period: Some(2),
            minute: Some(45),
            second: Some(0),
            event_type: Some("Half Start".to_string()),
            ..EventRecord::default()
        };
        let windows = build_timeline(&stints, &[&half_start]);
        let starts: Vec<(u8, MatchClock, ClockBound)> = windows
            .iter()
            .map(|w| (w.key.period, w.key.start, w.end))
            .collect();
        assert_eq!(
            starts,
            vec![
                (1, MatchClock::new(0, 0), ClockBound::Open),
                (2, MatchClock::new(45, 0), ClockBound::At(MatchClock::new(62, 10))),
                (2, MatchClock::new(62, 10), ClockBound::Open),
            ]
        );
    }

    #[test]
    fn last_period_is_max_event_period() {
        let events: Vec<EventRecord> = [1u8, 2, 4, 3]
            .iter()
            .map(|p| EventRecord {
                match_id: 9,
                period: Some(*p),
                ..EventRecord::default()
            })
            .collect();
        assert_eq!(last_periods(&events).get(&9), Some(&4));
    }

    #[test]
    fn stint_covers_is_half_open() {
        let stint = Stint {
            match_id: 1,
            team_id: 1,
            player_id: 1,
            player_name: None,
            country_id: None,
            country_name: None,
            position_name: None,
            start: PeriodInstant::at(1, MatchClock::new(10, 0)),
            end: PeriodInstant::at(2, MatchClock::new(50, 0)),
            end_marker: Some((2, MatchClock::new(50, 0))),
        };
        assert!(stint.covers(PeriodInstant::at(1, MatchClock::new(10, 0))));
        assert!(stint.covers(PeriodInstant::open(1)));
        assert!(stint.covers(PeriodInstant::at(2, MatchClock::new(45, 0))));
        assert!(!stint.covers(PeriodInstant::at(2, MatchClock::new(50, 0))));
        assert!(!stint.covers(PeriodInstant::at(1, MatchClock::new(9, 59))));
    }
}
