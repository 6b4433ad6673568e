use pitch_lab::clock::{ClockBound, MatchClock};
use pitch_lab::formations::{aggregate, lineup_combinations};
use pitch_lab::period_lineups::{LineupIssue, reconstruct};
use pitch_lab::position_type::PositionTaxonomy;
use pitch_lab::statsbomb::{EventRecord, LineupRecord, distinct_position_names};

const MATCH: u64 = 3_869_685;
const HOME: u64 = 779;

fn row(player_id: u64, position: &str, from: (&str, u8), to: Option<(&str, u8)>) -> LineupRecord {
    LineupRecord {
        match_id: MATCH,
        team_id: HOME,
        player_id,
        player_name: Some(format!("Player {player_id}")),
        position_name: Some(position.to_string()),
        from_time: Some(from.0.to_string()),
        from_period: Some(from.1),
        to_time: to.map(|t| t.0.to_string()),
        to_period: to.map(|t| t.1),
        ..LineupRecord::default()
    }
}

fn half_start(period: u8, minute: u32) -> EventRecord {
    EventRecord {
        match_id: MATCH,
        team_id: Some(HOME),
        period: Some(period),
        minute: Some(minute),
        second: Some(0),
        event_type: Some("Half Start".to_string()),
        ..EventRecord::default()
    }
}

/// A 4-4-2 that switches to 4-5-1 when a forward makes way for a midfielder at 62:10.
fn fixture() -> (Vec<LineupRecord>, Vec<EventRecord>) {
    let mut lineups = vec![
        row(1, "Goalkeeper", ("00:00", 1), None),
        row(2, "Left Back", ("00:00", 1), None),
        row(3, "Left Center Back", ("00:00", 1), None),
        row(4, "Right Center Back", ("00:00", 1), None),
        row(5, "Right Back", ("00:00", 1), None),
        row(6, "Left Midfield", ("00:00", 1), None),
        row(7, "Left Center Midfield", ("00:00", 1), None),
        row(8, "Right Center Midfield", ("00:00", 1), None),
        row(9, "Right Midfield", ("00:00", 1), None),
        row(10, "Left Center Forward", ("00:00", 1), None),
        row(11, "Right Center Forward", ("00:00", 1), Some(("62:10", 2))),
        row(12, "Center Midfield", ("62:10", 2), None),
    ];
    // Unused substitute.
    lineups.push(LineupRecord {
        from_time: None,
        from_period: None,
        ..row(13, "Goalkeeper", ("00:00", 1), None)
    });
    let events = vec![half_start(1, 0), half_start(2, 45)];
    (lineups, events)
}

#[test]
fn windows_follow_half_markers_and_substitutions() {
    let (lineups, events) = fixture();
    let reconstruction = reconstruct(&lineups, &events);
    assert!(reconstruction.issues.is_empty());

    let windows: Vec<(u8, MatchClock, ClockBound)> = reconstruction
        .windows
        .iter()
        .map(|w| (w.key.period, w.key.start, w.end))
        .collect();
    assert_eq!(
        windows,
        vec![
            (1, MatchClock::new(0, 0), ClockBound::Open),
            (2, MatchClock::new(45, 0), ClockBound::At(MatchClock::new(62, 10))),
            (2, MatchClock::new(62, 10), ClockBound::Open),
        ]
    );
}

#[test]
fn substitute_appears_from_their_start_and_replaced_player_leaves() {
    let (lineups, events) = fixture();
    let reconstruction = reconstruct(&lineups, &events);

    let ids = |idx: usize| -> Vec<u64> {
        reconstruction
            .players_in(&reconstruction.windows[idx].key)
            .map(|p| p.player_id)
            .collect()
    };
    assert_eq!(ids(0), (1..=11).collect::<Vec<_>>());
    // Player 11's stint spans the break, so it covers the second-half opener.
    assert_eq!(ids(1), (1..=11).collect::<Vec<_>>());
    assert_eq!(ids(2), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12]);
    assert!(reconstruction.players.iter().all(|p| p.player_id != 13));
}

#[test]
fn formations_track_the_substitution() {
    let (lineups, events) = fixture();
    let reconstruction = reconstruct(&lineups, &events);
    let taxonomy = PositionTaxonomy::from_names(distinct_position_names(&lineups));
    let formations = aggregate(&reconstruction.windows, &reconstruction.players, &taxonomy);

    let labels: Vec<&str> = formations.iter().map(|f| f.formation.as_str()).collect();
    assert_eq!(labels, vec!["4-4-2", "4-4-2", "4-5-1"]);
    assert!(formations.iter().all(|f| f.players_on_pitch == 11));
    assert!(formations.iter().all(|f| f.gk == Some(1)));

    let combos = lineup_combinations(MATCH, &reconstruction, &taxonomy);
    assert_eq!(combos.len(), 3);
    assert!(combos.iter().all(|c| c.players_on_pitch() == 11));
    assert!(combos[2].slots.contains(&12));
    assert!(lineup_combinations(MATCH + 1, &reconstruction, &taxonomy).is_empty());
}

#[test]
fn open_stints_extend_to_the_last_played_period() {
    let (mut lineups, mut events) = fixture();
    // Extra time: period 3 starts at 90:00 and nobody's stint names an end period.
    events.push(half_start(3, 90));
    events.push(EventRecord {
        match_id: MATCH,
        period: Some(3),
        event_type: Some("Pass".to_string()),
        ..EventRecord::default()
    });
    lineups.retain(|r| r.player_id != 13);
    let reconstruction = reconstruct(&lineups, &events);
    let extra_time = reconstruction
        .windows
        .iter()
        .find(|w| w.key.period == 3)
        .map(|w| w.key);
    let Some(key) = extra_time else {
        panic!("no extra-time window");
    };
    assert_eq!(reconstruction.players_in(&key).count(), 11);
}

#[test]
fn overlapping_stints_are_reported_and_assigned_once() {
    let (mut lineups, events) = fixture();
    // Player 7 listed twice for the same spell.
    lineups.push(row(7, "Center Midfield", ("30:00", 1), None));
    let reconstruction = reconstruct(&lineups, &events);

    assert!(reconstruction.issues.iter().any(|issue| matches!(
        issue,
        LineupIssue::OverlappingStints { player_id: 7, .. }
    )));
    // Both stints cover the window that opens at 30:00.
    let second = reconstruction.windows[1].key;
    assert_eq!((second.period, second.start), (1, MatchClock::new(30, 0)));
    assert_eq!(reconstruction.players_in(&second).count(), 11);
    assert_eq!(
        reconstruction
            .players_in(&second)
            .filter(|p| p.player_id == 7)
            .count(),
        1
    );
}
