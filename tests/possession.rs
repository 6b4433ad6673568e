use std::collections::BTreeSet;

use pitch_lab::possession::{possession_audit, summarize};
use pitch_lab::statsbomb::EventRecord;

const MATCH: u64 = 7_298;

fn event(index: i64, kind: &str, team: u64, possession: i64, possession_team: u64) -> EventRecord {
    EventRecord {
        index_num: index,
        match_id: MATCH,
        team_id: Some(team),
        period: Some(1),
        event_type: Some(kind.to_string()),
        possession: Some(possession),
        possession_team_id: Some(possession_team),
        play_pattern: Some("Regular Play".to_string()),
        ..EventRecord::default()
    }
}

fn at(mut e: EventRecord, x: f64, y: f64, player: u64) -> EventRecord {
    e.location_x = Some(x);
    e.location_y = Some(y);
    e.player_id = Some(player);
    e
}

fn sample() -> Vec<EventRecord> {
    let mut pass = at(event(1, "Pass", 7, 1, 7), 0.0, 0.0, 11);
    pass.duration = Some(0.5);
    pass.pass_length = Some(10.0);
    pass.pass_height = Some("Ground Pass".to_string());
    pass.pass_body_part = Some("Right Foot".to_string());

    let receipt = at(event(2, "Ball Receipt*", 7, 1, 7), 2.0, 2.0, 12);
    let mut carry = at(event(3, "Carry", 7, 1, 7), 3.0, 4.0, 12);
    carry.duration = Some(1.5);
    let shot = at(event(4, "Shot", 7, 1, 7), 6.0, 8.0, 12);

    let reply = at(event(5, "Pass", 8, 2, 8), 36.0, 48.0, 21);
    let pressure = at(event(6, "Pressure", 7, 2, 8), 40.0, 40.0, 12);
    let duel = at(event(7, "Duel", 8, 1, 7), 5.0, 5.0, 21);
    let half_start = event(0, "Half Start", 8, 1, 7);

    vec![shot, reply, pass, duel, carry, pressure, receipt, half_start]
}

#[test]
fn possessions_group_on_ball_events() {
    let events = sample();
    let summaries = summarize(&events, MATCH);
    let possessions: Vec<Option<i64>> = summaries.iter().map(|s| s.possession).collect();
    // The duel belongs to team 8 inside team 7's possession, so it is not on-ball play.
    assert_eq!(possessions, vec![Some(1), Some(2)]);

    let first = &summaries[0];
    assert_eq!((first.min_index, first.max_index), (1, 4));
    assert_eq!((first.passes, first.carries, first.shots), (1, 1, 1));
    assert_eq!(first.total_duration, 2.0);
    assert_eq!(first.possessing_players, 2);
    assert_eq!(first.start, Some((0.0, 0.0)));
    assert_eq!(first.end, Some((6.0, 8.0)));
    assert_eq!(first.relative_distance(), Some(10.0));
    assert_eq!(first.pass.attempts, 1);
    assert_eq!(first.pass.distance, 10.0);
    assert_eq!(first.pass.ground, 1);
    assert_eq!(first.pass.right_foot, 1);
}

#[test]
fn distances_step_to_the_next_kept_event() {
    let events = sample();
    let summaries = summarize(&events, MATCH);
    // 0,0 -> 3,4 -> 6,8 -> 36,48: the last step crosses into the next possession.
    assert_eq!(summaries[0].total_distance, Some(60.0));
    assert_eq!(summaries[1].total_distance, None);
    assert_eq!(summaries[1].possessing_players, 1);
}

#[test]
fn other_matches_are_ignored() {
    let mut events = sample();
    for e in &mut events {
        e.match_id = MATCH + 1;
    }
    assert!(summarize(&events, MATCH).is_empty());
    assert!(possession_audit(&events, MATCH).is_clean());
}

#[test]
fn audit_flags_foreign_events_and_players_on_both_sides() {
    let events = sample();
    let audit = possession_audit(&events, MATCH);
    assert!(!audit.is_clean());

    let foreign: Vec<i64> = audit.foreign_events.iter().map(|e| e.index_num).collect();
    // Pressure is expected from the defending side; the half marker is never audited.
    assert_eq!(foreign, vec![7]);

    let multi: Vec<i64> = audit.multi_team_players.iter().map(|e| e.index_num).collect();
    assert_eq!(multi, vec![7]);
    assert_eq!(audit.flagged_players(), BTreeSet::from([21]));
}
