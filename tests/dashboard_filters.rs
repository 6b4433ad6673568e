use pitch_lab::dashboard::{DashboardState, Filters, Screen};
use pitch_lab::statsbomb::MatchRecord;
use pitch_lab::store::{DashboardTables, EventTypeCount, FormationRow, MatchPlayer, ShotXg};

fn game(
    match_id: u64,
    competition: &str,
    season: &str,
    home: &str,
    away: &str,
    score: Option<(i64, i64)>,
) -> MatchRecord {
    MatchRecord {
        match_id,
        competition_name: Some(competition.to_string()),
        season_name: Some(season.to_string()),
        home_team: Some(home.to_string()),
        away_team: Some(away.to_string()),
        home_score: score.map(|s| s.0),
        away_score: score.map(|s| s.1),
        ..MatchRecord::default()
    }
}

fn counts(match_id: u64, kind: &str, count: u64) -> EventTypeCount {
    EventTypeCount {
        match_id,
        event_type: kind.to_string(),
        count,
    }
}

fn player(match_id: u64, name: &str) -> MatchPlayer {
    MatchPlayer {
        match_id,
        player_name: name.to_string(),
    }
}

fn formation(match_id: u64, team: &str, label: &str) -> FormationRow {
    FormationRow {
        match_id,
        team_id: 1,
        team_name: Some(team.to_string()),
        period: 1,
        start: "00:00".to_string(),
        end: "--:--".to_string(),
        gk: Some(1),
        outfield: Vec::new(),
        formation: label.to_string(),
        players_on_pitch: 11,
    }
}

fn tables() -> DashboardTables {
    DashboardTables {
        matches: vec![
            game(1, "FIFA World Cup", "2022", "Argentina", "France", Some((3, 3))),
            game(2, "FIFA World Cup", "2022", "Spain", "Morocco", Some((0, 0))),
            game(3, "UEFA Euro", "2024", "Spain", "England", Some((3, 1))),
            game(4, "UEFA Euro", "2020", "Italy", "England", Some((1, 2))),
        ],
        event_counts: vec![
            counts(1, "Pass", 900),
            counts(1, "Shot", 30),
            counts(2, "Pass", 1000),
            counts(3, "Pass", 800),
            counts(3, "Carry", 700),
            counts(4, "Pass", 750),
        ],
        shots: vec![
            ShotXg { match_id: 1, team_id: Some(1), xg: 0.76 },
            ShotXg { match_id: 1, team_id: Some(1), xg: 0.05 },
            ShotXg { match_id: 3, team_id: Some(2), xg: 1.0 },
        ],
        players: vec![
            player(1, "Lionel Messi"),
            player(1, "Kylian Mbappé"),
            player(2, "Pedri"),
            player(3, "Pedri"),
            player(3, "Harry Kane"),
            player(4, "Harry Kane"),
            // Listed in the squad but never came on.
            player(4, "Aaron Ramsdale"),
        ],
        formations: vec![
            formation(2, "Spain", "4-3-3"),
            formation(3, "Spain", "4-3-3"),
            formation(3, "Spain", "4-2-3-1"),
            formation(3, "England", "3-4-3"),
        ],
    }
}

#[test]
fn options_are_sorted_and_cycle_through_all() {
    let mut state = DashboardState::new(tables());
    assert_eq!(state.competitions(), ["FIFA World Cup", "UEFA Euro"]);
    assert_eq!(state.seasons(), ["2020", "2022", "2024"]);
    assert_eq!(state.teams().len(), 6);

    state.cycle_competition();
    assert_eq!(state.filters.competition.as_deref(), Some("FIFA World Cup"));
    state.cycle_competition();
    assert_eq!(state.filters.competition.as_deref(), Some("UEFA Euro"));
    state.cycle_competition();
    assert_eq!(state.filters.competition, None);
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] Competition: All"));
}

#[test]
fn kpis_cover_the_filtered_matches() {
    let mut state = DashboardState::new(tables());
    let all = state.kpis();
    assert_eq!(all.total_matches, 4);
    assert_eq!(all.total_events, 4180);
    assert_eq!(all.unique_players, 5);
    assert_eq!(all.avg_goals_label(), "3.25");

    state.filters.competition = Some("UEFA Euro".to_string());
    let euro = state.kpis();
    assert_eq!(euro.total_matches, 2);
    assert_eq!(euro.total_events, 2250);
    assert_eq!(euro.unique_players, 3);
    assert_eq!(euro.avg_goals_label(), "3.50");

    state.filters.season = Some("2022".to_string());
    let none = state.kpis();
    assert_eq!(none.total_matches, 0);
    assert_eq!(none.avg_goals_label(), "0.00");
}

#[test]
fn team_filter_matches_either_side() {
    let mut state = DashboardState::new(tables());
    state.filters.team = Some("Spain".to_string());
    let ids: Vec<u64> = state.filtered_matches().iter().map(|m| m.match_id).collect();
    assert_eq!(ids, vec![2, 3]);

    state.reset_filters();
    assert_eq!(state.filters, Filters::default());
    assert_eq!(state.filtered_matches().len(), 4);
}

#[test]
fn chart_series() {
    let state = DashboardState::new(tables());
    let events = state.event_type_distribution();
    assert_eq!(events[0], ("Pass".to_string(), 3450));
    assert_eq!(events[1], ("Carry".to_string(), 700));
    assert_eq!(events.len(), 3);

    assert_eq!(
        state.results_distribution(),
        vec![("Home Win", 1), ("Away Win", 1), ("Draw", 2)]
    );

    let hist = state.xg_histogram();
    assert_eq!(hist.len(), 30);
    assert_eq!(hist[1], 1);
    assert_eq!(hist[22], 1);
    assert_eq!(hist[29], 1);

    let goals = state.avg_goals_by_competition();
    assert_eq!(goals[0].0, "UEFA Euro");
    assert_eq!(goals[1].0, "FIFA World Cup");
    assert!((goals[0].1 - 3.5).abs() < 1e-9);
    assert!((goals[1].1 - 3.0).abs() < 1e-9);
}

#[test]
fn formation_frequency_follows_team() {
    let mut state = DashboardState::new(tables());
    state.filters.team = Some("Spain".to_string());
    assert_eq!(
        state.formation_frequency(),
        vec![("4-3-3".to_string(), 2), ("4-2-3-1".to_string(), 1)]
    );
    state.filters.team = Some("England".to_string());
    assert_eq!(state.formation_frequency(), vec![("3-4-3".to_string(), 1)]);
}

#[test]
fn restored_filters_drop_unknown_values() {
    let mut state = DashboardState::new(tables());
    state.restore_filters(Filters {
        competition: Some("UEFA Euro".to_string()),
        season: Some("1966".to_string()),
        team: Some("England".to_string()),
    });
    assert_eq!(state.filters.competition.as_deref(), Some("UEFA Euro"));
    assert_eq!(state.filters.season, None);
    assert_eq!(state.filters.team.as_deref(), Some("England"));
}

#[test]
fn screens_toggle_and_logs_are_bounded() {
    let mut state = DashboardState::new(tables());
    assert_eq!(state.screen, Screen::Overview);
    state.cycle_screen();
    assert_eq!(state.screen, Screen::Formations);
    state.cycle_screen();
    assert_eq!(state.screen, Screen::Overview);

    for idx in 0..250 {
        state.push_log(format!("[INFO] {idx}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 50"));
}
