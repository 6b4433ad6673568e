use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pitch_lab::dashboard::{DashboardState, xg_histogram};
use pitch_lab::formations::aggregate;
use pitch_lab::period_lineups::reconstruct;
use pitch_lab::position_type::PositionTaxonomy;
use pitch_lab::possession::summarize;
use pitch_lab::statsbomb::{EventRecord, LineupRecord, MatchRecord, distinct_position_names};
use pitch_lab::store::{DashboardTables, EventTypeCount, ShotXg};

const MATCHES: u64 = 64;
const SHAPE: [&str; 11] = [
    "Goalkeeper",
    "Left Back",
    "Left Center Back",
    "Right Center Back",
    "Right Back",
    "Left Defensive Midfield",
    "Right Defensive Midfield",
    "Left Attacking Midfield",
    "Center Attacking Midfield",
    "Right Attacking Midfield",
    "Center Forward",
];

/// Two teams per match, each making three substitutions in the second half.
fn sample_lineups() -> Vec<LineupRecord> {
    let mut out = Vec::new();
    for match_id in 1..=MATCHES {
        for team_id in [1, 2] {
            for (slot, position) in SHAPE.iter().enumerate() {
                let player_id = team_id * 100 + slot as u64;
                let subbed = (7..10).contains(&slot);
                let off = format!("{}:00", 60 + slot * 5);
                out.push(LineupRecord {
                    match_id,
                    team_id,
                    player_id,
                    player_name: Some(format!("Player {player_id}")),
                    position_name: Some(position.to_string()),
                    from_time: Some("00:00".to_string()),
                    from_period: Some(1),
                    to_time: subbed.then(|| off.clone()),
                    to_period: subbed.then_some(2),
                    ..LineupRecord::default()
                });
                if subbed {
                    out.push(LineupRecord {
                        match_id,
                        team_id,
                        player_id: player_id + 50,
                        player_name: Some(format!("Player {}", player_id + 50)),
                        position_name: Some("Center Midfield".to_string()),
                        from_time: Some(off),
                        from_period: Some(2),
                        ..LineupRecord::default()
                    });
                }
            }
        }
    }
    out
}

fn sample_events() -> Vec<EventRecord> {
    let mut out = Vec::new();
    for match_id in 1..=MATCHES {
        for (period, minute) in [(1u8, 0u32), (2, 45)] {
            out.push(EventRecord {
                match_id,
                period: Some(period),
                minute: Some(minute),
                second: Some(0),
                event_type: Some("Half Start".to_string()),
                ..EventRecord::default()
            });
        }
        for index in 0..1_500i64 {
            let team = 1 + (index / 25 % 2) as u64;
            let kind = match index % 4 {
                0 => "Pass",
                1 => "Ball Receipt*",
                2 => "Carry",
                _ => "Pressure",
            };
            out.push(EventRecord {
                index_num: index,
                match_id,
                team_id: Some(team),
                period: Some(if index < 750 { 1 } else { 2 }),
                event_type: Some(kind.to_string()),
                possession: Some(index / 25),
                possession_team_id: Some(team),
                player_id: Some(team * 100 + (index % 11) as u64),
                location_x: Some((index % 120) as f64),
                location_y: Some((index % 80) as f64),
                duration: Some(0.8),
                pass_length: (kind == "Pass").then_some(14.0),
                ..EventRecord::default()
            });
        }
    }
    out
}

fn bench_reconstruct(c: &mut Criterion) {
    let lineups = sample_lineups();
    let events = sample_events();
    c.bench_function("reconstruct_windows", |b| {
        b.iter(|| {
            let reconstruction = reconstruct(black_box(&lineups), black_box(&events));
            black_box(reconstruction.windows.len());
        })
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let lineups = sample_lineups();
    let events = sample_events();
    let reconstruction = reconstruct(&lineups, &events);
    let taxonomy = PositionTaxonomy::from_names(distinct_position_names(&lineups));
    c.bench_function("aggregate_formations", |b| {
        b.iter(|| {
            let formations = aggregate(
                black_box(&reconstruction.windows),
                black_box(&reconstruction.players),
                &taxonomy,
            );
            black_box(formations.len());
        })
    });
}

fn bench_possession_summary(c: &mut Criterion) {
    let events = sample_events();
    c.bench_function("possession_summary", |b| {
        b.iter(|| {
            let summaries = summarize(black_box(&events), 1);
            black_box(summaries.len());
        })
    });
}

fn bench_dashboard_kpis(c: &mut Criterion) {
    let tables = DashboardTables {
        matches: (1..=2_000)
            .map(|id| MatchRecord {
                match_id: id,
                competition_name: Some(format!("Competition {}", id % 12)),
                season_name: Some(format!("{}", 2000 + id % 20)),
                home_team: Some(format!("Team {}", id % 48)),
                away_team: Some(format!("Team {}", (id + 7) % 48)),
                home_score: Some((id % 4) as i64),
                away_score: Some((id % 3) as i64),
                ..MatchRecord::default()
            })
            .collect(),
        event_counts: (1..=2_000)
            .flat_map(|id| {
                ["Pass", "Carry", "Shot"].map(|kind| EventTypeCount {
                    match_id: id,
                    event_type: kind.to_string(),
                    count: 300,
                })
            })
            .collect(),
        shots: (1..=20_000)
            .map(|n| ShotXg {
                match_id: n % 2_000 + 1,
                team_id: Some(1),
                xg: (n % 100) as f64 / 100.0,
            })
            .collect(),
        ..DashboardTables::default()
    };
    let state = DashboardState::new(tables);
    c.bench_function("dashboard_kpis", |b| {
        b.iter(|| {
            let kpis = state.kpis();
            black_box(kpis.total_events);
            black_box(state.event_type_distribution().len());
        })
    });
    let values: Vec<f64> = (0..50_000).map(|n| (n % 1_000) as f64 / 1_000.0).collect();
    c.bench_function("xg_histogram", |b| {
        b.iter(|| black_box(xg_histogram(black_box(&values).iter().copied(), 30)))
    });
}

criterion_group!(
    perf,
    bench_reconstruct,
    bench_aggregate,
    bench_possession_summary,
    bench_dashboard_kpis
);
criterion_main!(perf);
