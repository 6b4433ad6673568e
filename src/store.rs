use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};
use serde::Serialize;

use crate::formations::TeamFormation;
use crate::period_lineups::LineupReconstruction;
use crate::position_type::PositionType;
use crate::statsbomb::{EventRecord, LineupRecord, MatchRecord};

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS position_types (
            position_name TEXT PRIMARY KEY,
            side TEXT NULL,
            detail TEXT NULL,
            code TEXT NULL,
            behavior TEXT NULL,
            pk INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lineup_windows (
            match_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            period INTEGER NOT NULL,
            start_minute INTEGER NOT NULL,
            start_second INTEGER NOT NULL,
            end_minute INTEGER NULL,
            end_second INTEGER NULL,
            PRIMARY KEY (match_id, team_id, period, start_minute, start_second)
        );

        CREATE TABLE IF NOT EXISTS window_players (
            match_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            period INTEGER NOT NULL,
            start_minute INTEGER NOT NULL,
            start_second INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            player_name TEXT NULL,
            country_id INTEGER NULL,
            country_name TEXT NULL,
            position_name TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_window_players_match ON window_players(match_id);

        CREATE TABLE IF NOT EXISTS team_formations (
            match_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            team_name TEXT NULL,
            period INTEGER NOT NULL,
            start_minute INTEGER NOT NULL,
            start_second INTEGER NOT NULL,
            start_clock TEXT NOT NULL,
            end_clock TEXT NOT NULL,
            gk INTEGER NULL,
            backs INTEGER NOT NULL,
            midfielders INTEGER NOT NULL,
            attacking_midfielders INTEGER NOT NULL,
            defending_midfielders INTEGER NOT NULL,
            forwards INTEGER NOT NULL,
            center_forwards INTEGER NOT NULL,
            outfield_json TEXT NOT NULL,
            formation TEXT NOT NULL,
            players_on_pitch INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_team_formations_match ON team_formations(match_id);

        CREATE TABLE IF NOT EXISTS match_players (
            match_id INTEGER NOT NULL,
            player_name TEXT NOT NULL,
            PRIMARY KEY (match_id, player_name)
        );

        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            match_date TEXT NULL,
            competition_name TEXT NULL,
            season_name TEXT NULL,
            home_team TEXT NULL,
            away_team TEXT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL,
            total_goals INTEGER NULL,
            result TEXT NULL,
            match_status_360 TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition_name);

        CREATE TABLE IF NOT EXISTS event_type_counts (
            match_id INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            event_count INTEGER NOT NULL,
            PRIMARY KEY (match_id, event_type)
        );

        CREATE TABLE IF NOT EXISTS shots_xg (
            match_id INTEGER NOT NULL,
            team_id INTEGER NULL,
            xg REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_shots_xg_match ON shots_xg(match_id);

        CREATE TABLE IF NOT EXISTS build_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            matches INTEGER NOT NULL,
            windows INTEGER NOT NULL,
            players INTEGER NOT NULL,
            formations INTEGER NOT NULL,
            issues_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn replace_position_types(conn: &mut Connection, types: &[PositionType]) -> Result<usize> {
    let tx = conn.transaction().context("begin position type transaction")?;
    tx.execute("DELETE FROM position_types", [])
        .context("clear position types")?;
    for t in types {
        tx.execute(
            "INSERT INTO position_types(position_name, side, detail, code, behavior, pk)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                t.position_name,
                t.side.map(|s| s.code()),
                t.detail.map(|d| d.code()),
                t.code.map(|c| c.code()),
                t.behavior.map(|b| b.code()),
                t.pk as i64,
            ],
        )
        .context("insert position type")?;
    }
    tx.commit().context("commit position types")?;
    Ok(types.len())
}

fn clear_matches(tx: &Transaction<'_>, table: &str, match_ids: &BTreeSet<u64>) -> Result<()> {
    let sql = format!("DELETE FROM {table} WHERE match_id = ?1");
    for id in match_ids {
        tx.execute(&sql, params![*id as i64])
            .with_context(|| format!("clear {table} for match {id}"))?;
    }
    Ok(())
}

/// Replaces windows and their players for every match in the reconstruction.
pub fn replace_lineups(conn: &mut Connection, lineups: &LineupReconstruction) -> Result<usize> {
    let match_ids = lineups.match_ids();
    let tx = conn.transaction().context("begin lineup transaction")?;
    clear_matches(&tx, "lineup_windows", &match_ids)?;
    clear_matches(&tx, "window_players", &match_ids)?;

    for w in &lineups.windows {
        let end = w.end.clock();
        tx.execute(
            "INSERT INTO lineup_windows(match_id, team_id, period, start_minute, start_second, end_minute, end_second)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                w.key.match_id as i64,
                w.key.team_id as i64,
                w.key.period as i64,
                w.key.start.minute as i64,
                w.key.start.second as i64,
                end.map(|c| c.minute as i64),
                end.map(|c| c.second as i64),
            ],
        )
        .context("insert lineup window")?;
    }
    for p in &lineups.players {
        tx.execute(
            "INSERT INTO window_players(match_id, team_id, period, start_minute, start_second, player_id, player_name, country_id, country_name, position_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                p.key.match_id as i64,
                p.key.team_id as i64,
                p.key.period as i64,
                p.key.start.minute as i64,
                p.key.start.second as i64,
                p.player_id as i64,
                p.player_name,
                p.country_id.map(|c| c as i64),
                p.country_name,
                p.position_name,
            ],
        )
        .context("insert window player")?;
    }
    tx.commit().context("commit lineups")?;
    Ok(lineups.windows.len())
}

pub fn replace_formations(
    conn: &mut Connection,
    formations: &[TeamFormation],
    team_names: &HashMap<u64, String>,
) -> Result<usize> {
    let match_ids: BTreeSet<u64> = formations.iter().map(|f| f.key.match_id).collect();
    let tx = conn.transaction().context("begin formation transaction")?;
    clear_matches(&tx, "team_formations", &match_ids)?;
    for f in formations {
        let outfield_json = serde_json::to_string(&f.outfield).context("encode outfield ids")?;
        tx.execute(
            r#"
            INSERT INTO team_formations(
                match_id, team_id, team_name, period, start_minute, start_second,
                start_clock, end_clock, gk, backs, midfielders, attacking_midfielders,
                defending_midfielders, forwards, center_forwards, outfield_json, formation,
                players_on_pitch
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                f.key.match_id as i64,
                f.key.team_id as i64,
                team_names.get(&f.key.team_id),
                f.key.period as i64,
                f.key.start.minute as i64,
                f.key.start.second as i64,
                f.key.start.to_string(),
                f.end.to_string(),
                f.gk.map(|g| g as i64),
                f.counts.backs as i64,
                f.counts.midfielders as i64,
                f.counts.attacking_midfielders as i64,
                f.counts.defending_midfielders as i64,
                f.counts.forwards as i64,
                f.counts.center_forwards as i64,
                outfield_json,
                f.formation,
                f.players_on_pitch as i64,
            ],
        )
        .context("insert team formation")?;
    }
    tx.commit().context("commit formations")?;
    Ok(formations.len())
}

/// Every named player listed for a match, whether or not they took the field.
pub fn replace_match_players(conn: &mut Connection, lineups: &[LineupRecord]) -> Result<usize> {
    let match_ids: BTreeSet<u64> = lineups.iter().map(|l| l.match_id).collect();
    let players: BTreeSet<(u64, &str)> = lineups
        .iter()
        .filter_map(|l| Some((l.match_id, l.player_name.as_deref()?)))
        .collect();

    let tx = conn.transaction().context("begin match player transaction")?;
    clear_matches(&tx, "match_players", &match_ids)?;
    for (match_id, name) in &players {
        tx.execute(
            "INSERT INTO match_players(match_id, player_name) VALUES (?1, ?2)",
            params![*match_id as i64, name],
        )
        .context("insert match player")?;
    }
    tx.commit().context("commit match players")?;
    Ok(players.len())
}

/// Match rows plus the per-match event type counts and shot xG values the dashboard reads.
pub fn replace_match_summaries(
    conn: &mut Connection,
    matches: &[MatchRecord],
    events: &[EventRecord],
) -> Result<usize> {
    let match_ids: BTreeSet<u64> = matches.iter().map(|m| m.match_id).collect();
    let mut type_counts: HashMap<(u64, &str), i64> = HashMap::new();
    for event in events.iter().filter(|e| match_ids.contains(&e.match_id)) {
        if let Some(kind) = event.event_type.as_deref() {
            *type_counts.entry((event.match_id, kind)).or_default() += 1;
        }
    }

    let tx = conn.transaction().context("begin match summary transaction")?;
    clear_matches(&tx, "event_type_counts", &match_ids)?;
    clear_matches(&tx, "shots_xg", &match_ids)?;
    for m in matches {
        tx.execute(
            r#"
            INSERT INTO matches (
                match_id, match_date, competition_name, season_name, home_team, away_team,
                home_score, away_score, total_goals, result, match_status_360
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(match_id) DO UPDATE SET
                match_date = excluded.match_date,
                competition_name = excluded.competition_name,
                season_name = excluded.season_name,
                home_team = excluded.home_team,
                away_team = excluded.away_team,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                total_goals = excluded.total_goals,
                result = excluded.result,
                match_status_360 = excluded.match_status_360
            "#,
            params![
                m.match_id as i64,
                m.match_date,
                m.competition_name,
                m.season_name,
                m.home_team,
                m.away_team,
                m.home_score,
                m.away_score,
                m.total_goals(),
                m.result().map(|r| r.label()),
                m.match_status_360,
            ],
        )
        .context("upsert match")?;
    }
    for ((match_id, kind), count) in &type_counts {
        tx.execute(
            "INSERT INTO event_type_counts(match_id, event_type, event_count) VALUES (?1, ?2, ?3)",
            params![*match_id as i64, kind, count],
        )
        .context("insert event type count")?;
    }
    for event in events.iter().filter(|e| match_ids.contains(&e.match_id)) {
        let Some(xg) = event.shot_statsbomb_xg.filter(|_| event.is_type("Shot")) else {
            continue;
        };
        tx.execute(
            "INSERT INTO shots_xg(match_id, team_id, xg) VALUES (?1, ?2, ?3)",
            params![event.match_id as i64, event.team_id.map(|t| t as i64), xg],
        )
        .context("insert shot xg")?;
    }
    tx.commit().context("commit match summaries")?;
    Ok(matches.len())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildRun {
    pub started_at: String,
    pub matches: usize,
    pub windows: usize,
    pub players: usize,
    pub formations: usize,
    pub issues: Vec<String>,
}

pub fn record_build_run(conn: &Connection, run: &BuildRun) -> Result<i64> {
    let issues_json = serde_json::to_string(&run.issues).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO build_runs(started_at, finished_at, matches, windows, players, formations, issues_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            run.started_at,
            Utc::now().to_rfc3339(),
            run.matches as i64,
            run.windows as i64,
            run.players as i64,
            run.formations as i64,
            issues_json,
        ],
    )
    .context("insert build run")?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventTypeCount {
    pub match_id: u64,
    pub event_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotXg {
    pub match_id: u64,
    pub team_id: Option<u64>,
    pub xg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPlayer {
    pub match_id: u64,
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormationRow {
    pub match_id: u64,
    pub team_id: u64,
    pub team_name: Option<String>,
    pub period: u8,
    pub start: String,
    pub end: String,
    pub gk: Option<u64>,
    pub outfield: Vec<u64>,
    pub formation: String,
    pub players_on_pitch: u32,
}

/// Everything the dashboard reads, loaded once at start-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardTables {
    pub matches: Vec<MatchRecord>,
    pub event_counts: Vec<EventTypeCount>,
    pub shots: Vec<ShotXg>,
    pub players: Vec<MatchPlayer>,
    pub formations: Vec<FormationRow>,
}

pub fn load_dashboard_tables(conn: &Connection) -> Result<DashboardTables> {
    Ok(DashboardTables {
        matches: load_matches(conn)?,
        event_counts: load_event_counts(conn)?,
        shots: load_shots(conn)?,
        players: load_players(conn)?,
        formations: query_formations(conn, None)?,
    })
}

pub fn load_formations(conn: &Connection, match_id: u64) -> Result<Vec<FormationRow>> {
    query_formations(conn, Some(match_id))
}

fn load_matches(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT match_id, match_date, competition_name, season_name, home_team, away_team,
                   home_score, away_score, match_status_360
            FROM matches
            ORDER BY match_date ASC, match_id ASC
            "#,
        )
        .context("prepare load matches query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MatchRecord {
                match_id: row.get::<_, i64>(0)? as u64,
                match_date: row.get(1)?,
                competition_name: row.get(2)?,
                season_name: row.get(3)?,
                home_team: row.get(4)?,
                away_team: row.get(5)?,
                home_score: row.get(6)?,
                away_score: row.get(7)?,
                match_status_360: row.get(8)?,
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

fn load_event_counts(conn: &Connection) -> Result<Vec<EventTypeCount>> {
    let mut stmt = conn
        .prepare("SELECT match_id, event_type, event_count FROM event_type_counts ORDER BY match_id, event_type")
        .context("prepare event count query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(EventTypeCount {
                match_id: row.get::<_, i64>(0)? as u64,
                event_type: row.get(1)?,
                count: row.get::<_, i64>(2)?.max(0) as u64,
            })
        })
        .context("query event counts")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode event count row")?);
    }
    Ok(out)
}

fn load_shots(conn: &Connection) -> Result<Vec<ShotXg>> {
    let mut stmt = conn
        .prepare("SELECT match_id, team_id, xg FROM shots_xg")
        .context("prepare shots query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ShotXg {
                match_id: row.get::<_, i64>(0)? as u64,
                team_id: row.get::<_, Option<i64>>(1)?.map(|t| t as u64),
                xg: row.get(2)?,
            })
        })
        .context("query shots")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode shot row")?);
    }
    Ok(out)
}

fn load_players(conn: &Connection) -> Result<Vec<MatchPlayer>> {
    let mut stmt = conn
        .prepare(
            "SELECT match_id, player_name FROM match_players ORDER BY match_id, player_name",
        )
        .context("prepare players query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MatchPlayer {
                match_id: row.get::<_, i64>(0)? as u64,
                player_name: row.get(1)?,
            })
        })
        .context("query players")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player row")?);
    }
    Ok(out)
}

fn query_formations(conn: &Connection, match_id: Option<u64>) -> Result<Vec<FormationRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT match_id, team_id, team_name, period, start_clock, end_clock, gk,
                   outfield_json, formation, players_on_pitch
            FROM team_formations
            WHERE ?1 IS NULL OR match_id = ?1
            ORDER BY match_id, team_id, period, start_minute, start_second
            "#,
        )
        .context("prepare formations query")?;
    let rows = stmt
        .query_map(params![match_id.map(|m| m as i64)], |row| {
            let outfield_json: String = row.get(7)?;
            Ok(FormationRow {
                match_id: row.get::<_, i64>(0)? as u64,
                team_id: row.get::<_, i64>(1)? as u64,
                team_name: row.get(2)?,
                period: row.get::<_, i64>(3)? as u8,
                start: row.get(4)?,
                end: row.get(5)?,
                gk: row.get::<_, Option<i64>>(6)?.map(|g| g as u64),
                outfield: serde_json::from_str(&outfield_json).unwrap_or_default(),
                formation: row.get(8)?,
                players_on_pitch: row.get::<_, i64>(9)?.max(0) as u32,
            })
        })
        .context("query formations")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode formation row")?);
    }
    Ok(out)
}
