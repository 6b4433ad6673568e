use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::columnar::{Table, write_table};
use crate::formations::{TeamFormation, formation_frequency};
use crate::period_lineups::WindowPlayer;
use crate::position_type::PositionType;
use crate::possession::PossessionSummary;

pub const POSITION_TYPE_FILE: &str = "position_type.parquet";
pub const PERIOD_LINEUPS_FILE: &str = "period_lineups.parquet";
pub const TEAM_FORMATIONS_FILE: &str = "match_team_formations.parquet";

pub struct ExportReport {
    pub formations: usize,
    pub formation_labels: usize,
    pub possessions: usize,
}

/// Narrowest outfield pivot written; overstaffed windows widen it.
const MIN_SLOTS: usize = 11;

/// Number of `position_n` columns needed to hold every window's outfield ids.
pub fn outfield_slots(formations: &[TeamFormation]) -> usize {
    formations
        .iter()
        .map(|f| f.outfield.len())
        .max()
        .unwrap_or(0)
        .max(MIN_SLOTS)
}

pub fn export_workbook(
    path: &Path,
    formations: &[TeamFormation],
    possession: &[PossessionSummary],
) -> Result<ExportReport> {
    let slots = outfield_slots(formations);
    let mut formation_rows = vec![formation_header(slots)];
    formation_rows.extend(formations.iter().map(|f| formation_row(f, slots)));

    let frequency = formation_frequency(formations);
    let mut count_rows = vec![vec!["Formation".to_string(), "Windows".to_string()]];
    count_rows.extend(
        frequency
            .iter()
            .map(|(label, n)| vec![label.clone(), n.to_string()]),
    );

    let mut possession_rows = vec![possession_header()];
    possession_rows.extend(possession.iter().map(possession_row));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Formations")?;
        write_rows(sheet, &formation_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("FormationCounts")?;
        write_rows(sheet, &count_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Possessions")?;
        write_rows(sheet, &possession_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        formations: formations.len(),
        formation_labels: frequency.len(),
        possessions: possession.len(),
    })
}

pub fn position_type_table(types: &[PositionType]) -> Table {
    Table::new("position_type")
        .int64("pk", types.iter().map(|t| Some(t.pk as i64)).collect())
        .utf8(
            "position_name",
            types.iter().map(|t| Some(t.position_name.clone())).collect(),
        )
        .utf8(
            "position_side",
            types.iter().map(|t| t.side.map(|s| s.code().to_string())).collect(),
        )
        .utf8(
            "position_type_detailed",
            types.iter().map(|t| t.detail.map(|d| d.code().to_string())).collect(),
        )
        .utf8(
            "position_type",
            types.iter().map(|t| t.code.map(|c| c.code().to_string())).collect(),
        )
        .utf8(
            "position_behavior",
            types.iter().map(|t| t.behavior.map(|b| b.code().to_string())).collect(),
        )
}

pub fn period_lineups_table(players: &[WindowPlayer]) -> Table {
    Table::new("period_lineups")
        .int64("match_id", players.iter().map(|p| Some(p.key.match_id as i64)).collect())
        .int64("team_id", players.iter().map(|p| Some(p.key.team_id as i64)).collect())
        .int64("period", players.iter().map(|p| Some(p.key.period as i64)).collect())
        .utf8("start_time", players.iter().map(|p| Some(p.key.start.to_string())).collect())
        .utf8("end_time", players.iter().map(|p| p.end.clock().map(|c| c.to_string())).collect())
        .int64("player_id", players.iter().map(|p| Some(p.player_id as i64)).collect())
        .utf8("player_name", players.iter().map(|p| p.player_name.clone()).collect())
        .int64("country_id", players.iter().map(|p| p.country_id.map(|c| c as i64)).collect())
        .utf8("country_name", players.iter().map(|p| p.country_name.clone()).collect())
        .utf8("position_name", players.iter().map(|p| p.position_name.clone()).collect())
}

pub fn team_formations_table(formations: &[TeamFormation]) -> Table {
    let count = |f: fn(&TeamFormation) -> u32| -> Vec<Option<i64>> {
        formations.iter().map(|x| Some(f(x) as i64)).collect()
    };
    let mut table = Table::new("match_team_formations")
        .int64("match_id", formations.iter().map(|f| Some(f.key.match_id as i64)).collect())
        .int64("team_id", formations.iter().map(|f| Some(f.key.team_id as i64)).collect())
        .int64("period", formations.iter().map(|f| Some(f.key.period as i64)).collect())
        .utf8("start_time", formations.iter().map(|f| Some(f.key.start.to_string())).collect())
        .utf8("end_time", formations.iter().map(|f| f.end.clock().map(|c| c.to_string())).collect())
        .int64("gk", formations.iter().map(|f| f.gk.map(|id| id as i64)).collect())
        .int64("b_count", count(|f| f.counts.backs))
        .int64("m_count", count(|f| f.counts.midfielders))
        .int64("am_count", count(|f| f.counts.attacking_midfielders))
        .int64("dm_count", count(|f| f.counts.defending_midfielders))
        .int64("f_count", count(|f| f.counts.forwards))
        .int64("cf_count", count(|f| f.counts.center_forwards))
        .utf8("defense", formations.iter().map(|f| f.defense.clone()).collect())
        .utf8("midfield", formations.iter().map(|f| f.midfield.clone()).collect())
        .utf8("attack", formations.iter().map(|f| f.attack.clone()).collect())
        .utf8("formation", formations.iter().map(|f| Some(f.formation.clone())).collect())
        .int64("players_on_pitch", count(|f| f.players_on_pitch));
    for slot in 0..outfield_slots(formations) {
        table = table.int64(
            &format!("position_{}", slot + 1),
            formations
                .iter()
                .map(|f| f.outfield.get(slot).map(|id| *id as i64))
                .collect(),
        );
    }
    table
}

/// Writes the three derived parquet tables into `dir`, returning each path with its row count.
pub fn write_derived_tables(
    dir: &Path,
    types: &[PositionType],
    players: &[WindowPlayer],
    formations: &[TeamFormation],
) -> Result<Vec<(PathBuf, usize)>> {
    crate::config::ensure_dir(dir)?;
    let tables = [
        (POSITION_TYPE_FILE, position_type_table(types)),
        (PERIOD_LINEUPS_FILE, period_lineups_table(players)),
        (TEAM_FORMATIONS_FILE, team_formations_table(formations)),
    ];
    let mut written = Vec::with_capacity(tables.len());
    for (file, table) in tables {
        let path = dir.join(file);
        write_table(&path, &table)?;
        written.push((path, table.num_rows()));
    }
    Ok(written)
}

fn formation_header(slots: usize) -> Vec<String> {
    let mut header: Vec<String> = [
        "Match ID",
        "Team ID",
        "Period",
        "Start",
        "End",
        "GK",
        "Backs",
        "Midfielders",
        "Attacking Mids",
        "Defending Mids",
        "Forwards",
        "Center Forwards",
        "Defense",
        "Midfield",
        "Attack",
        "Formation",
        "Players",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend((1..=slots).map(|n| format!("position_{n}")));
    header
}

fn formation_row(f: &TeamFormation, slots: usize) -> Vec<String> {
    let mut row = vec![
        f.key.match_id.to_string(),
        f.key.team_id.to_string(),
        f.key.period.to_string(),
        f.key.start.to_string(),
        f.end.to_string(),
        opt_to_string(f.gk),
        f.counts.backs.to_string(),
        f.counts.midfielders.to_string(),
        f.counts.attacking_midfielders.to_string(),
        f.counts.defending_midfielders.to_string(),
        f.counts.forwards.to_string(),
        f.counts.center_forwards.to_string(),
        f.defense.clone().unwrap_or_default(),
        f.midfield.clone().unwrap_or_default(),
        f.attack.clone().unwrap_or_default(),
        f.formation.clone(),
        f.players_on_pitch.to_string(),
    ];
    row.extend((0..slots).map(|idx| opt_to_string(f.outfield.get(idx))));
    row
}

fn possession_header() -> Vec<String> {
    [
        "Match ID",
        "Period",
        "Possession",
        "Possession Team",
        "Play Pattern",
        "Duration (s)",
        "Carries",
        "Passes",
        "Pressures",
        "Shots",
        "Dribbles",
        "Dribble Pasts",
        "Dispossessions",
        "Miscontrols",
        "Interceptions",
        "Total Distance",
        "Possessing Players",
        "Pass Distance",
        "Pass Attempts",
        "High",
        "Ground",
        "Low",
        "Drop Kick",
        "Head",
        "Keeper Arm",
        "Left Foot",
        "Right Foot",
        "Other",
        "Inswinging",
        "Straight",
        "Through Ball",
        "Relative Distance",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn possession_row(p: &PossessionSummary) -> Vec<String> {
    vec![
        p.match_id.to_string(),
        opt_to_string(p.period),
        opt_to_string(p.possession),
        opt_to_string(p.possession_team_id),
        p.play_pattern.clone().unwrap_or_default(),
        format!("{:.3}", p.total_duration),
        p.carries.to_string(),
        p.passes.to_string(),
        p.pressures.to_string(),
        p.shots.to_string(),
        p.dribbles.to_string(),
        p.dribble_pasts.to_string(),
        p.dispossessions.to_string(),
        p.miscontrols.to_string(),
        p.interceptions.to_string(),
        opt_to_string(p.total_distance.map(|d| format!("{d:.2}"))),
        p.possessing_players.to_string(),
        format!("{:.2}", p.pass.distance),
        p.pass.attempts.to_string(),
        p.pass.high.to_string(),
        p.pass.ground.to_string(),
        p.pass.low.to_string(),
        p.pass.drop_kick.to_string(),
        p.pass.head.to_string(),
        p.pass.keeper_arm.to_string(),
        p.pass.left_foot.to_string(),
        p.pass.right_foot.to_string(),
        p.pass.other_body_part.to_string(),
        p.pass.inswinging.to_string(),
        p.pass.straight.to_string(),
        p.pass.through_ball.to_string(),
        opt_to_string(p.relative_distance().map(|d| format!("{d:.2}"))),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{formation_header, formation_row, outfield_slots, team_formations_table};
    use crate::clock::{ClockBound, MatchClock};
    use crate::columnar::ColumnValues;
    use crate::formations::{RoleCounts, TeamFormation};
    use crate::period_lineups::WindowKey;

    fn window(outfield: Vec<u64>) -> TeamFormation {
        TeamFormation {
            key: WindowKey {
                match_id: 1,
                team_id: 10,
                period: 1,
                start: MatchClock::new(0, 0),
            },
            end: ClockBound::Open,
            gk: Some(1),
            counts: RoleCounts::default(),
            players_on_pitch: outfield.len() as u32 + 1,
            outfield,
            defense: None,
            midfield: None,
            attack: None,
            formation: "4-4-2".to_string(),
        }
    }

    #[test]
    fn pivot_keeps_eleven_columns_for_normal_windows() {
        let formations = [window((2..=11).collect())];
        assert_eq!(outfield_slots(&formations), 11);
        assert_eq!(outfield_slots(&[]), 11);
        let table = team_formations_table(&formations);
        let last = table.columns.last().map(|c| c.name.as_str());
        assert_eq!(last, Some("position_11"));
    }

    #[test]
    fn overstaffed_windows_widen_the_pivot() {
        let formations = [window((2..=11).collect()), window((2..=14).collect())];
        assert_eq!(outfield_slots(&formations), 13);

        let table = team_formations_table(&formations);
        let column = table.columns.iter().find(|c| c.name == "position_13");
        assert_eq!(
            column.map(|c| &c.values),
            Some(&ColumnValues::Int64(vec![None, Some(14)]))
        );

        let header = formation_header(13);
        let row = formation_row(&formations[1], 13);
        assert_eq!(header.len(), row.len());
        assert_eq!(row.last().map(String::as_str), Some("14"));
    }
}
