use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clock::ClockBound;
use crate::period_lineups::{LineupReconstruction, LineupWindow, WindowKey, WindowPlayer};
use crate::position_type::{Behavior, PositionCode, PositionTaxonomy, RoleDetail};

/// Role tallies for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub goalkeepers: u32,
    pub backs: u32,
    pub midfielders: u32,
    pub attacking_midfielders: u32,
    pub defending_midfielders: u32,
    pub forwards: u32,
    pub center_forwards: u32,
    pub unclassified: u32,
}

impl RoleCounts {
    pub fn tally<'a>(
        players: impl IntoIterator<Item = &'a WindowPlayer>,
        taxonomy: &PositionTaxonomy,
    ) -> Self {
        let mut counts = Self::default();
        for player in players {
            let kind = player
                .position_name
                .as_deref()
                .and_then(|name| taxonomy.lookup(name));
            let Some(kind) = kind.filter(|k| k.code.is_some()) else {
                counts.unclassified += 1;
                continue;
            };
            match kind.code {
                Some(PositionCode::Goalkeeper) => counts.goalkeepers += 1,
                Some(PositionCode::Back) => counts.backs += 1,
                Some(PositionCode::Midfielder) => {
                    counts.midfielders += 1;
                    match kind.behavior {
                        Some(Behavior::Attacking) => counts.attacking_midfielders += 1,
                        Some(Behavior::Defending) => counts.defending_midfielders += 1,
                        None => {}
                    }
                }
                Some(PositionCode::Forward) => {
                    counts.forwards += 1;
                    if kind.detail == Some(RoleDetail::CenterForward) {
                        counts.center_forwards += 1;
                    }
                }
                None => {}
            }
        }
        counts
    }

    pub fn central_midfielders(&self) -> u32 {
        self.midfielders
            .saturating_sub(self.attacking_midfielders + self.defending_midfielders)
    }

    pub fn defense_label(&self) -> Option<String> {
        (self.backs > 0).then(|| self.backs.to_string())
    }

    pub fn midfield_label(&self) -> Option<String> {
        midfield_label(
            self.midfielders,
            self.attacking_midfielders,
            self.defending_midfielders,
        )
    }

    pub fn attack_label(&self) -> Option<String> {
        attack_label(self.forwards)
    }

    pub fn overall_label(&self) -> String {
        overall_label(
            self.defense_label().as_deref(),
            self.midfield_label().as_deref(),
            self.attack_label().as_deref(),
        )
    }
}

/// Non-zero bands of defending, central and attacking midfielders, deepest first.
pub fn midfield_label(midfielders: u32, attacking: u32, defending: u32) -> Option<String> {
    if midfielders == 0 {
        return None;
    }
    let central = midfielders.saturating_sub(attacking + defending);
    let bands: Vec<String> = [defending, central, attacking]
        .into_iter()
        .filter(|n| *n > 0)
        .map(|n| n.to_string())
        .collect();
    Some(bands.join("-"))
}

pub fn attack_label(forwards: u32) -> Option<String> {
    (forwards > 0).then(|| forwards.to_string())
}

pub fn overall_label(defense: Option<&str>, midfield: Option<&str>, attack: Option<&str>) -> String {
    [defense, midfield, attack]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamFormation {
    pub key: WindowKey,
    pub end: ClockBound,
    /// Lowest player id among the goalkeepers on the pitch.
    pub gk: Option<u64>,
    pub counts: RoleCounts,
    /// Outfield player ids, ascending; flattened as `position_1..position_n`.
    pub outfield: Vec<u64>,
    pub defense: Option<String>,
    pub midfield: Option<String>,
    pub attack: Option<String>,
    pub formation: String,
    pub players_on_pitch: u32,
}

fn is_goalkeeper(player: &WindowPlayer, taxonomy: &PositionTaxonomy) -> bool {
    player
        .position_name
        .as_deref()
        .and_then(|name| taxonomy.lookup(name))
        .is_some_and(|t| t.code == Some(PositionCode::Goalkeeper))
}

fn formation_for(
    window: &LineupWindow,
    players: &[&WindowPlayer],
    taxonomy: &PositionTaxonomy,
) -> TeamFormation {
    let counts = RoleCounts::tally(players.iter().copied(), taxonomy);
    let gk = players
        .iter()
        .filter(|p| is_goalkeeper(p, taxonomy))
        .map(|p| p.player_id)
        .min();
    let outfield: Vec<u64> = players
        .iter()
        .filter(|p| !is_goalkeeper(p, taxonomy))
        .map(|p| p.player_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let distinct: BTreeSet<u64> = players.iter().map(|p| p.player_id).collect();

    TeamFormation {
        key: window.key,
        end: window.end,
        gk,
        counts,
        outfield,
        defense: counts.defense_label(),
        midfield: counts.midfield_label(),
        attack: counts.attack_label(),
        formation: counts.overall_label(),
        players_on_pitch: distinct.len() as u32,
    }
}

fn players_by_window(players: &[WindowPlayer]) -> BTreeMap<WindowKey, Vec<&WindowPlayer>> {
    let mut grouped: BTreeMap<WindowKey, Vec<&WindowPlayer>> = BTreeMap::new();
    for player in players {
        grouped.entry(player.key).or_default().push(player);
    }
    grouped
}

/// One formation row per window that has at least one player.
pub fn aggregate(
    windows: &[LineupWindow],
    players: &[WindowPlayer],
    taxonomy: &PositionTaxonomy,
) -> Vec<TeamFormation> {
    let grouped = players_by_window(players);
    let mut out: Vec<TeamFormation> = windows
        .par_iter()
        .filter_map(|window| {
            let players = grouped.get(&window.key)?;
            Some(formation_for(window, players, taxonomy))
        })
        .collect();
    out.sort_by_key(|f| f.key);
    out
}

/// A single match's full line-up per window, goalkeeper included in the slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupCombination {
    pub key: WindowKey,
    pub end: ClockBound,
    pub slots: Vec<u64>,
    pub counts: RoleCounts,
    pub formation: String,
}

impl LineupCombination {
    pub fn players_on_pitch(&self) -> usize {
        self.slots.len()
    }
}

pub fn lineup_combinations(
    match_id: u64,
    reconstruction: &LineupReconstruction,
    taxonomy: &PositionTaxonomy,
) -> Vec<LineupCombination> {
    let grouped = players_by_window(&reconstruction.players);
    reconstruction
        .windows
        .iter()
        .filter(|w| w.key.match_id == match_id)
        .filter_map(|window| {
            let players = grouped.get(&window.key)?;
            let counts = RoleCounts::tally(players.iter().copied(), taxonomy);
            let slots: Vec<u64> = players
                .iter()
                .map(|p| p.player_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            Some(LineupCombination {
                key: window.key,
                end: window.end,
                slots,
                counts,
                formation: counts.overall_label(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Staffing {
    Short,
    Over,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingIssue {
    pub key: WindowKey,
    pub players_on_pitch: u32,
    pub staffing: Staffing,
}

/// Windows with fewer than `min_players` or more than eleven players.
pub fn staffing_audit(formations: &[TeamFormation], min_players: u32) -> Vec<StaffingIssue> {
    formations
        .iter()
        .filter_map(|f| {
            let staffing = if f.players_on_pitch < min_players {
                Staffing::Short
            } else if f.players_on_pitch > 11 {
                Staffing::Over
            } else {
                return None;
            };
            Some(StaffingIssue {
                key: f.key,
                players_on_pitch: f.players_on_pitch,
                staffing,
            })
        })
        .collect()
}

/// How often each formation label appears, most frequent first.
pub fn formation_frequency<'a>(
    formations: impl IntoIterator<Item = &'a TeamFormation>,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for f in formations {
        *counts.entry(f.formation.as_str()).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, n)| (label.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}
