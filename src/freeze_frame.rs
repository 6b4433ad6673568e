use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::possession::euclidean;
use crate::statsbomb::{EventRecord, FreezeFrameRecord, MatchRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FrameCategory {
    Ball,
    KeeperSameTeam,
    KeeperOpposingTeam,
    ClosestSameTeam,
    ClosestOpposingTeam,
    SameTeam,
    OpposingTeam,
}

impl FrameCategory {
    pub fn label(self) -> &'static str {
        match self {
            FrameCategory::Ball => "Ball",
            FrameCategory::KeeperSameTeam => "Keeper - Same Team",
            FrameCategory::KeeperOpposingTeam => "Keeper - Opposing Team",
            FrameCategory::ClosestSameTeam => "Closest 3 - Same Team",
            FrameCategory::ClosestOpposingTeam => "Closest 3 - Opposing Team",
            FrameCategory::SameTeam => "Same Team",
            FrameCategory::OpposingTeam => "Opposing Team",
        }
    }

    pub fn classify(actor: bool, keeper: bool, teammate: bool, rank: u32) -> Self {
        match (actor, keeper, teammate) {
            (true, _, _) => FrameCategory::Ball,
            (false, true, true) => FrameCategory::KeeperSameTeam,
            (false, true, false) => FrameCategory::KeeperOpposingTeam,
            (false, false, true) if rank <= 3 => FrameCategory::ClosestSameTeam,
            (false, false, false) if rank <= 3 => FrameCategory::ClosestOpposingTeam,
            (false, false, true) => FrameCategory::SameTeam,
            (false, false, false) => FrameCategory::OpposingTeam,
        }
    }
}

impl fmt::Display for FrameCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreezeFrameEntry {
    pub teammate: bool,
    pub actor: bool,
    pub keeper: bool,
    pub location: Option<(f64, f64)>,
    pub distance: Option<f64>,
    pub rank: u32,
    pub category: FrameCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFrame {
    pub event_id: String,
    pub match_id: u64,
    pub index_num: i64,
    pub period: Option<u8>,
    pub location: (f64, f64),
    pub entries: Vec<FreezeFrameEntry>,
}

/// Ranks frame players by distance to the event within their (actor, keeper, teammate) group.
/// Ties share a rank and the next rank skips; unknown distances rank last.
pub fn rank_entries(
    frames: &[&FreezeFrameRecord],
    event_location: (f64, f64),
) -> Vec<FreezeFrameEntry> {
    let mut groups: BTreeMap<(bool, bool, bool), Vec<(usize, Option<f64>)>> = BTreeMap::new();
    for (idx, frame) in frames.iter().enumerate() {
        let distance = frame_location(frame).map(|loc| euclidean(loc, event_location));
        groups
            .entry((frame.actor, frame.keeper, frame.teammate))
            .or_default()
            .push((idx, distance));
    }

    let mut ranks = vec![0u32; frames.len()];
    for members in groups.values_mut() {
        members.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        let mut rank = 1;
        for pos in 0..members.len() {
            if pos > 0 && members[pos].1 != members[pos - 1].1 {
                rank = pos as u32 + 1;
            }
            ranks[members[pos].0] = rank;
        }
    }

    frames
        .iter()
        .zip(ranks)
        .map(|(frame, rank)| {
            let location = frame_location(frame);
            FreezeFrameEntry {
                teammate: frame.teammate,
                actor: frame.actor,
                keeper: frame.keeper,
                location,
                distance: location.map(|loc| euclidean(loc, event_location)),
                rank,
                category: FrameCategory::classify(frame.actor, frame.keeper, frame.teammate, rank),
            }
        })
        .collect()
}

fn frame_location(frame: &FreezeFrameRecord) -> Option<(f64, f64)> {
    Some((frame.location_x?, frame.location_y?))
}

/// The freeze frame around one event of a match, looked up by event index.
pub fn event_frame(
    events: &[EventRecord],
    frames: &[FreezeFrameRecord],
    match_id: u64,
    index_num: i64,
) -> Option<EventFrame> {
    let event = events
        .iter()
        .find(|e| e.match_id == match_id && e.index_num == index_num)?;
    let location = event.location()?;
    let event_id = event.id.clone()?;
    let players: Vec<&FreezeFrameRecord> = frames
        .iter()
        .filter(|f| f.match_id == match_id && f.event_uuid == event_id)
        .collect();
    Some(EventFrame {
        entries: rank_entries(&players, location),
        event_id,
        match_id,
        index_num,
        period: event.period,
        location,
    })
}

/// Frames of the season's matches that have 360 data available.
pub fn frames_for_season<'a>(
    matches: &[MatchRecord],
    frames: &'a [FreezeFrameRecord],
    season: &str,
) -> Vec<&'a FreezeFrameRecord> {
    let ids: HashSet<u64> = matches
        .iter()
        .filter(|m| m.season_name.as_deref() == Some(season) && m.has_360())
        .map(|m| m.match_id)
        .collect();
    frames.iter().filter(|f| ids.contains(&f.match_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::{FrameCategory, frames_for_season, rank_entries};
    use crate::statsbomb::{FreezeFrameRecord, MatchRecord};

    fn player(teammate: bool, x: f64) -> FreezeFrameRecord {
        FreezeFrameRecord {
            teammate,
            location_x: Some(x),
            location_y: Some(0.0),
            ..FreezeFrameRecord::default()
        }
    }

    #[test]
    fn ties_share_rank_and_skip() {
        let frames = [player(true, 1.0), player(true, 2.0), player(true, 1.0), player(true, 5.0)];
        let refs: Vec<&FreezeFrameRecord> = frames.iter().collect();
        let ranks: Vec<u32> = rank_entries(&refs, (0.0, 0.0)).iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 3, 1, 4]);
    }

    #[test]
    fn categories_follow_role_then_rank() {
        assert_eq!(FrameCategory::classify(true, true, true, 9), FrameCategory::Ball);
        assert_eq!(
            FrameCategory::classify(false, true, false, 1),
            FrameCategory::KeeperOpposingTeam
        );
        assert_eq!(
            FrameCategory::classify(false, false, true, 3).label(),
            "Closest 3 - Same Team"
        );
        assert_eq!(FrameCategory::classify(false, false, false, 4).label(), "Opposing Team");
    }

    #[test]
    fn season_frames_need_360_coverage() {
        let game = |match_id, season: &str, status: Option<&str>| MatchRecord {
            match_id,
            season_name: Some(season.to_string()),
            match_status_360: status.map(str::to_string),
            ..MatchRecord::default()
        };
        let matches = [
            game(1, "2022", Some("available")),
            game(2, "2022", Some("scheduled")),
            game(3, "2018", Some("available")),
        ];
        let frames: Vec<FreezeFrameRecord> = [1, 2, 3, 1]
            .into_iter()
            .map(|match_id| FreezeFrameRecord {
                match_id,
                ..player(false, 0.0)
            })
            .collect();
        let kept: Vec<u64> = frames_for_season(&matches, &frames, "2022")
            .iter()
            .map(|f| f.match_id)
            .collect();
        assert_eq!(kept, vec![1, 1]);
    }
}
