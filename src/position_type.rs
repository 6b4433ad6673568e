use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    LeftCenter,
    Center,
    RightCenter,
    Right,
    Goalkeeper,
}

impl Side {
    pub fn code(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::LeftCenter => "LC",
            Side::Center => "C",
            Side::RightCenter => "RC",
            Side::Right => "R",
            Side::Goalkeeper => "GK",
        }
    }
}

/// Fine-grained role read off the position name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleDetail {
    Goalkeeper,
    Back,
    WingBack,
    Midfield,
    Wing,
    Forward,
    CenterForward,
}

impl RoleDetail {
    pub fn code(self) -> &'static str {
        match self {
            RoleDetail::Goalkeeper => "GK",
            RoleDetail::Back => "B",
            RoleDetail::WingBack => "WB",
            RoleDetail::Midfield => "M",
            RoleDetail::Wing => "W",
            RoleDetail::Forward => "F",
            RoleDetail::CenterForward => "CF",
        }
    }

    pub fn position_code(self) -> PositionCode {
        match self {
            RoleDetail::Goalkeeper => PositionCode::Goalkeeper,
            RoleDetail::Back | RoleDetail::WingBack => PositionCode::Back,
            RoleDetail::Midfield => PositionCode::Midfielder,
            RoleDetail::Wing | RoleDetail::Forward | RoleDetail::CenterForward => {
                PositionCode::Forward
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionCode {
    Goalkeeper,
    Back,
    Midfielder,
    Forward,
}

impl PositionCode {
    pub fn code(self) -> &'static str {
        match self {
            PositionCode::Goalkeeper => "GK",
            PositionCode::Back => "B",
            PositionCode::Midfielder => "M",
            PositionCode::Forward => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Attacking,
    Defending,
}

impl Behavior {
    pub fn code(self) -> &'static str {
        match self {
            Behavior::Attacking => "A",
            Behavior::Defending => "D",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionType {
    pub position_name: String,
    pub side: Option<Side>,
    pub detail: Option<RoleDetail>,
    pub code: Option<PositionCode>,
    pub behavior: Option<Behavior>,
    pub pk: u32,
}

// Order matters: the first pattern contained in the upper-cased name wins.
const SIDE_RULES: &[(&str, Side)] = &[
    ("LEFT CENTER", Side::LeftCenter),
    ("RIGHT CENTER", Side::RightCenter),
    ("CENTER", Side::Center),
    ("LEFT", Side::Left),
    ("RIGHT", Side::Right),
    ("GOALKEEPER", Side::Goalkeeper),
    ("SECONDARY", Side::Center),
];

const DETAIL_RULES: &[(&str, RoleDetail)] = &[
    ("MID", RoleDetail::Midfield),
    ("WING BACK", RoleDetail::WingBack),
    ("BACK", RoleDetail::Back),
    ("CENTER FORWARD", RoleDetail::CenterForward),
    ("GOALKEEPER", RoleDetail::Goalkeeper),
    ("WING", RoleDetail::Wing),
    ("FORWARD", RoleDetail::Forward),
    ("STRIKER", RoleDetail::Forward),
];

const BEHAVIOR_RULES: &[(&str, Behavior)] = &[
    ("ATTACK", Behavior::Attacking),
    ("DEFENSIVE", Behavior::Defending),
];

fn first_match<T: Copy>(upper: &str, rules: &[(&str, T)]) -> Option<T> {
    rules
        .iter()
        .find(|(pattern, _)| upper.contains(pattern))
        .map(|(_, value)| *value)
}

/// Classifies one position name. `pk` is left at 0; ranks come from [`build_taxonomy`].
pub fn classify(position_name: &str) -> PositionType {
    let upper = position_name.trim().to_uppercase();
    let detail = first_match(&upper, DETAIL_RULES);
    PositionType {
        position_name: position_name.trim().to_string(),
        side: first_match(&upper, SIDE_RULES),
        detail,
        code: detail.map(RoleDetail::position_code),
        behavior: first_match(&upper, BEHAVIOR_RULES),
        pk: 0,
    }
}

/// Classifies each distinct name and ranks them alphabetically from 1.
pub fn build_taxonomy<I, S>(names: I) -> Vec<PositionType>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let distinct: BTreeSet<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    distinct
        .iter()
        .enumerate()
        .map(|(idx, name)| PositionType {
            pk: idx as u32 + 1,
            ..classify(name)
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct PositionTaxonomy {
    by_name: HashMap<String, PositionType>,
}

impl PositionTaxonomy {
    pub fn new(types: Vec<PositionType>) -> Self {
        Self {
            by_name: types
                .into_iter()
                .map(|t| (t.position_name.clone(), t))
                .collect(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(build_taxonomy(names))
    }

    pub fn lookup(&self, position_name: &str) -> Option<&PositionType> {
        self.by_name.get(position_name.trim())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Entries ordered by `pk`.
    pub fn entries(&self) -> Vec<&PositionType> {
        let mut out: Vec<&PositionType> = self.by_name.values().collect();
        out.sort_by_key(|t| t.pk);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Behavior, PositionCode, PositionTaxonomy, RoleDetail, Side, build_taxonomy, classify,
    };

    #[test]
    fn wing_back_is_a_back_not_a_winger() {
        let t = classify("Right Wing Back");
        assert_eq!(t.side, Some(Side::Right));
        assert_eq!(t.detail, Some(RoleDetail::WingBack));
        assert_eq!(t.code, Some(PositionCode::Back));
        assert_eq!(t.behavior, None);
    }

    #[test]
    fn midfield_rule_wins_before_back_and_wing() {
        let t = classify("Center Attacking Midfield");
        assert_eq!(t.side, Some(Side::Center));
        assert_eq!(t.code, Some(PositionCode::Midfielder));
        assert_eq!(t.behavior, Some(Behavior::Attacking));

        let t = classify("Left Defensive Midfield");
        assert_eq!(t.side, Some(Side::Left));
        assert_eq!(t.behavior, Some(Behavior::Defending));
    }

    #[test]
    fn forwards_and_keepers() {
        let cf = classify("Right Center Forward");
        assert_eq!(cf.side, Some(Side::RightCenter));
        assert_eq!(cf.detail, Some(RoleDetail::CenterForward));
        assert_eq!(cf.code, Some(PositionCode::Forward));

        let wing = classify("Left Wing");
        assert_eq!(wing.detail, Some(RoleDetail::Wing));
        assert_eq!(wing.code, Some(PositionCode::Forward));

        let ss = classify("Secondary Striker");
        assert_eq!(ss.side, Some(Side::Center));
        assert_eq!(ss.code, Some(PositionCode::Forward));

        let gk = classify("Goalkeeper");
        assert_eq!(gk.side, Some(Side::Goalkeeper));
        assert_eq!(gk.code, Some(PositionCode::Goalkeeper));
    }

    #[test]
    fn unknown_names_stay_unclassified() {
        let t = classify("Substitute");
        assert_eq!(t.side, None);
        assert_eq!(t.code, None);
    }

    #[test]
    fn taxonomy_ranks_distinct_names() {
        let types = build_taxonomy(["Left Back", "Goalkeeper", "Left Back", "Center Back"]);
        let names: Vec<(&str, u32)> = types
            .iter()
            .map(|t| (t.position_name.as_str(), t.pk))
            .collect();
        assert_eq!(
            names,
            vec![("Center Back", 1), ("Goalkeeper", 2), ("Left Back", 3)]
        );

        let taxonomy = PositionTaxonomy::new(types);
        assert_eq!(
            taxonomy.lookup(" Left Back").and_then(|t| t.code),
            Some(PositionCode::Back)
        );
        assert!(taxonomy.lookup("Striker").is_none());
    }
}
