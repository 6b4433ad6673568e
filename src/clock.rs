use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LineupError;

/// Elapsed match time as written in lineup stints (`"MM:SS"`, cumulative minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchClock {
    pub minute: u32,
    pub second: u32,
}

impl MatchClock {
    pub const fn new(minute: u32, second: u32) -> Self {
        Self { minute, second }
    }

    /// Minute is everything before the first `:`, second is the trailing two characters.
    pub fn parse(raw: &str) -> Result<Self, LineupError> {
        let malformed = || LineupError::MalformedClock {
            raw: raw.to_string(),
        };
        let trimmed = raw.trim();
        let (minute_part, _) = trimmed.split_once(':').ok_or_else(malformed)?;
        if trimmed.len() < 2 || !trimmed.is_char_boundary(trimmed.len() - 2) {
            return Err(malformed());
        }
        let second_part = &trimmed[trimmed.len() - 2..];
        let minute = minute_part.trim().parse::<u32>().map_err(|_| malformed())?;
        let second = second_part.parse::<u32>().map_err(|_| malformed())?;
        if second >= 60 {
            return Err(malformed());
        }
        Ok(Self { minute, second })
    }

    pub fn total_seconds(self) -> u32 {
        self.minute * 60 + self.second
    }
}

impl fmt::Display for MatchClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minute, self.second)
    }
}

/// End of a window or stint. `Open` sorts after every concrete clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockBound {
    At(MatchClock),
    Open,
}

impl ClockBound {
    pub fn clock(self) -> Option<MatchClock> {
        match self {
            ClockBound::At(clock) => Some(clock),
            ClockBound::Open => None,
        }
    }
}

impl Ord for ClockBound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ClockBound::At(a), ClockBound::At(b)) => a.cmp(b),
            (ClockBound::At(_), ClockBound::Open) => Ordering::Less,
            (ClockBound::Open, ClockBound::At(_)) => Ordering::Greater,
            (ClockBound::Open, ClockBound::Open) => Ordering::Equal,
        }
    }
}

impl PartialOrd for ClockBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClockBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockBound::At(clock) => clock.fmt(f),
            ClockBound::Open => f.write_str("--:--"),
        }
    }
}

/// A point in a match: period first, then clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodInstant {
    pub period: u8,
    pub clock: ClockBound,
}

impl PeriodInstant {
    pub fn at(period: u8, clock: MatchClock) -> Self {
        Self {
            period,
            clock: ClockBound::At(clock),
        }
    }

    pub fn open(period: u8) -> Self {
        Self {
            period,
            clock: ClockBound::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClockBound, LineupError, MatchClock, PeriodInstant};

    #[test]
    fn parses_lineup_times() {
        assert_eq!(MatchClock::parse("00:00").unwrap(), MatchClock::new(0, 0));
        assert_eq!(MatchClock::parse("67:05").unwrap(), MatchClock::new(67, 5));
        assert_eq!(MatchClock::parse(" 105:30 ").unwrap(), MatchClock::new(105, 30));
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "45", "ab:cd", "12:99", ":"] {
            assert!(
                matches!(MatchClock::parse(raw), Err(LineupError::MalformedClock { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn open_bound_sorts_last() {
        let late = ClockBound::At(MatchClock::new(120, 0));
        assert!(late < ClockBound::Open);
        assert!(PeriodInstant::open(1) < PeriodInstant::at(2, MatchClock::new(45, 0)));
        assert!(PeriodInstant::at(1, MatchClock::new(44, 59)) < PeriodInstant::open(1));
    }
}
