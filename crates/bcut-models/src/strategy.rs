//! Cut-selection strategies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the planner picks a beat from the candidate window.
///
/// Degradation is explicit: `Energy` without onset strengths behaves as
/// `Nearest`, `Downbeat` without a qualifying downbeat behaves as `Nearest`,
/// and `Hybrid` tries `Downbeat`, then `Energy`, then `Nearest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Beat closest to the target time.
    #[default]
    Nearest,
    /// Beat with the strongest onset in the window.
    Energy,
    /// Downbeat near the target, when one exists.
    Downbeat,
    /// Downbeat, else strongest onset, else nearest.
    Hybrid,
    /// Every beat becomes a cut, subject only to the minimum cut gap.
    AllBeats,
}

impl Strategy {
    pub const ALL: &'static [Strategy] = &[
        Strategy::Nearest,
        Strategy::Energy,
        Strategy::Downbeat,
        Strategy::Hybrid,
        Strategy::AllBeats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Nearest => "nearest",
            Strategy::Energy => "energy",
            Strategy::Downbeat => "downbeat",
            Strategy::Hybrid => "hybrid",
            Strategy::AllBeats => "all",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Strategy::Nearest),
            "energy" => Ok(Strategy::Energy),
            "downbeat" => Ok(Strategy::Downbeat),
            "hybrid" => Ok(Strategy::Hybrid),
            "all" | "all_beats" => Ok(Strategy::AllBeats),
            _ => Err(StrategyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown strategy: {0}")]
pub struct StrategyParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("nearest".parse::<Strategy>().unwrap(), Strategy::Nearest);
        assert_eq!("ALL".parse::<Strategy>().unwrap(), Strategy::AllBeats);
        assert_eq!("hybrid".parse::<Strategy>().unwrap(), Strategy::Hybrid);
        assert!("random".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_roundtrip_display() {
        for s in Strategy::ALL {
            assert_eq!(s.as_str().parse::<Strategy>().unwrap(), *s);
        }
    }
}
