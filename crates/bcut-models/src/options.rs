//! Render-mode, alignment, quantization and overlay-scope options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How segment boundaries are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Concat chain of stills; every boundary is an instantaneous cut.
    HardCut,
    /// Chained xfade transitions with per-boundary hard-cut fallback.
    #[default]
    Crossfade,
}

/// Where a crossfade sits relative to the beat it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// The transition ends on the beat.
    End,
    /// The transition's centre sits on the beat.
    #[default]
    Midpoint,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::End => "end",
            Alignment::Midpoint => "midpoint",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "end" => Ok(Alignment::End),
            "midpoint" => Ok(Alignment::Midpoint),
            _ => Err(OptionParseError::Alignment(s.to_string())),
        }
    }
}

/// Per-segment rounding of durations onto the frame grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quantize {
    #[default]
    Nearest,
    Floor,
    Ceil,
}

impl Quantize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantize::Nearest => "nearest",
            Quantize::Floor => "floor",
            Quantize::Ceil => "ceil",
        }
    }
}

impl fmt::Display for Quantize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Quantize {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Quantize::Nearest),
            "floor" => Ok(Quantize::Floor),
            "ceil" => Ok(Quantize::Ceil),
            _ => Err(OptionParseError::Quantize(s.to_string())),
        }
    }
}

/// Region restriction for pulse/bloom/tick overlays.
///
/// Scoping needs a precomputed alpha mask per image; when masks are missing
/// the scope degrades to `None` silently. Crossfade boundaries are never
/// masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaskScope {
    #[default]
    None,
    Foreground,
    Background,
}

impl MaskScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskScope::None => "none",
            MaskScope::Foreground => "foreground",
            MaskScope::Background => "background",
        }
    }

    pub fn is_scoped(&self) -> bool {
        !matches!(self, MaskScope::None)
    }
}

impl fmt::Display for MaskScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaskScope {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(MaskScope::None),
            "foreground" => Ok(MaskScope::Foreground),
            "background" => Ok(MaskScope::Background),
            _ => Err(OptionParseError::MaskScope(s.to_string())),
        }
    }
}

/// Corner placement of the sticky beat counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CounterPosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl CounterPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterPosition::TopRight => "tr",
            CounterPosition::TopLeft => "tl",
            CounterPosition::BottomRight => "br",
            CounterPosition::BottomLeft => "bl",
        }
    }

    /// drawtext x/y expressions for this corner.
    pub fn text_exprs(&self) -> (&'static str, &'static str) {
        match self {
            CounterPosition::TopRight => ("w-tw-20", "20"),
            CounterPosition::TopLeft => ("20", "20"),
            CounterPosition::BottomRight => ("w-tw-20", "h-th-20"),
            CounterPosition::BottomLeft => ("20", "h-th-20"),
        }
    }
}

impl fmt::Display for CounterPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CounterPosition {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tr" => Ok(CounterPosition::TopRight),
            "tl" => Ok(CounterPosition::TopLeft),
            "br" => Ok(CounterPosition::BottomRight),
            "bl" => Ok(CounterPosition::BottomLeft),
            _ => Err(OptionParseError::CounterPosition(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionParseError {
    #[error("Unknown alignment: {0}, expected 'end' or 'midpoint'")]
    Alignment(String),
    #[error("Unknown quantize mode: {0}, expected 'nearest', 'floor' or 'ceil'")]
    Quantize(String),
    #[error("Unknown mask scope: {0}, expected 'none', 'foreground' or 'background'")]
    MaskScope(String),
    #[error("Unknown counter position: {0}, expected 'tr', 'tl', 'br' or 'bl'")]
    CounterPosition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_parse() {
        assert_eq!("end".parse::<Alignment>().unwrap(), Alignment::End);
        assert_eq!("MIDPOINT".parse::<Alignment>().unwrap(), Alignment::Midpoint);
        assert!("start".parse::<Alignment>().is_err());
    }

    #[test]
    fn test_quantize_parse() {
        assert_eq!("floor".parse::<Quantize>().unwrap(), Quantize::Floor);
        assert!("trunc".parse::<Quantize>().is_err());
    }

    #[test]
    fn test_counter_position_exprs() {
        let (x, y) = CounterPosition::BottomLeft.text_exprs();
        assert_eq!(x, "20");
        assert_eq!(y, "h-th-20");
    }

    #[test]
    fn test_mask_scope() {
        assert!(MaskScope::Foreground.is_scoped());
        assert!(!MaskScope::None.is_scoped());
        assert_eq!(
            "background".parse::<MaskScope>().unwrap(),
            MaskScope::Background
        );
    }
}
