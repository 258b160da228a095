//! The xfade transition palette and boundary marker styles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed palette of boundary transitions.
///
/// Every variant maps 1:1 onto an ffmpeg `xfade` transition identifier;
/// unknown names are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Fade,
    FadeBlack,
    FadeWhite,
    FadeGrays,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    WipeTl,
    WipeTr,
    WipeBl,
    WipeBr,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    SmoothLeft,
    SmoothRight,
    SmoothUp,
    SmoothDown,
    CircleCrop,
    CircleClose,
    CircleOpen,
    RectCrop,
    HorzClose,
    HorzOpen,
    VertClose,
    VertOpen,
    DiagBl,
    DiagBr,
    DiagTl,
    DiagTr,
    HlSlice,
    HrSlice,
    VuSlice,
    VdSlice,
    Dissolve,
    Pixelize,
    Radial,
    HBlur,
    Distance,
    SqueezeV,
    SqueezeH,
    ZoomIn,
    HlWind,
    HrWind,
    VuWind,
    VdWind,
    CoverLeft,
    CoverRight,
    CoverUp,
    CoverDown,
    RevealLeft,
    RevealRight,
    RevealUp,
    RevealDown,
}

impl Transition {
    pub const ALL: &'static [Transition] = &[
        Transition::Fade,
        Transition::FadeBlack,
        Transition::FadeWhite,
        Transition::FadeGrays,
        Transition::WipeLeft,
        Transition::WipeRight,
        Transition::WipeUp,
        Transition::WipeDown,
        Transition::WipeTl,
        Transition::WipeTr,
        Transition::WipeBl,
        Transition::WipeBr,
        Transition::SlideLeft,
        Transition::SlideRight,
        Transition::SlideUp,
        Transition::SlideDown,
        Transition::SmoothLeft,
        Transition::SmoothRight,
        Transition::SmoothUp,
        Transition::SmoothDown,
        Transition::CircleCrop,
        Transition::CircleClose,
        Transition::CircleOpen,
        Transition::RectCrop,
        Transition::HorzClose,
        Transition::HorzOpen,
        Transition::VertClose,
        Transition::VertOpen,
        Transition::DiagBl,
        Transition::DiagBr,
        Transition::DiagTl,
        Transition::DiagTr,
        Transition::HlSlice,
        Transition::HrSlice,
        Transition::VuSlice,
        Transition::VdSlice,
        Transition::Dissolve,
        Transition::Pixelize,
        Transition::Radial,
        Transition::HBlur,
        Transition::Distance,
        Transition::SqueezeV,
        Transition::SqueezeH,
        Transition::ZoomIn,
        Transition::HlWind,
        Transition::HrWind,
        Transition::VuWind,
        Transition::VdWind,
        Transition::CoverLeft,
        Transition::CoverRight,
        Transition::CoverUp,
        Transition::CoverDown,
        Transition::RevealLeft,
        Transition::RevealRight,
        Transition::RevealUp,
        Transition::RevealDown,
    ];

    /// The ffmpeg `xfade` transition identifier.
    pub fn as_ffmpeg(&self) -> &'static str {
        match self {
            Transition::Fade => "fade",
            Transition::FadeBlack => "fadeblack",
            Transition::FadeWhite => "fadewhite",
            Transition::FadeGrays => "fadegrays",
            Transition::WipeLeft => "wipeleft",
            Transition::WipeRight => "wiperight",
            Transition::WipeUp => "wipeup",
            Transition::WipeDown => "wipedown",
            Transition::WipeTl => "wipetl",
            Transition::WipeTr => "wipetr",
            Transition::WipeBl => "wipebl",
            Transition::WipeBr => "wipebr",
            Transition::SlideLeft => "slideleft",
            Transition::SlideRight => "slideright",
            Transition::SlideUp => "slideup",
            Transition::SlideDown => "slidedown",
            Transition::SmoothLeft => "smoothleft",
            Transition::SmoothRight => "smoothright",
            Transition::SmoothUp => "smoothup",
            Transition::SmoothDown => "smoothdown",
            Transition::CircleCrop => "circlecrop",
            Transition::CircleClose => "circleclose",
            Transition::CircleOpen => "circleopen",
            Transition::RectCrop => "rectcrop",
            Transition::HorzClose => "horzclose",
            Transition::HorzOpen => "horzopen",
            Transition::VertClose => "vertclose",
            Transition::VertOpen => "vertopen",
            Transition::DiagBl => "diagbl",
            Transition::DiagBr => "diagbr",
            Transition::DiagTl => "diagtl",
            Transition::DiagTr => "diagtr",
            Transition::HlSlice => "hlslice",
            Transition::HrSlice => "hrslice",
            Transition::VuSlice => "vuslice",
            Transition::VdSlice => "vdslice",
            Transition::Dissolve => "dissolve",
            Transition::Pixelize => "pixelize",
            Transition::Radial => "radial",
            Transition::HBlur => "hblur",
            Transition::Distance => "distance",
            Transition::SqueezeV => "squeezev",
            Transition::SqueezeH => "squeezeh",
            Transition::ZoomIn => "zoomin",
            Transition::HlWind => "hlwind",
            Transition::HrWind => "hrwind",
            Transition::VuWind => "vuwind",
            Transition::VdWind => "vdwind",
            Transition::CoverLeft => "coverleft",
            Transition::CoverRight => "coverright",
            Transition::CoverUp => "coverup",
            Transition::CoverDown => "coverdown",
            Transition::RevealLeft => "revealleft",
            Transition::RevealRight => "revealright",
            Transition::RevealUp => "revealup",
            Transition::RevealDown => "revealdown",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ffmpeg())
    }
}

impl FromStr for Transition {
    type Err = TransitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Transition::ALL
            .iter()
            .find(|t| t.as_ffmpeg() == lower)
            .copied()
            .ok_or_else(|| TransitionParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown transition: {0}")]
pub struct TransitionParseError(String);

/// One-frame marker styles for boundaries that fall back to a hard cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    /// No marker, plain hard cut.
    #[default]
    None,
    /// Full-frame white flash.
    WhitePop,
    /// Full-frame black flash.
    BlackFlash,
    /// Saturation/brightness pulse.
    Pulse,
    /// Gaussian blur flash.
    Bloom,
}

impl MarkerStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerStyle::None => "none",
            MarkerStyle::WhitePop => "whitepop",
            MarkerStyle::BlackFlash => "blackflash",
            MarkerStyle::Pulse => "pulse",
            MarkerStyle::Bloom => "bloom",
        }
    }
}

impl fmt::Display for MarkerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MarkerStyle {
    type Err = MarkerStyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(MarkerStyle::None),
            "whitepop" => Ok(MarkerStyle::WhitePop),
            "blackflash" => Ok(MarkerStyle::BlackFlash),
            "pulse" => Ok(MarkerStyle::Pulse),
            "bloom" => Ok(MarkerStyle::Bloom),
            _ => Err(MarkerStyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown marker style: {0}")]
pub struct MarkerStyleParseError(String);
