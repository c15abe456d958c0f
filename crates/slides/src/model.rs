//! Authored slide library types, as they appear in the library file.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// How long a slide stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawSpan")]
pub enum SlideDuration {
    Seconds(f64),
    /// Stay until something else (the embedded player, the operator) moves on.
    Infinite,
}

/// How many times an animated sequence plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSpan")]
pub enum Repeat {
    Count(u32),
    Infinite,
}

/// Either a number or a word, as authored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSpan {
    Number(f64),
    Text(String),
}

const INFINITE: &str = "infinite";

impl RawSpan {
    fn number(self) -> Result<Option<f64>, String> {
        match self {
            RawSpan::Number(n) => Ok(Some(n)),
            RawSpan::Text(s) if s.trim().eq_ignore_ascii_case(INFINITE) => Ok(None),
            RawSpan::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("expected a number or \"{}\", got {:?}", INFINITE, s)),
        }
    }
}

impl TryFrom<RawSpan> for SlideDuration {
    type Error = String;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        match raw.number()? {
            None => Ok(Self::Infinite),
            Some(n) if n.is_finite() && n >= 0.0 => Ok(Self::Seconds(n)),
            Some(n) => Err(format!("duration must be a non-negative number, got {}", n)),
        }
    }
}

impl TryFrom<RawSpan> for Repeat {
    type Error = String;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        match raw.number()? {
            None => Ok(Self::Infinite),
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
                Ok(Self::Count(n as u32))
            }
            Some(n) => Err(format!("repeat must be a whole number, got {}", n)),
        }
    }
}

impl Serialize for SlideDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Seconds(n) => serializer.serialize_f64(*n),
            Self::Infinite => serializer.serialize_str(INFINITE),
        }
    }
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => serializer.serialize_u32(*n),
            Self::Infinite => serializer.serialize_str(INFINITE),
        }
    }
}

impl fmt::Display for SlideDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(n) => write!(f, "{}s", n),
            Self::Infinite => f.write_str(INFINITE),
        }
    }
}

/// One panel of a mux slide: an ordered list of slide IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub slides: Vec<String>,
}

/// A slide as authored. Which fields matter depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideDefinition {
    pub id: String,

    /// Explicit kind. Absent means still or animated, decided by `file`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Literal relative path or glob pattern under the photo root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<SlideDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Mux only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Mux only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<Panel>,

    /// html and youtube.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// youtube.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl SlideDefinition {
    /// A still or animated slide for `file`.
    pub fn with_file(id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: Some(file.into()),
            ..Self::default()
        }
    }

    /// Whether this slide's media comes from the photo root.
    pub fn has_file(&self) -> bool {
        self.file.as_deref().is_some_and(|f| !f.trim().is_empty())
    }
}

/// An ordered list of slide IDs to play.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeList {
    #[serde(default)]
    pub include: Vec<String>,
}

/// The whole library file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub slides: Vec<SlideDefinition>,

    /// Playlist for clients without their own entry.
    #[serde(default)]
    pub default: Option<IncludeList>,

    #[serde(default)]
    pub clients: HashMap<String, IncludeList>,
}
