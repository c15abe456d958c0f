//! Renderable slide descriptors: what the kiosk client receives.
//!
//! ```json
//! { "id": "b", "title": "", "effect": "none", "duration": 0.2,
//!   "type": "animated", "frames": ["/cache/seq_001.jpg"], "fps": 10.0, "repeat": 1 }
//! ```

use imgcache::ServableRef;
use serde::Serialize;

use crate::model::{Panel, Repeat, SlideDuration};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableSlide {
    pub id: String,
    pub title: String,
    pub effect: String,
    pub duration: SlideDuration,
    #[serde(flatten)]
    pub media: SlideMedia,
}

/// Kind-specific payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlideMedia {
    Still {
        src: ServableRef,
    },
    Animated {
        frames: Vec<ServableRef>,
        fps: f64,
        repeat: Repeat,
    },
    Blank,
    Html {
        url: String,
    },
    Youtube {
        video_id: String,
    },
    /// Panels are carried verbatim; the referenced slides follow in the
    /// playlist and the client rebuilds the nesting by `id`.
    Mux {
        #[serde(skip_serializing_if = "Option::is_none")]
        layout: Option<String>,
        panels: Vec<Panel>,
    },
}

impl SlideMedia {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Still { .. } => "still",
            Self::Animated { .. } => "animated",
            Self::Blank => "blank",
            Self::Html { .. } => "html",
            Self::Youtube { .. } => "youtube",
            Self::Mux { .. } => "mux",
        }
    }
}

/// Response body for `GET /api/slideshow`.
#[derive(Debug, Clone, Serialize)]
pub struct Slideshow {
    pub slides: Vec<RenderableSlide>,
}
