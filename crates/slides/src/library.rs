//! The validated, immutable slide library a resolution runs against.

use std::collections::HashMap;

use imgcache::is_glob;

use crate::diagnostics::Diagnostics;
use crate::model::{IncludeList, LibraryConfig, SlideDefinition};

/// What a slide renders as. Closed; unknown `type` values never get this far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKind {
    Still,
    Animated,
    Blank,
    Html,
    Youtube,
    Mux,
}

impl SlideKind {
    /// Classify a definition. `Err` carries the unrecognized `type` value.
    pub fn classify(def: &SlideDefinition) -> Result<Self, String> {
        let Some(kind) = def.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(Self::from_file(def));
        };

        match kind.to_ascii_lowercase().as_str() {
            "still" | "image" => Ok(Self::Still),
            "animated" | "animation" => Ok(Self::Animated),
            "blank" => Ok(Self::Blank),
            "html" | "web" => Ok(Self::Html),
            "youtube" => Ok(Self::Youtube),
            "mux" => Ok(Self::Mux),
            _ => Err(kind.to_string()),
        }
    }

    fn from_file(def: &SlideDefinition) -> Self {
        match def.file.as_deref().map(str::trim) {
            Some(f) if f.is_empty() => Self::Blank,
            Some(f) if is_glob(f) => Self::Animated,
            Some(_) => Self::Still,
            None => Self::Blank,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Still => "still",
            Self::Animated => "animated",
            Self::Blank => "blank",
            Self::Html => "html",
            Self::Youtube => "youtube",
            Self::Mux => "mux",
        }
    }
}

/// A definition together with its resolved kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub kind: SlideKind,
    pub def: SlideDefinition,
}

impl Slide {
    pub fn id(&self) -> &str {
        &self.def.id
    }
}

/// Slides in definition order plus the playlists that reference them.
#[derive(Debug, Clone, Default)]
pub struct Library {
    slides: Vec<Slide>,
    index: HashMap<String, usize>,
    default: Option<IncludeList>,
    clients: HashMap<String, IncludeList>,
}

impl Library {
    /// Validate a decoded library file.
    ///
    /// Definitions with an unknown `type`, an empty `id`, or an `id` already
    /// taken by an earlier definition are dropped with a diagnostic; references
    /// to them then behave like missing IDs.
    pub fn from_config(config: LibraryConfig, diagnostics: &dyn Diagnostics) -> Self {
        let mut slides = Vec::with_capacity(config.slides.len());
        let mut index = HashMap::new();

        for def in config.slides {
            if def.id.trim().is_empty() {
                diagnostics.log("dropping slide definition without an id");
                continue;
            }
            if index.contains_key(&def.id) {
                diagnostics.log(&format!("duplicate slide id '{}', keeping the first", def.id));
                continue;
            }
            let kind = match SlideKind::classify(&def) {
                Ok(kind) => kind,
                Err(unknown) => {
                    diagnostics.log(&format!(
                        "slide '{}' has unknown type '{}', dropping it",
                        def.id, unknown
                    ));
                    continue;
                }
            };
            index.insert(def.id.clone(), slides.len());
            slides.push(Slide { kind, def });
        }

        Self {
            slides,
            index,
            default: config.default,
            clients: config.clients,
        }
    }

    /// Look up a slide by ID.
    pub fn get(&self, id: &str) -> Option<&Slide> {
        self.index.get(id).map(|&i| &self.slides[i])
    }

    /// All slides in definition order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Configured client identifiers, sorted.
    pub fn client_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// The IDs a client should see, before any lookups.
    ///
    /// A client without an entry gets the `default` list; an empty list means
    /// every slide in definition order.
    pub fn include_list(&self, client: &str) -> Vec<&str> {
        let listed = self
            .clients
            .get(client)
            .or(self.default.as_ref())
            .map(|l| l.include.as_slice())
            .unwrap_or_default();

        if listed.is_empty() {
            self.slides.iter().map(Slide::id).collect()
        } else {
            listed.iter().map(String::as_str).collect()
        }
    }
}
