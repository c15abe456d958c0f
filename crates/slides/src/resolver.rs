//! Slide graph resolution: client ID → flat, ordered playlist.
//!
//! Resolution is a pure function of the library, the client ID and the cache
//! tree. Every problem with an individual slide (unknown ID, missing file,
//! empty frame pattern, unusable URL) skips that slide with a diagnostic and
//! the rest of the playlist carries on.
//!
//! Mux slides are emitted first, followed depth-first by every distinct slide
//! their panels reach. The seen-set lives for one top-level mux expansion, so
//! a mux that references itself (directly or through another mux) still
//! produces a finite list.

use std::collections::HashSet;

use imgcache::{MediaCache, RelPath};
use tracing::debug;

use crate::descriptor::{RenderableSlide, SlideMedia};
use crate::diagnostics::Diagnostics;
use crate::library::{Library, Slide, SlideKind};
use crate::model::{Repeat, SlideDefinition, SlideDuration};
use crate::youtube;

/// Frame rate used when a slide gives none, or a non-positive one.
pub const DEFAULT_FPS: f64 = 10.0;

const STILL_SECONDS: f64 = 10.0;
const MUX_SECONDS: f64 = 20.0;
const HTML_SECONDS: f64 = 15.0;
const BLANK_SECONDS: f64 = 5.0;

/// Resolves playlists against one library snapshot.
pub struct Resolver<'a> {
    library: &'a Library,
    media: &'a dyn MediaCache,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> Resolver<'a> {
    pub fn new(
        library: &'a Library,
        media: &'a dyn MediaCache,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self {
            library,
            media,
            diagnostics,
        }
    }

    /// Build the playlist for `client`.
    pub fn resolve(&self, client: &str) -> Vec<RenderableSlide> {
        let mut out = Vec::new();

        for id in self.library.include_list(client) {
            let Some(slide) = self.library.get(id) else {
                self.diagnostics
                    .log(&format!("slide '{}' is not defined, skipping", id));
                continue;
            };

            let mut seen = HashSet::from([slide.id().to_string()]);
            self.emit(slide, &mut seen, &mut out);
        }

        if out.is_empty() {
            debug!(client, "playlist resolved empty, using every slide with a file");
            out = self.resolve_all_files();
        }

        out
    }

    /// Every still and animated slide in definition order, ignoring playlists.
    pub fn resolve_all_files(&self) -> Vec<RenderableSlide> {
        self.library
            .slides()
            .iter()
            .filter(|s| matches!(s.kind, SlideKind::Still | SlideKind::Animated))
            .filter(|s| s.def.has_file())
            .filter_map(|s| self.render(s))
            .collect()
    }

    /// Push `slide`, then for a mux every distinct slide its panels reach.
    fn emit(&self, slide: &Slide, seen: &mut HashSet<String>, out: &mut Vec<RenderableSlide>) {
        let Some(rendered) = self.render(slide) else {
            return;
        };
        out.push(rendered);
        if slide.kind == SlideKind::Mux {
            self.expand_panels(slide, seen, out);
        }
    }

    fn expand_panels(
        &self,
        mux: &Slide,
        seen: &mut HashSet<String>,
        out: &mut Vec<RenderableSlide>,
    ) {
        for child_id in mux.def.panels.iter().flat_map(|p| p.slides.iter()) {
            if !seen.insert(child_id.clone()) {
                continue;
            }

            let Some(child) = self.library.get(child_id) else {
                self.diagnostics.log(&format!(
                    "mux '{}' references undefined slide '{}', skipping",
                    mux.id(),
                    child_id
                ));
                continue;
            };

            self.emit(child, seen, out);
        }
    }

    /// Render a single slide, or `None` when it has to be skipped.
    ///
    /// A mux renders as its own descriptor; its panels are expanded by `emit`.
    fn render(&self, slide: &Slide) -> Option<RenderableSlide> {
        let def = &slide.def;
        match slide.kind {
            SlideKind::Still => self.render_still(def),
            SlideKind::Animated => self.render_animated(def),
            SlideKind::Blank => Some(describe(
                def,
                "fade",
                SlideDuration::Seconds(BLANK_SECONDS),
                SlideMedia::Blank,
            )),
            SlideKind::Html => {
                let url = def
                    .url
                    .as_deref()
                    .or(def.file.as_deref())
                    .map(str::trim)
                    .filter(|u| !u.is_empty());
                let Some(url) = url else {
                    self.skip(def, "html slide has no url or file");
                    return None;
                };
                Some(describe(
                    def,
                    "fade",
                    SlideDuration::Seconds(HTML_SECONDS),
                    SlideMedia::Html {
                        url: url.to_string(),
                    },
                ))
            }
            SlideKind::Youtube => {
                let video_id = def
                    .video_id
                    .as_deref()
                    .and_then(youtube::normalize_video_id)
                    .or_else(|| def.url.as_deref().and_then(youtube::extract_video_id))
                    .or_else(|| def.file.as_deref().and_then(youtube_from_file));
                let Some(video_id) = video_id else {
                    self.skip(def, "no usable YouTube video id");
                    return None;
                };
                Some(describe(
                    def,
                    "none",
                    SlideDuration::Infinite,
                    SlideMedia::Youtube { video_id },
                ))
            }
            SlideKind::Mux => Some(describe(
                def,
                "fade",
                SlideDuration::Seconds(MUX_SECONDS),
                SlideMedia::Mux {
                    layout: def.layout.clone(),
                    panels: def.panels.clone(),
                },
            )),
        }
    }

    fn render_still(&self, def: &SlideDefinition) -> Option<RenderableSlide> {
        let file = self.file_of(def)?;
        let rel = match RelPath::new(file) {
            Ok(rel) => rel,
            Err(e) => {
                self.skip(def, &e.to_string());
                return None;
            }
        };

        if !self.media.source_exists(&rel) {
            self.skip(def, &format!("file '{}' not found under the photo root", rel));
            return None;
        }

        let src = self.media.ensure_cached(&rel);
        Some(describe(
            def,
            "fade",
            SlideDuration::Seconds(STILL_SECONDS),
            SlideMedia::Still { src },
        ))
    }

    fn render_animated(&self, def: &SlideDefinition) -> Option<RenderableSlide> {
        let pattern = self.file_of(def)?;
        let frames = self.media.prepare_frames(pattern);
        if frames.is_empty() {
            // `photo[1].jpg` reads as a class but may name a real file
            if RelPath::new(pattern).is_ok_and(|rel| self.media.source_exists(&rel)) {
                debug!(slide = %def.id, pattern, "no frames matched, showing literal file");
                return self.render_still(def);
            }
            self.skip(def, &format!("pattern '{}' matched no frames", pattern));
            return None;
        }

        let fps = def
            .fps
            .filter(|f| f.is_finite() && *f > 0.0)
            .unwrap_or(DEFAULT_FPS);
        let repeat = def.repeat.unwrap_or(Repeat::Count(1));
        let duration = match repeat {
            Repeat::Infinite => SlideDuration::Infinite,
            Repeat::Count(n) => SlideDuration::Seconds(frames.len() as f64 * n as f64 / fps),
        };

        Some(describe(
            def,
            "none",
            duration,
            SlideMedia::Animated {
                frames,
                fps,
                repeat,
            },
        ))
    }

    fn file_of<'d>(&self, def: &'d SlideDefinition) -> Option<&'d str> {
        let file = def.file.as_deref().map(str::trim).filter(|f| !f.is_empty());
        if file.is_none() {
            self.skip(def, "no file given");
        }
        file
    }

    fn skip(&self, def: &SlideDefinition, reason: &str) {
        self.diagnostics
            .log(&format!("skipping slide '{}': {}", def.id, reason));
    }
}

/// A youtube `file` may hold a full URL or a bare video ID.
fn youtube_from_file(file: &str) -> Option<String> {
    youtube::extract_video_id(file).or_else(|| youtube::normalize_video_id(file))
}

/// Common fields, with authored values overriding the kind's defaults.
fn describe(
    def: &SlideDefinition,
    default_effect: &str,
    default_duration: SlideDuration,
    media: SlideMedia,
) -> RenderableSlide {
    RenderableSlide {
        id: def.id.clone(),
        title: def.title.clone().unwrap_or_default(),
        effect: def
            .effect
            .clone()
            .unwrap_or_else(|| default_effect.to_string()),
        duration: def.duration.unwrap_or(default_duration),
        media,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use crate::model::{IncludeList, LibraryConfig, Panel};
    use imgcache::ServableRef;
    use std::collections::{BTreeMap, BTreeSet};

    /// In-memory media: a fixed set of source files, everything "caches".
    #[derive(Default)]
    struct FakeMedia {
        files: BTreeSet<String>,
    }

    impl FakeMedia {
        fn with(files: &[&str]) -> Self {
            Self {
                files: files.iter().map(|f| f.to_string()).collect(),
            }
        }
    }

    impl MediaCache for FakeMedia {
        fn ensure_cached(&self, rel: &RelPath) -> ServableRef {
            ServableRef::Cached(rel.clone())
        }

        fn prepare_frames(&self, pattern: &str) -> Vec<ServableRef> {
            let paths: Vec<&String> = self.files.iter().collect();
            imgcache::filter_directory(paths.as_slice(), &[pattern])
                .into_iter()
                .filter_map(|p| RelPath::new(&p).ok())
                .map(ServableRef::Cached)
                .collect()
        }

        fn source_exists(&self, rel: &RelPath) -> bool {
            self.files.contains(rel.as_str())
        }
    }

    fn library(slides: Vec<SlideDefinition>, default: &[&str]) -> Library {
        let config = LibraryConfig {
            slides,
            default: Some(IncludeList {
                include: default.iter().map(|s| s.to_string()).collect(),
            }),
            clients: Default::default(),
        };
        Library::from_config(config, &CollectingDiagnostics::new())
    }

    fn mux(id: &str, panels: &[&[&str]]) -> SlideDefinition {
        SlideDefinition {
            id: id.to_string(),
            kind: Some("mux".to_string()),
            panels: panels
                .iter()
                .map(|p| Panel {
                    slides: p.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
            ..SlideDefinition::default()
        }
    }

    fn ids(slides: &[RenderableSlide]) -> Vec<&str> {
        slides.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_missing_id_is_skipped() {
        let lib = library(vec![SlideDefinition::with_file("a", "a.jpg")], &["a", "ghost"]);
        let media = FakeMedia::with(&["a.jpg"]);
        let diag = CollectingDiagnostics::new();

        let out = Resolver::new(&lib, &media, &diag).resolve("default");
        assert_eq!(ids(&out), vec!["a"]);
        assert_eq!(out[0].media, SlideMedia::Still {
            src: ServableRef::Cached(RelPath::new("a.jpg").unwrap())
        });
        assert_eq!(diag.messages().len(), 1);
        assert!(diag.messages()[0].contains("ghost"));
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let lib = library(
            vec![
                SlideDefinition::with_file("a", "a.jpg"),
                SlideDefinition::with_file("gone", "gone.jpg"),
            ],
            &["gone", "a"],
        );
        let media = FakeMedia::with(&["a.jpg"]);
        let diag = CollectingDiagnostics::new();

        let out = Resolver::new(&lib, &media, &diag).resolve("default");
        assert_eq!(ids(&out), vec!["a"]);
        assert!(diag.messages()[0].contains("gone.jpg"));
    }

    #[test]
    fn test_animated_duration() {
        let mut seq = SlideDefinition::with_file("seq", "f_*.png");
        seq.fps = Some(2.0);
        seq.repeat = Some(Repeat::Count(3));
        let mut looped = SlideDefinition::with_file("loop", "f_*.png");
        looped.repeat = Some(Repeat::Infinite);
        looped.fps = Some(0.0);
        let lib = library(vec![seq, looped], &["seq", "loop"]);
        let media = FakeMedia::with(&["f_1.png", "f_2.png", "other.png"]);

        let out = Resolver::new(&lib, &media, &CollectingDiagnostics::new()).resolve("x");
        assert_eq!(out[0].duration, SlideDuration::Seconds(3.0));
        assert_eq!(out[0].effect, "none");
        assert_eq!(out[1].duration, SlideDuration::Infinite);
        match &out[1].media {
            SlideMedia::Animated { frames, fps, .. } => {
                assert_eq!(frames.len(), 2);
                assert_eq!(*fps, DEFAULT_FPS);
            }
            other => panic!("expected animated, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_duration_wins() {
        let mut looped = SlideDefinition::with_file("loop", "f_*.png");
        looped.repeat = Some(Repeat::Infinite);
        looped.duration = Some(SlideDuration::Seconds(42.0));
        let lib = library(vec![looped], &["loop"]);
        let media = FakeMedia::with(&["f_1.png"]);

        let out = Resolver::new(&lib, &media, &CollectingDiagnostics::new()).resolve("x");
        assert_eq!(out[0].duration, SlideDuration::Seconds(42.0));
    }

    #[test]
    fn test_mux_self_reference_is_finite() {
        let lib = library(
            vec![
                mux("wall", &[&["wall", "a"], &["inner"]]),
                mux("inner", &[&["a", "wall", "b"]]),
                SlideDefinition::with_file("a", "a.jpg"),
                SlideDefinition::with_file("b", "b.jpg"),
            ],
            &["wall"],
        );
        let media = FakeMedia::with(&["a.jpg", "b.jpg"]);

        let out = Resolver::new(&lib, &media, &CollectingDiagnostics::new()).resolve("x");
        assert_eq!(ids(&out), vec!["wall", "a", "inner", "b"]);
        assert_eq!(out[0].duration, SlideDuration::Seconds(MUX_SECONDS));
    }

    #[test]
    fn test_seen_set_is_per_top_level_mux() {
        let lib = library(
            vec![
                mux("m1", &[&["a"]]),
                mux("m2", &[&["a"]]),
                SlideDefinition::with_file("a", "a.jpg"),
            ],
            &["m1", "m2"],
        );
        let media = FakeMedia::with(&["a.jpg"]);

        let out = Resolver::new(&lib, &media, &CollectingDiagnostics::new()).resolve("x");
        assert_eq!(ids(&out), vec!["m1", "a", "m2", "a"]);
    }

    #[test]
    fn test_external_kinds() {
        let html = SlideDefinition {
            id: "menu".into(),
            kind: Some("html".into()),
            url: Some("https://example.com/menu".into()),
            ..SlideDefinition::default()
        };
        let video = SlideDefinition {
            id: "promo".into(),
            kind: Some("youtube".into()),
            url: Some("https://youtu.be/dQw4w9WgXcQ".into()),
            ..SlideDefinition::default()
        };
        let broken = SlideDefinition {
            id: "broken".into(),
            kind: Some("youtube".into()),
            url: Some("https://example.com/video".into()),
            ..SlideDefinition::default()
        };
        let gap = SlideDefinition {
            id: "gap".into(),
            ..SlideDefinition::default()
        };
        let lib = library(vec![html, video, broken, gap], &["menu", "promo", "broken", "gap"]);
        let diag = CollectingDiagnostics::new();

        let out = Resolver::new(&lib, &FakeMedia::default(), &diag).resolve("x");
        assert_eq!(ids(&out), vec!["menu", "promo", "gap"]);
        assert_eq!(out[0].duration, SlideDuration::Seconds(HTML_SECONDS));
        assert_eq!(out[1].media, SlideMedia::Youtube { video_id: "dQw4w9WgXcQ".into() });
        assert_eq!(out[1].duration, SlideDuration::Infinite);
        assert_eq!(out[2].media, SlideMedia::Blank);
        assert_eq!(out[2].duration, SlideDuration::Seconds(BLANK_SECONDS));
        assert_eq!(diag.messages().len(), 1);
    }

    #[test]
    fn test_empty_playlist_falls_back_to_files() {
        let lib = library(
            vec![
                SlideDefinition::with_file("a", "a.jpg"),
                SlideDefinition {
                    id: "gap".into(),
                    ..SlideDefinition::default()
                },
            ],
            &["ghost"],
        );
        let media = FakeMedia::with(&["a.jpg"]);

        let out = Resolver::new(&lib, &media, &CollectingDiagnostics::new()).resolve("x");
        assert_eq!(ids(&out), vec!["a"]);
    }

    #[test]
    fn test_client_entry_overrides_default() {
        let config = LibraryConfig {
            slides: vec![
                SlideDefinition::with_file("a", "a.jpg"),
                SlideDefinition::with_file("b", "b.jpg"),
            ],
            default: Some(IncludeList { include: vec!["a".into()] }),
            clients: BTreeMap::from([(
                "lobby".to_string(),
                IncludeList {
                    include: vec!["b".into()],
                },
            )])
            .into_iter()
            .collect(),
        };
        let lib = Library::from_config(config, &CollectingDiagnostics::new());
        let media = FakeMedia::with(&["a.jpg", "b.jpg"]);
        let diag = CollectingDiagnostics::new();
        let resolver = Resolver::new(&lib, &media, &diag);

        assert_eq!(ids(&resolver.resolve("lobby")), vec!["b"]);
        assert_eq!(ids(&resolver.resolve("kitchen")), vec!["a"]);
    }

    #[test]
    fn test_external_kinds_accept_file_reference() {
        let html = SlideDefinition {
            id: "menu".into(),
            kind: Some("html".into()),
            file: Some("https://example.com/menu".into()),
            ..SlideDefinition::default()
        };
        let embed = SlideDefinition {
            id: "yt".into(),
            kind: Some("youtube".into()),
            file: Some("https://youtube.com/embed/dQw4w9WgXcQ".into()),
            ..SlideDefinition::default()
        };
        let bare = SlideDefinition {
            id: "bare".into(),
            kind: Some("youtube".into()),
            file: Some("dQw4w9WgXcQ".into()),
            ..SlideDefinition::default()
        };
        let lib = library(vec![html, embed, bare], &["menu", "yt", "bare"]);
        let diag = CollectingDiagnostics::new();

        let out = Resolver::new(&lib, &FakeMedia::default(), &diag).resolve("x");
        assert_eq!(ids(&out), vec!["menu", "yt", "bare"]);
        assert_eq!(
            out[0].media,
            SlideMedia::Html {
                url: "https://example.com/menu".into()
            }
        );
        assert_eq!(
            out[1].media,
            SlideMedia::Youtube {
                video_id: "dQw4w9WgXcQ".into()
            }
        );
        assert_eq!(out[2].media, out[1].media);
        assert!(diag.messages().is_empty());
    }

    #[test]
    fn test_bracketed_literal_file_shows_as_still() {
        let lib = library(
            vec![SlideDefinition::with_file("p", "photo[1].jpg")],
            &["p"],
        );
        assert_eq!(lib.get("p").map(|s| s.kind), Some(SlideKind::Animated));
        let media = FakeMedia::with(&["photo[1].jpg"]);
        let diag = CollectingDiagnostics::new();

        let out = Resolver::new(&lib, &media, &diag).resolve("x");
        assert_eq!(ids(&out), vec!["p"]);
        assert_eq!(
            out[0].media,
            SlideMedia::Still {
                src: ServableRef::Cached(RelPath::new("photo[1].jpg").unwrap())
            }
        );
        assert!(diag.messages().is_empty());
    }
}
