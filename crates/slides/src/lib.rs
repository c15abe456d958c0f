//! Slide library and playlist resolution for the kiosk slideshow.
//!
//! A library file defines slides by ID and lists which IDs each client plays.
//! Resolving a client walks that list, expands mux slides into the slides
//! their panels reference, and turns every slide into a [`RenderableSlide`]
//! with cache-backed image URLs.
//!
//! ```rust,no_run
//! use imgcache::{CacheConfig, ImageCache};
//! use slides::{LibraryHandle, LibrarySource, Resolver, TracingDiagnostics};
//!
//! let cache = ImageCache::new(CacheConfig::new("/srv/photos", "/srv/cache")).unwrap();
//! let handle = LibraryHandle::open(
//!     LibrarySource::new("/etc/kiosk/slides.toml", "/srv/photos"),
//!     &TracingDiagnostics,
//! );
//!
//! let library = handle.current();
//! let playlist = Resolver::new(&library, &cache, &TracingDiagnostics).resolve("lobby");
//! println!("{}", serde_json::to_string_pretty(&playlist).unwrap());
//! ```

pub mod descriptor;
pub mod diagnostics;
pub mod library;
pub mod loader;
pub mod model;
pub mod resolver;
pub mod youtube;

pub use descriptor::{RenderableSlide, SlideMedia, Slideshow};
pub use diagnostics::{CollectingDiagnostics, Diagnostics, TracingDiagnostics};
pub use library::{Library, Slide, SlideKind};
pub use loader::{load_library_file, scan_library, LibraryError, LibraryHandle, LibrarySource};
pub use model::{IncludeList, LibraryConfig, Panel, Repeat, SlideDefinition, SlideDuration};
pub use resolver::Resolver;
