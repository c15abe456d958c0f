//! Lazy image cache for the kiosk slideshow.
//!
//! Source photos live under a read-only *photo root*. Displays only need
//! screen-sized copies, so the first time a photo is referenced we produce a
//! copy under the *cache root* at the identical relative path:
//!
//! ```text
//! {photo_root}/trips/2019/beach.jpg   (6000x4000, 9 MB)
//! {cache_root}/trips/2019/beach.jpg   (1620x1080)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use imgcache::{CacheConfig, ImageCache, MediaCache};
//!
//! let cache = ImageCache::new(CacheConfig::new("/srv/photos", "/srv/cache")).unwrap();
//!
//! // Single image: "/cache/trips/2019/beach.jpg", or "/photos/..." if caching failed
//! let url = cache
//!     .ensure_cached_path("/srv/photos/trips/2019/beach.jpg".as_ref())
//!     .unwrap();
//! println!("{}", url);
//!
//! // Frame sequence, ordered by relative path
//! for frame in cache.prepare_frames("timelapse/frame_*.jpg") {
//!     println!("{}", frame);
//! }
//! ```
//!
//! # Cache semantics
//!
//! - Keyed by relative path, not content. An existing cache file is never
//!   re-validated against its source.
//! - Images already within the bounding box are copied byte-for-byte.
//! - Nothing is ever evicted.
//! - Writes are staged next to the destination and renamed into place, so
//!   concurrent first requests for the same photo race harmlessly.

pub mod config;
pub mod frames;
pub mod pattern;
pub mod reference;
pub mod relpath;
pub mod resize;
pub mod store;

// Re-exports for convenience
pub use config::CacheConfig;
pub use frames::scan_tree;
pub use pattern::{filter_directory, is_glob, matches, Pattern};
pub use reference::ServableRef;
pub use relpath::{PathError, RelPath};
pub use resize::fit_within;
pub use store::{CacheError, CacheOutcome, CacheStats, ImageCache, MediaCache};
