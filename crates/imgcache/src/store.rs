//! ImageCache: lazily produced, display-ready copies of source photos.
//!
//! Layout mirrors the photo root exactly:
//! ```text
//! {photo_root}/
//! └── trips/2019/beach.jpg        # 6000x4000 original
//! {cache_root}/
//! └── trips/2019/beach.jpg        # 1620x1080 copy
//! ```
//!
//! A cache file's existence is the whole validity check. Replacing a source
//! photo under the same name keeps serving the old copy until the cache file
//! is removed by hand.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::reference::ServableRef;
use crate::relpath::{PathError, RelPath};
use crate::resize::{exceeds, fit_within};

/// Trait for the media lookups the slide resolver needs.
///
/// None of these fail: a cache problem degrades to the original photo, and a
/// frame pattern that matches nothing yields an empty list.
pub trait MediaCache: Send + Sync {
    /// Guarantee a display-ready copy exists and return its URL reference.
    fn ensure_cached(&self, rel: &RelPath) -> ServableRef;

    /// Expand a glob under the photo root into cached frames, ordered by path.
    fn prepare_frames(&self, pattern: &str) -> Vec<ServableRef>;

    /// Whether a source file exists under the photo root.
    fn source_exists(&self, rel: &RelPath) -> bool;
}

/// Errors raised while producing a cache entry. Never escapes `ensure_cached`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a successful cache call had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The cache file already existed.
    Hit,
    /// Source fit the bounding box and was copied verbatim.
    Copied,
    /// Source was decoded, oriented, downscaled and re-encoded.
    Resized { width: u32, height: u32 },
}

/// Snapshot of cache activity since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub copies: u64,
    pub resizes: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    copies: AtomicU64,
    resizes: AtomicU64,
    fallbacks: AtomicU64,
}

/// Filesystem-backed image cache.
#[derive(Debug)]
pub struct ImageCache {
    config: CacheConfig,
    counters: Counters,
}

impl ImageCache {
    /// Create a cache, making sure the cache root exists.
    pub fn new(config: CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_root).with_context(|| {
            format!(
                "failed to create cache root {}",
                config.cache_root.display()
            )
        })?;

        Ok(Self {
            config,
            counters: Counters::default(),
        })
    }

    /// Create a cache with explicit roots and default bounds.
    pub fn at_paths(
        photo_root: impl Into<PathBuf>,
        cache_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        Self::new(CacheConfig::new(photo_root, cache_root))
    }

    /// Get the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Where the cached copy of `rel` lives (whether or not it exists yet).
    pub fn cached_path(&self, rel: &RelPath) -> PathBuf {
        rel.join_to(&self.config.cache_root)
    }

    /// Where the source for `rel` lives.
    pub fn source_path(&self, rel: &RelPath) -> PathBuf {
        rel.join_to(&self.config.photo_root)
    }

    /// Counters since this cache was created.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            copies: self.counters.copies.load(Ordering::Relaxed),
            resizes: self.counters.resizes.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// `ensure_cached` for an absolute source path.
    ///
    /// Fails only when the path is not under the photo root.
    pub fn ensure_cached_path(&self, source: &Path) -> Result<ServableRef, PathError> {
        let rel = RelPath::from_path_under(source, &self.config.photo_root)?;
        Ok(self.ensure_cached(&rel))
    }

    /// Produce the cache entry for `rel`, reporting what had to be done.
    pub fn try_cache(&self, rel: &RelPath) -> Result<CacheOutcome, CacheError> {
        let source = self.source_path(rel);
        let cached = self.cached_path(rel);

        if let Some(parent) = cached.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        if cached.exists() {
            return Ok(CacheOutcome::Hit);
        }

        let (width, height) = image::image_dimensions(&source)?;
        if !exceeds(width, height, self.config.max_width, self.config.max_height) {
            stage_copy(&source, &cached)?;
            return Ok(CacheOutcome::Copied);
        }

        let img = decode_oriented(&source)?;
        let (w, h) = fit_within(
            img.width(),
            img.height(),
            self.config.max_width,
            self.config.max_height,
        );
        let img = if (w, h) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(w, h, FilterType::Lanczos3)
        };

        stage_encode(&img, &cached, self.config.jpeg_quality)?;
        Ok(CacheOutcome::Resized {
            width: w,
            height: h,
        })
    }

    fn record(&self, outcome: CacheOutcome) {
        let counter = match outcome {
            CacheOutcome::Hit => &self.counters.hits,
            CacheOutcome::Copied => &self.counters.copies,
            CacheOutcome::Resized { .. } => &self.counters.resizes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl MediaCache for ImageCache {
    fn ensure_cached(&self, rel: &RelPath) -> ServableRef {
        match self.try_cache(rel) {
            Ok(outcome) => {
                self.record(outcome);
                if outcome != CacheOutcome::Hit {
                    debug!(path = %rel, ?outcome, "cached image");
                }
                ServableRef::Cached(rel.clone())
            }
            Err(e) => {
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                warn!(path = %rel, error = %e, "caching failed, serving original");
                ServableRef::Original(rel.clone())
            }
        }
    }

    fn prepare_frames(&self, pattern: &str) -> Vec<ServableRef> {
        self.frame_paths(pattern)
            .iter()
            .map(|rel| self.ensure_cached(rel))
            .collect()
    }

    fn source_exists(&self, rel: &RelPath) -> bool {
        self.source_path(rel).is_file()
    }
}

/// Decode with the embedded orientation applied to the pixels.
///
/// The re-encoded output carries no EXIF, so viewers won't rotate it again.
fn decode_oriented(path: &Path) -> Result<DynamicImage, CacheError> {
    let reader = ImageReader::open(path)
        .map_err(|e| CacheError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| CacheError::io(path, e))?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Sibling path used while writing, renamed over `dest` when complete.
fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
}

fn persist(staging: &Path, dest: &Path) -> Result<(), CacheError> {
    fs::rename(staging, dest).map_err(|e| {
        let _ = fs::remove_file(staging);
        CacheError::io(dest, e)
    })
}

fn stage_copy(source: &Path, dest: &Path) -> Result<(), CacheError> {
    let staging = staging_path(dest);
    if let Err(e) = fs::copy(source, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(CacheError::io(source, e));
    }
    persist(&staging, dest)
}

fn stage_encode(img: &DynamicImage, dest: &Path, jpeg_quality: u8) -> Result<(), CacheError> {
    let format = ImageFormat::from_path(dest)?;
    let staging = staging_path(dest);

    let written = write_encoded(img, &staging, format, jpeg_quality);
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    persist(&staging, dest)
}

fn write_encoded(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<(), CacheError> {
    let file = File::create(path).map_err(|e| CacheError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
            rgb.write_with_encoder(encoder)?;
        }
        other => img.write_to(&mut writer, other)?,
    }

    writer.flush().map_err(|e| CacheError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn write_image(root: &Path, rel: &str, width: u32, height: u32) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(&path).unwrap();
        path
    }

    fn setup(max_w: u32, max_h: u32) -> (TempDir, ImageCache) {
        let temp_dir = TempDir::new().unwrap();
        let photos = temp_dir.path().join("photos");
        fs::create_dir_all(&photos).unwrap();
        let config =
            CacheConfig::new(&photos, temp_dir.path().join("cache")).with_bounds(max_w, max_h);
        let cache = ImageCache::new(config).unwrap();
        (temp_dir, cache)
    }

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn test_small_image_copied_verbatim() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(100, 100);
        let source = write_image(&cache.config().photo_root, "small.png", 40, 30);

        let r = cache.ensure_cached(&rel("small.png"));
        assert_eq!(r.url(), "/cache/small.png");

        let cached = fs::read(cache.cached_path(&rel("small.png")))?;
        assert_eq!(cached, fs::read(source)?);
        assert_eq!(cache.stats().copies, 1);
        Ok(())
    }

    #[test]
    fn test_oversized_image_resized_with_aspect() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(100, 100);
        write_image(&cache.config().photo_root, "wide.png", 400, 200);

        let outcome = cache.try_cache(&rel("wide.png"))?;
        assert_eq!(outcome, CacheOutcome::Resized { width: 100, height: 50 });

        let (w, h) = image::image_dimensions(cache.cached_path(&rel("wide.png")))?;
        assert!(w <= 100 && h <= 100);
        assert_eq!((w, h), (100, 50));
        Ok(())
    }

    #[test]
    fn test_jpeg_output_reencoded() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(64, 64);
        write_image(&cache.config().photo_root, "nested/dir/tall.jpg", 90, 180);

        let r = cache.ensure_cached(&rel("nested/dir/tall.jpg"));
        assert!(r.is_cached());
        assert_eq!(r.url(), "/cache/nested/dir/tall.jpg");

        let (w, h) = image::image_dimensions(cache.cached_path(&rel("nested/dir/tall.jpg")))?;
        assert_eq!((w, h), (32, 64));
        Ok(())
    }

    /// A JPEG whose EXIF block says "rotate 90° clockwise" (orientation 6).
    fn write_rotated_jpeg(root: &Path, rel: &str, width: u32, height: u32) -> PathBuf {
        let mut encoded = Vec::new();
        RgbImage::from_pixel(width, height, Rgb([200, 40, 40]))
            .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, 90))
            .unwrap();

        let tiff: [u8; 26] = [
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, // header, IFD0 at 8
            0x00, 0x01, // one entry
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // no next IFD
        ];
        let mut app1 = vec![0xFF, 0xE1];
        app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&tiff);

        // Right after SOI
        let mut bytes = encoded[..2].to_vec();
        bytes.extend_from_slice(&app1);
        bytes.extend_from_slice(&encoded[2..]);

        let path = root.join(rel);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_exif_orientation_applied() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(50, 50);
        write_rotated_jpeg(&cache.config().photo_root, "portrait.jpg", 200, 100);

        let outcome = cache.try_cache(&rel("portrait.jpg"))?;
        assert_eq!(outcome, CacheOutcome::Resized { width: 25, height: 50 });

        let dims = image::image_dimensions(cache.cached_path(&rel("portrait.jpg")))?;
        assert_eq!(dims, (25, 50));
        Ok(())
    }

    #[test]
    fn test_second_call_is_a_hit() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(50, 50);
        write_image(&cache.config().photo_root, "big.png", 200, 100);

        cache.ensure_cached(&rel("big.png"));
        let first = fs::read(cache.cached_path(&rel("big.png")))?;
        cache.ensure_cached(&rel("big.png"));
        let second = fs::read(cache.cached_path(&rel("big.png")))?;

        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!(stats.resizes, 1);
        assert_eq!(stats.hits, 1);
        Ok(())
    }

    #[test]
    fn test_existing_cache_file_is_never_revalidated() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(50, 50);
        write_image(&cache.config().photo_root, "a.png", 10, 10);
        cache.ensure_cached(&rel("a.png"));

        // Replace the source; the stale copy keeps being served
        write_image(&cache.config().photo_root, "a.png", 20, 20);
        assert_eq!(cache.try_cache(&rel("a.png"))?, CacheOutcome::Hit);
        let (w, _) = image::image_dimensions(cache.cached_path(&rel("a.png")))?;
        assert_eq!(w, 10);
        Ok(())
    }

    #[test]
    fn test_missing_source_falls_back_to_original() {
        let (_tmp, cache) = setup(50, 50);

        let r = cache.ensure_cached(&rel("ghost.jpg"));
        assert_eq!(r, ServableRef::Original(rel("ghost.jpg")));
        assert_eq!(r.url(), "/photos/ghost.jpg");
        assert_eq!(cache.stats().fallbacks, 1);
    }

    #[test]
    fn test_corrupt_source_falls_back_to_original() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(50, 50);
        fs::write(cache.config().photo_root.join("broken.jpg"), b"not really a jpeg")?;

        let r = cache.ensure_cached(&rel("broken.jpg"));
        assert!(!r.is_cached());
        assert!(!cache.cached_path(&rel("broken.jpg")).exists());
        Ok(())
    }

    #[test]
    fn test_ensure_cached_path_requires_photo_root() {
        let (tmp, cache) = setup(50, 50);
        write_image(&cache.config().photo_root, "x.png", 5, 5);

        let inside = cache.config().photo_root.join("x.png");
        assert_eq!(cache.ensure_cached_path(&inside).unwrap().url(), "/cache/x.png");

        let outside = tmp.path().join("elsewhere.png");
        assert!(cache.ensure_cached_path(&outside).is_err());
    }

    #[test]
    fn test_no_staging_files_left_behind() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(50, 50);
        write_image(&cache.config().photo_root, "d/a.png", 10, 10);
        write_image(&cache.config().photo_root, "d/b.png", 100, 100);
        cache.ensure_cached(&rel("d/a.png"));
        cache.ensure_cached(&rel("d/b.png"));

        let names: Vec<String> = fs::read_dir(cache.config().cache_root.join("d"))?
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "unexpected entries: {:?}", names);
        assert!(names.iter().all(|n| !n.ends_with(".part")));
        Ok(())
    }

    #[test]
    fn test_concurrent_first_requests() -> anyhow::Result<()> {
        let (_tmp, cache) = setup(64, 64);
        write_image(&cache.config().photo_root, "race.png", 256, 128);
        let cache = Arc::new(cache);

        let mut handles = vec![];
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || cache.ensure_cached(&rel("race.png"))));
        }

        for handle in handles {
            assert!(handle.join().unwrap().is_cached());
        }

        let (w, h) = image::image_dimensions(cache.cached_path(&rel("race.png")))?;
        assert_eq!((w, h), (64, 32));
        Ok(())
    }
}
