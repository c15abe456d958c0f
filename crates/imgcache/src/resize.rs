//! Bounding-box math for downscaling.

/// Largest size with the same aspect ratio that fits in `max_w × max_h`.
///
/// Never upscales: a source already inside the box is returned unchanged.
/// Each output dimension is at least 1.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let scale = f64::min(
        max_w as f64 / width as f64,
        max_h as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Whether an image of this size needs downscaling to fit the box.
pub fn exceeds(width: u32, height: u32, max_w: u32, max_h: u32) -> bool {
    width > max_w || height > max_h
}
