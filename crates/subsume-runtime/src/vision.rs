//! Red-pixel classification for camera frames.
//!
//! A frame is reduced to a single ratio: the fraction of pixels whose RGB
//! value falls inside a fixed per-channel [`ColorRange`].  The default range
//! is the red band the robot's target markers were calibrated against.

use subsume_hal::CameraFrame;

/// Inclusive per-channel RGB bounds for pixel classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRange {
    /// Lower bound per channel, inclusive.
    pub lower: [u8; 3],
    /// Upper bound per channel, inclusive.
    pub upper: [u8; 3],
}

impl ColorRange {
    /// `true` if `(r, g, b)` lies inside the range on every channel.
    pub fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        let [lr, lg, lb] = self.lower;
        let [ur, ug, ub] = self.upper;
        (lr..=ur).contains(&r) && (lg..=ug).contains(&g) && (lb..=ub).contains(&b)
    }
}

impl Default for ColorRange {
    /// The red band used for target markers: strong red channel, low green
    /// and blue.
    fn default() -> Self {
        Self {
            lower: [155, 25, 0],
            upper: [255, 100, 100],
        }
    }
}

/// Fraction of `frame`'s pixels classified inside `range`, in `[0, 1]`.
///
/// The denominator is the frame's nominal pixel count; a trailing partial
/// pixel in a malformed buffer is ignored.  An empty frame yields 0.0.
pub fn red_ratio(frame: &CameraFrame, range: &ColorRange) -> f32 {
    let total = frame.pixel_count();
    if total == 0 {
        return 0.0;
    }
    let matched = frame
        .data
        .chunks_exact(3)
        .filter(|px| range.contains(px[0], px[1], px[2]))
        .count();
    (matched as f32 / total as f32).clamp(0.0, 1.0)
}
