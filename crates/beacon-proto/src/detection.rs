use serde::{Deserialize, Serialize};

/// Latest target estimate published by the detector.
///
/// `x`/`y` are pixel coordinates of the density-weighted centroid and are only
/// meaningful when `found` is true.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub found: bool,
    pub x: f64,
    pub y: f64,
    pub extent: f64,
}

impl DetectionResult {
    /// Zero-density convention: nothing matched anywhere in the frame.
    pub const fn none() -> Self {
        Self { found: false, x: 0.0, y: 0.0, extent: 0.0 }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        if self.found { Some((self.x, self.y)) } else { None }
    }
}
