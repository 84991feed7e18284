pub mod detector;
pub mod frame;
pub mod gate;
pub mod kernel;
pub mod overlay;
pub mod pipeline;
pub mod profile;

use serde::Deserialize;

pub use crate::detector::{chromaticity_distance, ColorDetector};
pub use crate::frame::ColorImage;
pub use crate::profile::{ProfileError, ProfileField, TargetProfile};

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("frame buffer too short: need {need} words, got {got}")]
    ShortBuffer { need: usize, got: usize },

    #[error("frame stride {stride} smaller than width {width}")]
    BadStride { stride: usize, width: u32 },

    #[error("target profile is not usable: {0}")]
    Profile(#[from] ProfileError),
}

/// Per-deployment detector constants. None of these are operator-tunable at
/// runtime; the live knobs live in [`TargetProfile`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub frame_width: u32,
    pub frame_height: u32,

    /// Radius of the uniform disk used to smooth the match mask.
    pub kernel_radius: u32,

    /// Pixels farther than `fov_fraction * frame_width` from the image center
    /// never match (lens corners are too distorted).
    pub fov_fraction: f64,

    /// `extent = max(1, extent_scale * sqrt(total_density))`
    pub extent_scale: f64,
    /// `found` iff `extent > found_floor`
    pub found_floor: f64,

    /// Only every Nth arriving frame is run through the detector.
    pub frame_skip: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 240,
            kernel_radius: 10,
            fov_fraction: 0.5,
            extent_scale: 3.0,
            found_floor: 10.0,
            frame_skip: 3,
        }
    }
}
