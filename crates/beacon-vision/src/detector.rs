use beacon_proto::detection::DetectionResult;
use tracing::debug;

use crate::frame::ColorImage;
use crate::kernel::DiskKernel;
use crate::profile::TargetProfile;
use crate::{DetectError, DetectorConfig};

const INV_SQRT3: f64 = 0.577_350_269_189_625_8;

/// Normalized chromaticity distance between one pixel and the profile.
///
/// Returns `None` for black pixels (no defined chromaticity). For any RGB
/// input and any profile with ratios in [0,1] the result is in [0,1].
pub fn chromaticity_distance(rgb: [u8; 3], profile: &TargetProfile) -> Option<f64> {
    let sum = rgb[0] as u32 + rgb[1] as u32 + rgb[2] as u32;
    if sum == 0 {
        return None;
    }
    let sum = sum as f64;
    let dr = rgb[0] as f64 / sum - profile.r;
    let dg = rgb[1] as f64 / sum - profile.g;
    let db = rgb[2] as f64 / sum - profile.b;
    Some(((dr * dr + dg * dg + db * db).sqrt() * INV_SQRT3).min(1.0))
}

/// Single-color blob detector.
///
/// Holds scratch buffers sized for the last frame; apart from those, each
/// `detect` call is a pure function of `(image, profile)`.
pub struct ColorDetector {
    cfg: DetectorConfig,
    kernel: DiskKernel,
    mask: Vec<u8>,
    density: Vec<f32>,
    width: usize,
    height: usize,
}

impl ColorDetector {
    pub fn new(cfg: DetectorConfig) -> Self {
        let kernel = DiskKernel::new(cfg.kernel_radius);
        Self { cfg, kernel, mask: Vec::new(), density: Vec::new(), width: 0, height: 0 }
    }

    pub fn config(&self) -> &DetectorConfig { &self.cfg }

    /// Smoothed, thresholded density of the last processed frame.
    pub fn density(&self) -> &[f32] { &self.density }

    pub fn detect(&mut self, image: &ColorImage, profile: &TargetProfile) -> Result<DetectionResult, DetectError> {
        profile.validate()?;
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w == 0 || h == 0 {
            return Err(DetectError::EmptyImage { width: image.width(), height: image.height() });
        }
        self.resize(w, h);

        let matched = self.match_pixels(image, profile);
        self.smooth(profile.convolution_threshold);
        let result = self.locate();

        debug!(
            "vision: matched={} found={} x={:.1} y={:.1} extent={:.1}",
            matched, result.found, result.x, result.y, result.extent
        );
        Ok(result)
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.mask = vec![0; w * h];
            self.density = vec![0.0; w * h];
        }
        self.kernel.bind_stride(w);
    }

    fn match_pixels(&mut self, image: &ColorImage, profile: &TargetProfile) -> usize {
        let (w, h) = (self.width, self.height);
        let cx = w as f64 / 2.0;
        let cy = h as f64 / 2.0;
        let fov = self.cfg.fov_fraction * w as f64;
        let fov_sq = fov * fov;

        let raw = image.as_raw();
        let mut matched = 0;
        for y in 0..h {
            let dy = y as f64 - cy;
            for x in 0..w {
                let i = y * w + x;
                let dx = x as f64 - cx;
                let in_view = dx * dx + dy * dy <= fov_sq;
                let px = [raw[i * 3], raw[i * 3 + 1], raw[i * 3 + 2]];
                let hit = in_view
                    && chromaticity_distance(px, profile)
                        .map(|d| d < profile.distance_threshold)
                        .unwrap_or(false);
                self.mask[i] = hit as u8;
                matched += hit as usize;
            }
        }
        matched
    }

    fn smooth(&mut self, threshold: f64) {
        let (w, h) = (self.width, self.height);
        let taps = self.kernel.len() as f32;
        let threshold = threshold as f32;
        for y in 0..h {
            for x in 0..w {
                let d = self.kernel.hits(&self.mask, w, h, x, y) as f32 / taps;
                // hard cutoff, speckle below the threshold is dropped entirely
                self.density[y * w + x] = if d < threshold { 0.0 } else { d };
            }
        }
    }

    fn locate(&self) -> DetectionResult {
        let w = self.width;
        let (mut sx, mut sy, mut total) = (0.0f64, 0.0f64, 0.0f64);
        for (i, &d) in self.density.iter().enumerate() {
            if d == 0.0 { continue; }
            let d = d as f64;
            sx += (i % w) as f64 * d;
            sy += (i / w) as f64 * d;
            total += d;
        }
        if total <= 0.0 {
            return DetectionResult::none();
        }

        let extent = (self.cfg.extent_scale * total.sqrt()).max(1.0);
        DetectionResult {
            found: extent > self.cfg.found_floor,
            x: sx / total,
            y: sy / total,
            extent,
        }
    }
}
