use beacon_proto::detection::DetectionResult;
use beacon_proto::frame::RawFrame;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::detector::ColorDetector;
use crate::frame::ColorImage;
use crate::gate::FrameGate;
use crate::profile::TargetProfile;
use crate::DetectorConfig;

/// Frame-callback side of the loop: rate-limits incoming frames, runs the
/// detector and publishes the latest result into a single-slot cell.
///
/// Runs on the vehicle's video thread; never blocks on the control loop.
pub struct FramePipeline {
    gate: FrameGate,
    detector: ColorDetector,
    profile: watch::Receiver<TargetProfile>,
    results: watch::Sender<DetectionResult>,
    snapshot: Option<watch::Sender<Option<ColorImage>>>,
}

impl FramePipeline {
    pub fn new(
        cfg: DetectorConfig,
        profile: watch::Receiver<TargetProfile>,
        results: watch::Sender<DetectionResult>,
    ) -> Self {
        Self {
            gate: FrameGate::new(cfg.frame_skip),
            detector: ColorDetector::new(cfg),
            profile,
            results,
            snapshot: None,
        }
    }

    /// Also publish each detected frame, e.g. for the overlay writer.
    pub fn with_snapshots(mut self, tx: watch::Sender<Option<ColorImage>>) -> Self {
        self.snapshot = Some(tx);
        self
    }

    pub fn on_frame(&mut self, frame: &RawFrame<'_>) {
        if !self.gate.admit() { return; }

        let image = match ColorImage::from_raw(frame) {
            Ok(img) => img,
            Err(e) => {
                warn!("vision: dropping frame: {}", e);
                self.results.send_replace(DetectionResult::none());
                return;
            }
        };
        let profile = *self.profile.borrow();

        match self.detector.detect(&image, &profile) {
            Ok(res) => {
                self.results.send_replace(res);
            }
            Err(e) => {
                // publish "not found" rather than leave stale coordinates behind
                warn!("vision: detection rejected frame: {}", e);
                self.results.send_replace(DetectionResult::none());
            }
        }

        if let Some(tx) = &self.snapshot {
            tx.send_replace(Some(image));
        }
        debug!("vision: frames seen={} detected={}", self.gate.seen(), self.gate.admitted());
    }

    pub fn detector(&self) -> &ColorDetector { &self.detector }
}
