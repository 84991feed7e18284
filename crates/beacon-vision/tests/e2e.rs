mod common;

use common::synthetic::{disk, uniform, GRAY, TARGET};
use beacon_vision::{ColorDetector, DetectorConfig, TargetProfile};

fn profile() -> TargetProfile {
    TargetProfile::from_rgb(TARGET, 0.06, 0.5)
}

#[test]
fn finds_disk_centroid_on_qvga_frame() {
    let image = disk(320, 240, 200, 100, 40, TARGET, GRAY);
    let mut detector = ColorDetector::new(DetectorConfig::default());
    let res = detector.detect(&image, &profile()).unwrap();

    assert!(res.found, "expected target, got {:?}", res);
    assert!((res.x - 200.0).abs() <= 2.0, "x={:.2}", res.x);
    assert!((res.y - 100.0).abs() <= 2.0, "y={:.2}", res.y);
    assert!(res.extent > 10.0, "extent={:.2}", res.extent);
}

#[test]
fn uniform_gray_frame_has_no_target() {
    let image = uniform(320, 240, GRAY);
    let mut detector = ColorDetector::new(DetectorConfig::default());
    let res = detector.detect(&image, &profile()).unwrap();
    assert!(!res.found);
    assert_eq!(res.extent, 0.0);
}

#[test]
fn target_is_found_under_different_lighting() {
    let dim = [TARGET[0] / 2, TARGET[1] / 2, TARGET[2] / 2];
    let image = disk(320, 240, 160, 120, 30, dim, GRAY);
    let mut detector = ColorDetector::new(DetectorConfig::default());
    let res = detector.detect(&image, &profile()).unwrap();
    assert!(res.found);
    assert!((res.x - 160.0).abs() <= 1.0 && (res.y - 120.0).abs() <= 1.0);
}

#[test]
fn speckle_below_convolution_threshold_is_rejected() {
    // isolated matching pixels every 8px: local density ~ 5/317, far below 0.5
    let image = beacon_vision::ColorImage::from_fn(320, 240, |x, y| {
        if x % 8 == 0 && y % 8 == 0 { TARGET } else { GRAY }
    })
    .unwrap();
    let mut detector = ColorDetector::new(DetectorConfig::default());
    let res = detector.detect(&image, &profile()).unwrap();
    assert!(!res.found);
}

#[test]
fn center_density_grows_with_disk_size() {
    let p = TargetProfile { convolution_threshold: 0.0, ..profile() };
    let mut detector = ColorDetector::new(DetectorConfig::default());
    let mut last = 0.0f32;
    let mut last_extent = 0.0f64;
    for radius in 0..=14 {
        let image = disk(320, 240, 160, 120, radius, TARGET, GRAY);
        let res = detector.detect(&image, &p).unwrap();
        let center = detector.density()[120 * 320 + 160];
        assert!(center >= last, "radius {}: {} < {}", radius, center, last);
        assert!(center <= 1.0);
        assert!(res.extent >= last_extent);
        last = center;
        last_extent = res.extent;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn extent_is_monotonic_in_target_size() {
    let mut detector = ColorDetector::new(DetectorConfig::default());
    let small = detector.detect(&disk(320, 240, 160, 120, 20, TARGET, GRAY), &profile()).unwrap();
    let large = detector.detect(&disk(320, 240, 160, 120, 50, TARGET, GRAY), &profile()).unwrap();
    assert!(small.found && large.found);
    assert!(large.extent > small.extent);
}
