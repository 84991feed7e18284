use beacon_proto::detection::DetectionResult;
use image::{Rgb, RgbImage};

use crate::frame::ColorImage;

/// Processed-video view: density mapped to hue/saturation over the frame's
/// grayscale luminance, frame center marked white, target circled.
pub fn render(image: &ColorImage, density: &[f32], result: &DetectionResult) -> RgbImage {
    let (w, h) = (image.width(), image.height());
    let max = density.iter().cloned().fold(0.0f32, f32::max);

    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let [r, g, b] = image.pixel(x, y);
            let gray = (0.21 * r as f32 + 0.71 * g as f32 + 0.07 * b as f32) / 255.0;
            let d = density.get((y * w + x) as usize).copied().unwrap_or(0.0);
            let v = if max > 0.0 { d / max } else { 0.0 };
            out.put_pixel(x, y, Rgb(hsb_to_rgb(v, v, gray.min(1.0))));
        }
    }

    out.put_pixel(w / 2, h / 2, Rgb([255, 255, 255]));

    if result.found {
        draw_circle(&mut out, result.x, result.y, result.extent / 4.0, Rgb([255, 255, 255]));
    }
    out
}

fn hsb_to_rgb(hue: f32, sat: f32, bri: f32) -> [u8; 3] {
    let v = (bri * 255.0 + 0.5) as u8;
    if sat == 0.0 {
        return [v, v, v];
    }
    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = (bri * (1.0 - sat) * 255.0 + 0.5) as u8;
    let q = (bri * (1.0 - sat * f) * 255.0 + 0.5) as u8;
    let t = (bri * (1.0 - sat * (1.0 - f)) * 255.0 + 0.5) as u8;
    match h as u32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

fn draw_circle(img: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb<u8>) {
    if radius < 0.5 { return; }
    let steps = ((radius * std::f64::consts::TAU).ceil() as usize).max(8);
    for i in 0..steps {
        let a = i as f64 / steps as f64 * std::f64::consts::TAU;
        let x = (cx + radius * a.cos()).round();
        let y = (cy + radius * a.sin()).round();
        if x >= 0.0 && y >= 0.0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsb_matches_primary_hues() {
        assert_eq!(hsb_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsb_to_rgb(1.0 / 3.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsb_to_rgb(0.5, 0.0, 0.5), [128, 128, 128]);
    }

    #[test]
    fn overlay_marks_center_and_target() {
        let img = ColorImage::from_fn(64, 48, |_, _| [0, 0, 0]).unwrap();
        let density = vec![0.0f32; 64 * 48];
        let res = DetectionResult { found: true, x: 20.0, y: 20.0, extent: 40.0 };
        let out = render(&img, &density, &res);
        assert_eq!(out.dimensions(), (64, 48));
        assert_eq!(out.get_pixel(32, 24), &Rgb([255, 255, 255]));
        // radius extent/4 = 10 → (30, 20) lies on the circle
        assert_eq!(out.get_pixel(30, 20), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(20, 20), &Rgb([0, 0, 0]));
    }
}
