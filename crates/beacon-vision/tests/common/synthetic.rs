use beacon_vision::ColorImage;

pub const TARGET: [u8; 3] = [40, 200, 80];
pub const GRAY: [u8; 3] = [128, 128, 128];

/// Solid `fg` disk of `radius` centered at `(cx, cy)` on a `bg` background.
pub fn disk(width: u32, height: u32, cx: i32, cy: i32, radius: i32, fg: [u8; 3], bg: [u8; 3]) -> ColorImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    ColorImage::from_fn(width, height, |x, y| {
        let dx = x as i32 - cx;
        let dy = y as i32 - cy;
        if dx * dx + dy * dy <= radius * radius { fg } else { bg }
    })
    .expect("synthetic image")
}

pub fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> ColorImage {
    ColorImage::from_fn(width, height, |_, _| rgb).expect("synthetic image")
}
