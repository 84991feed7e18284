use beacon_proto::frame::RawFrame;

use crate::DetectError;

/// Fixed-size RGB frame, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ColorImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DetectError> {
        if width == 0 || height == 0 {
            return Err(DetectError::EmptyImage { width, height });
        }
        let need = width as usize * height as usize * 3;
        if data.len() != need {
            return Err(DetectError::ShortBuffer { need, got: data.len() });
        }
        Ok(Self { width, height, data })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Result<Self, DetectError> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Materialize a decoder frame (packed `0x00RRGGBB` words).
    pub fn from_raw(frame: &RawFrame<'_>) -> Result<Self, DetectError> {
        let (w, h) = (frame.width, frame.height);
        if w == 0 || h == 0 {
            return Err(DetectError::EmptyImage { width: w, height: h });
        }
        if frame.stride < w as usize {
            return Err(DetectError::BadStride { stride: frame.stride, width: w });
        }
        let need = frame.offset + (h as usize - 1) * frame.stride + w as usize;
        if frame.pixels.len() < need {
            return Err(DetectError::ShortBuffer { need, got: frame.pixels.len() });
        }

        let mut data = Vec::with_capacity(w as usize * h as usize * 3);
        for row in 0..h as usize {
            let start = frame.offset + row * frame.stride;
            for &px in &frame.pixels[start..start + w as usize] {
                data.push((px >> 16) as u8);
                data.push((px >> 8) as u8);
                data.push(px as u8);
            }
        }
        Ok(Self { width: w, height: h, data })
    }

    pub fn from_rgb8(img: &image::RgbImage) -> Result<Self, DetectError> {
        Self::new(img.width(), img.height(), img.as_raw().clone())
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    pub fn as_raw(&self) -> &[u8] { &self.data }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}
