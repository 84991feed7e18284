/// Uniform circular smoothing kernel, stored as a tap list so the detector
/// never rebuilds the disk per frame.
#[derive(Debug, Clone)]
pub struct DiskKernel {
    radius: i32,
    taps: Vec<(i32, i32)>,
    // linear offsets for the current row stride; valid only away from borders
    offsets: Vec<isize>,
    stride: usize,
}

impl DiskKernel {
    pub fn new(radius: u32) -> Self {
        let r = radius as i32;
        let mut taps = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    taps.push((dx, dy));
                }
            }
        }
        Self { radius: r, taps, offsets: Vec::new(), stride: 0 }
    }

    pub fn radius(&self) -> u32 { self.radius as u32 }

    pub fn len(&self) -> usize { self.taps.len() }

    pub fn is_empty(&self) -> bool { self.taps.is_empty() }

    pub fn taps(&self) -> &[(i32, i32)] { &self.taps }

    /// Recompute linear offsets when the frame width changes.
    pub fn bind_stride(&mut self, stride: usize) {
        if stride == self.stride && !self.offsets.is_empty() { return; }
        self.stride = stride;
        self.offsets = self
            .taps
            .iter()
            .map(|&(dx, dy)| dy as isize * stride as isize + dx as isize)
            .collect();
    }

    /// Count of set cells under the kernel centered at `(x, y)`.
    ///
    /// Taps that fall outside the `w`x`h` grid read the nearest in-bounds
    /// cell (edge clamp). `bind_stride(w)` must have been called.
    pub fn hits(&self, mask: &[u8], w: usize, h: usize, x: usize, y: usize) -> u32 {
        let r = self.radius as usize;
        let interior = x >= r && y >= r && x + r < w && y + r < h;
        if interior {
            let center = (y * w + x) as isize;
            return self
                .offsets
                .iter()
                .map(|&off| mask[(center + off) as usize] as u32)
                .sum();
        }

        let (xi, yi) = (x as i32, y as i32);
        let (wi, hi) = (w as i32, h as i32);
        self.taps
            .iter()
            .map(|&(dx, dy)| {
                let xx = (xi + dx).clamp(0, wi - 1) as usize;
                let yy = (yi + dy).clamp(0, hi - 1) as usize;
                mask[yy * w + xx] as u32
            })
            .sum()
    }
}
