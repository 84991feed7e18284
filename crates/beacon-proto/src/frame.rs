/// A borrowed video frame as handed over by the vehicle's decoder.
///
/// Pixels are packed `0x00RRGGBB` words. Row `j` of the frame starts at
/// `pixels[offset + j * stride]`.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u32],
    pub offset: usize,
    pub stride: usize,
}
