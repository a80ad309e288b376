//! Packed RGB camera frames.

/// One captured image, 8-bit RGB, row-major, no padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width:  usize,
    pub height: usize,
    pub rgb:    Vec<u8>,
}

impl Frame {
    /// `None` unless `rgb` holds exactly `width * height * 3` bytes.
    pub fn from_rgb(width: usize, height: usize, rgb: Vec<u8>) -> Option<Self> {
        (rgb.len() == width * height * 3).then_some(Frame { width, height, rgb })
    }

    pub fn filled(width: usize, height: usize, color: [u8; 3]) -> Self {
        Frame { width, height, rgb: color.repeat(width * height) }
    }

    pub fn is_empty(&self) -> bool { self.width == 0 || self.height == 0 }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height { return None; }
        let i = (y * self.width + x) * 3;
        Some([self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]])
    }

    /// Flip left↔right in place, giving a selfie view where moving the
    /// hand right moves it right on screen.
    pub fn mirror(&mut self) {
        let row_len = self.width * 3;
        if row_len == 0 { return; }
        for row in self.rgb.chunks_exact_mut(row_len) {
            for x in 0..self.width / 2 {
                let (a, b) = (x * 3, (self.width - 1 - x) * 3);
                for c in 0..3 {
                    row.swap(a + c, b + c);
                }
            }
        }
    }

    pub fn mirrored(mut self) -> Self {
        self.mirror();
        self
    }

    /// `0xFFRRGGBB` pixels for a `minifb` buffer.
    pub fn to_argb(&self) -> Vec<u32> {
        self.rgb
            .chunks_exact(3)
            .map(|p| 0xFF00_0000 | (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32)
            .collect()
    }
}
