/// Straight 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale every channel, alpha included, by `factor` (saturating).
    pub fn scaled(self, factor: f32) -> Self {
        let s = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::rgba(s(self.r), s(self.g), s(self.b), s(self.a))
    }
}

/// Rectangle in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// Where objects paint themselves. A renderer implements this over its
/// sprite batch; tests implement it over a `Vec`.
pub trait DrawTarget {
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba);
}

impl DrawTarget for Vec<(PixelRect, Rgba)> {
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        self.push((rect, color));
    }
}
