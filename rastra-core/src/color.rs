//! Linear RGBA color

use serde::{Deserialize, Serialize};

/// An RGBA color with each channel in [0, 1], linear, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque gray of the given intensity
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a hex color: "rgb", "rgba", "rrggbb" or "rrggbbaa", with an
    /// optional leading '#'. Unparseable input yields black.
    pub fn hex(s: &str) -> Self {
        let s = s.trim_start_matches('#');
        if !s.is_ascii() {
            return Self::BLACK;
        }
        let nibble = |i: usize| u8::from_str_radix(&s[i..i + 1], 16).unwrap_or(0) * 17;
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).unwrap_or(0);
        match s.len() {
            3 => Self::from_rgba8(nibble(0), nibble(1), nibble(2), 255),
            4 => Self::from_rgba8(nibble(0), nibble(1), nibble(2), nibble(3)),
            6 => Self::from_rgba8(byte(0), byte(2), byte(4), 255),
            8 => Self::from_rgba8(byte(0), byte(2), byte(4), byte(6)),
            _ => Self::BLACK,
        }
    }

    /// Convert to 8-bit non-premultiplied RGBA, clamping to [0, 1]
    pub fn to_rgba8(self) -> [u8; 4] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }

    /// Pack into a little-endian RGBA8 word for the framebuffer
    pub fn pack(self) -> u32 {
        u32::from_le_bytes(self.to_rgba8())
    }

    /// Inverse of [`Color::pack`]
    pub fn unpack(word: u32) -> Self {
        let [r, g, b, a] = word.to_le_bytes();
        Self::from_rgba8(r, g, b, a)
    }

    pub fn add(self, o: Color) -> Self {
        Self::new(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }

    /// Componentwise product
    pub fn mul(self, o: Color) -> Self {
        Self::new(self.r * o.r, self.g * o.g, self.b * o.b, self.a * o.a)
    }

    pub fn mul_scalar(self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }

    pub fn div_scalar(self, s: f32) -> Self {
        Self::new(self.r / s, self.g / s, self.b / s, self.a / s)
    }

    /// Componentwise minimum
    pub fn min(self, o: Color) -> Self {
        Self::new(
            self.r.min(o.r),
            self.g.min(o.g),
            self.b.min(o.b),
            self.a.min(o.a),
        )
    }

    pub fn lerp(self, o: Color, t: f32) -> Self {
        self.add(o.add(self.mul_scalar(-1.0)).mul_scalar(t))
    }

    /// Same color with the alpha channel replaced
    pub fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Straight-alpha "source over destination" compositing
    pub fn over(self, dst: Color) -> Self {
        let ia = 1.0 - self.a;
        Self::new(
            self.r * self.a + dst.r * ia,
            self.g * self.a + dst.g * ia,
            self.b * self.a + dst.b * ia,
            self.a + dst.a * ia,
        )
    }
}
