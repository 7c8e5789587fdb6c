//! 2D texture sampling

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};

/// How texture coordinates outside [0, 1] are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Repeat by taking the fractional part of the coordinate
    #[default]
    Repeat,
    /// Clamp to the edge texel
    Clamp,
}

/// A 2D nearest-texel sampler over non-premultiplied RGBA8 data.
///
/// Rows are stored top to bottom (image order); the V axis is flipped at
/// sample time so that UV (0, 0) addresses the bottom-left of the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Texture {
    width: usize,
    height: usize,
    data: Vec<[u8; 4]>,
    pub wrap: WrapMode,
}

impl Texture {
    /// Build a texture from row-major RGBA8 texels (top row first).
    pub fn from_texels(width: usize, height: usize, data: Vec<[u8; 4]>) -> Result<Self> {
        if data.len() != width * height || width == 0 || height == 0 {
            return Err(Error::InvalidData(format!(
                "texture data length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            wrap: WrapMode::Repeat,
        })
    }

    /// Build a texture from linear colors (top row first).
    pub fn from_colors(width: usize, height: usize, colors: &[Color]) -> Result<Self> {
        Self::from_texels(width, height, colors.iter().map(|c| c.to_rgba8()).collect())
    }

    /// A checkerboard of `cell`-sized squares alternating between two colors.
    pub fn checkerboard(width: usize, height: usize, cell: usize, a: Color, b: Color) -> Self {
        let cell = cell.max(1);
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                data.push(if even { a.to_rgba8() } else { b.to_rgba8() });
            }
        }
        Self {
            width,
            height,
            data,
            wrap: WrapMode::Repeat,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample the nearest texel at (u, v).
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let (u, v) = match self.wrap {
            WrapMode::Repeat => (u - u.floor(), v - v.floor()),
            WrapMode::Clamp => (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
        };
        // UV origin is bottom-left, image origin is top-left.
        let v = 1.0 - v;
        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);
        let [r, g, b, a] = self.data[y * self.width + x];
        Color::from_rgba8(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_texels_validates_length() {
        assert!(Texture::from_texels(2, 2, vec![[0; 4]; 3]).is_err());
        assert!(Texture::from_texels(2, 2, vec![[0; 4]; 4]).is_ok());
    }

    #[test]
    fn test_sample_corners_with_v_flip() {
        // Top row: red, green. Bottom row: blue, white.
        let t = Texture::from_colors(
            2,
            2,
            &[Color::RED, Color::GREEN, Color::BLUE, Color::WHITE],
        )
        .unwrap();
        // UV (0,0) is the bottom-left texel.
        assert_eq!(t.sample(0.25, 0.25), Color::BLUE);
        assert_eq!(t.sample(0.75, 0.25), Color::WHITE);
        assert_eq!(t.sample(0.25, 0.75), Color::RED);
        assert_eq!(t.sample(0.75, 0.75), Color::GREEN);
    }

    #[test]
    fn test_repeat_wrap() {
        let t = Texture::from_colors(
            2,
            2,
            &[Color::RED, Color::GREEN, Color::BLUE, Color::WHITE],
        )
        .unwrap();
        assert_eq!(t.sample(1.25, 1.25), t.sample(0.25, 0.25));
        assert_eq!(t.sample(-0.75, 0.25), t.sample(0.25, 0.25));
    }

    #[test]
    fn test_clamp_wrap() {
        let mut t = Texture::from_colors(
            2,
            2,
            &[Color::RED, Color::GREEN, Color::BLUE, Color::WHITE],
        )
        .unwrap();
        t.wrap = WrapMode::Clamp;
        assert_eq!(t.sample(5.0, -5.0), t.sample(0.99, 0.01));
    }

    #[test]
    fn test_exact_edge_coordinates() {
        let t = Texture::checkerboard(4, 4, 1, Color::BLACK, Color::WHITE);
        // u=1, v=1 must not index out of bounds.
        let _ = t.sample(1.0, 1.0);
        let _ = t.sample(0.0, 0.0);
    }
}
