//! Per-vertex attributes and attribute interpolation

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::point::{Point3f, Vector2f, Vector3f, Vector4f};

/// A mesh vertex with the full attribute set carried through the pipeline.
///
/// `output` is the homogeneous clip-space position populated by the vertex
/// stage of a shader; it is meaningless before that stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3f,
    pub normal: Vector3f,
    pub texcoord: Vector2f,
    pub color: Color,
    pub output: Vector4f,
}

impl Vertex {
    pub fn new(position: Point3f, normal: Vector3f, texcoord: Vector2f, color: Color) -> Self {
        Self {
            position,
            normal,
            texcoord,
            color,
            output: Vector4f::zeros(),
        }
    }

    pub fn from_position(position: Point3f) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// True when the clip-space output lies outside the visible volume.
    ///
    /// A point is visible iff |x|, |y|, |z| are all <= w.
    pub fn outside(&self) -> bool {
        let (x, y, z, w) = (self.output.x, self.output.y, self.output.z, self.output.w);
        x < -w || x > w || y < -w || y > w || z < -w || z > w
    }

    /// Linearly interpolate every attribute toward `other`.
    ///
    /// Used for clip-plane intersections, where all attributes (including
    /// the clip-space output) vary linearly along the edge.
    pub fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal.lerp(&other.normal, t),
            texcoord: self.texcoord.lerp(&other.texcoord, t),
            color: self.color.lerp(other.color, t),
            output: self.output.lerp(&other.output, t),
        }
    }

    /// Blend three vertices with weights (b.x, b.y, b.z), scaled by b.w.
    ///
    /// The rasterizer passes perspective-corrected barycentric weights here:
    /// b.k = bary_k / w_k and b.w = 1 / (b.x + b.y + b.z).
    pub fn interpolate(v0: &Vertex, v1: &Vertex, v2: &Vertex, b: Vector4f) -> Vertex {
        let blend3 = |a: Vector3f, c: Vector3f, d: Vector3f| (a * b.x + c * b.y + d * b.z) * b.w;
        let position = blend3(v0.position.coords, v1.position.coords, v2.position.coords);
        let normal = blend3(v0.normal, v1.normal, v2.normal);
        let texcoord = (v0.texcoord * b.x + v1.texcoord * b.y + v2.texcoord * b.z) * b.w;
        let color = v0
            .color
            .mul_scalar(b.x)
            .add(v1.color.mul_scalar(b.y))
            .add(v2.color.mul_scalar(b.z))
            .mul_scalar(b.w);
        let output = (v0.output * b.x + v1.output * b.y + v2.output * b.z) * b.w;
        Vertex {
            position: Point3f::from(position),
            normal: normal.normalize(),
            texcoord,
            color,
            output,
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            normal: Vector3f::zeros(),
            texcoord: Vector2f::zeros(),
            color: Color::WHITE,
            output: Vector4f::zeros(),
        }
    }
}
