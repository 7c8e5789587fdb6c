//! The rasterizing device context
//!
//! A `Context` owns the color and depth buffers for one output image and
//! runs the back half of the pipeline: perspective divide, backface cull,
//! screen mapping, edge-function rasterization with the top-left fill rule,
//! perspective-correct attribute interpolation, fragment shading, depth
//! test and alpha compositing.
//!
//! Buffers are shared across worker threads. The color buffer holds packed
//! RGBA8 words and the depth buffer f32 bits, both in relaxed atomics; a
//! pixel is only committed while holding the stripe mutex for its
//! coordinates, and the depth test is re-checked under that lock. The
//! unlocked early depth read is an optimization only; correctness comes
//! from the locked re-check.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use rastra_core::{transform, Color, Line, Matrix4f, Mesh, Object, Point3f, Triangle, Vector2f, Vector3f, Vector4f, Vertex};

use crate::clip::{clip_line, clip_triangle};
use crate::shader::Shader;

const LOCK_STRIPES: usize = 256;

/// Winding order that counts as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Which faces to discard before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// The device context: framebuffer, depth buffer, draw policy and shader.
pub struct Context {
    pub width: usize,
    pub height: usize,
    pub shader: Box<dyn Shader>,
    pub clear_color: Color,
    pub read_depth: bool,
    pub write_depth: bool,
    pub write_color: bool,
    pub alpha_blend: bool,
    pub wireframe: bool,
    pub front_face: Winding,
    pub cull: CullMode,
    pub line_width: f32,
    pub depth_bias: f32,
    screen_matrix: Matrix4f,
    color: Vec<AtomicU32>,
    depth: Vec<AtomicU32>,
    locks: Vec<Mutex<()>>,
}

impl Context {
    pub fn new(width: usize, height: usize, shader: Box<dyn Shader>) -> Self {
        let len = width * height;
        let mut ctx = Self {
            width,
            height,
            shader,
            clear_color: Color::TRANSPARENT,
            read_depth: true,
            write_depth: true,
            write_color: true,
            alpha_blend: true,
            wireframe: false,
            front_face: Winding::CounterClockwise,
            cull: CullMode::Back,
            line_width: 2.0,
            depth_bias: 0.0,
            screen_matrix: transform::screen(width, height),
            color: (0..len).map(|_| AtomicU32::new(0)).collect(),
            depth: (0..len).map(|_| AtomicU32::new(0)).collect(),
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        };
        ctx.clear_depth_buffer();
        ctx
    }

    pub fn clear_color_buffer(&mut self) {
        let word = self.clear_color.pack();
        for pixel in &self.color {
            pixel.store(word, Ordering::Relaxed);
        }
    }

    pub fn clear_depth_buffer(&mut self) {
        let word = f32::INFINITY.to_bits();
        for depth in &self.depth {
            depth.store(word, Ordering::Relaxed);
        }
    }

    /// The framebuffer as row-major non-premultiplied RGBA8 bytes.
    pub fn color_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.color.len() * 4);
        for pixel in &self.color {
            bytes.extend_from_slice(&pixel.load(Ordering::Relaxed).to_le_bytes());
        }
        bytes
    }

    pub fn pixel_at(&self, x: usize, y: usize) -> [u8; 4] {
        self.color[y * self.width + x].load(Ordering::Relaxed).to_le_bytes()
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        f32::from_bits(self.depth[y * self.width + x].load(Ordering::Relaxed))
    }

    /// Draw every primitive of an object's mesh, in parallel.
    ///
    /// The object's model matrix is composed into the shader's
    /// view-projection per vertex; shader and object are read-only for the
    /// duration and the call blocks until all workers finish.
    pub fn draw_object(&self, object: &Object) {
        self.draw_mesh(&object.mesh, object);
    }

    /// Parallel fan-out of a mesh's triangles and lines across the rayon
    /// worker pool. Workers synchronize only through the pixel stripe
    /// locks; vertex processing is lock-free.
    pub fn draw_mesh(&self, mesh: &Mesh, object: &Object) {
        mesh.triangles
            .par_iter()
            .for_each(|t| self.draw_triangle(t, object));
        mesh.lines.par_iter().for_each(|l| self.draw_line(l, object));
    }

    pub fn draw_triangle(&self, t: &Triangle, object: &Object) {
        if t.is_degenerate() {
            return;
        }
        let v0 = self.shader.vertex(t.v0, &object.matrix);
        let v1 = self.shader.vertex(t.v1, &object.matrix);
        let v2 = self.shader.vertex(t.v2, &object.matrix);
        if v0.outside() || v1.outside() || v2.outside() {
            for clipped in clip_triangle(&Triangle { v0, v1, v2 }) {
                self.draw_clipped_triangle(&clipped.v0, &clipped.v1, &clipped.v2, object);
            }
        } else {
            self.draw_clipped_triangle(&v0, &v1, &v2, object);
        }
    }

    pub fn draw_line(&self, l: &Line, object: &Object) {
        let v0 = self.shader.vertex(l.v0, &object.matrix);
        let v1 = self.shader.vertex(l.v1, &object.matrix);
        if v0.outside() || v1.outside() {
            if let Some(clipped) = clip_line(&Line { v0, v1 }) {
                self.draw_clipped_line(&clipped.v0, &clipped.v1, object);
            }
        } else {
            self.draw_clipped_line(&v0, &v1, object);
        }
    }

    fn ndc(v: &Vertex) -> Vector3f {
        v.output.xyz() / v.output.w
    }

    fn is_finite(v: Vector3f) -> bool {
        v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
    }

    fn to_screen(&self, ndc: Vector3f) -> Vector3f {
        self.screen_matrix.transform_point(&Point3f::from(ndc)).coords
    }

    fn draw_clipped_triangle(&self, v0: &Vertex, v1: &Vertex, v2: &Vertex, object: &Object) {
        let ndc0 = Self::ndc(v0);
        let ndc1 = Self::ndc(v1);
        let ndc2 = Self::ndc(v2);
        if !(Self::is_finite(ndc0) && Self::is_finite(ndc1) && Self::is_finite(ndc2)) {
            return;
        }

        if self.cull != CullMode::None {
            let mut area = (ndc1.x - ndc0.x) * (ndc2.y - ndc0.y)
                - (ndc2.x - ndc0.x) * (ndc1.y - ndc0.y);
            if self.front_face == Winding::Clockwise {
                area = -area;
            }
            match self.cull {
                CullMode::Back if area <= 0.0 => return,
                CullMode::Front if area >= 0.0 => return,
                _ => {}
            }
        }

        let s0 = self.to_screen(ndc0);
        let s1 = self.to_screen(ndc1);
        let s2 = self.to_screen(ndc2);

        if self.wireframe {
            self.line(v0, v1, s0, s1, object);
            self.line(v1, v2, s1, s2, object);
            self.line(v2, v0, s2, s0, object);
        } else {
            self.rasterize(v0, v1, v2, s0, s1, s2, object);
        }
    }

    fn draw_clipped_line(&self, v0: &Vertex, v1: &Vertex, object: &Object) {
        let ndc0 = Self::ndc(v0);
        let ndc1 = Self::ndc(v1);
        if !(Self::is_finite(ndc0) && Self::is_finite(ndc1)) {
            return;
        }
        let s0 = self.to_screen(ndc0);
        let s1 = self.to_screen(ndc1);
        self.line(v0, v1, s0, s1, object);
    }

    /// Expand a screen-space segment into a quad of `line_width` pixels with
    /// flat caps extended by half the width, rasterized as two triangles.
    fn line(&self, v0: &Vertex, v1: &Vertex, s0: Vector3f, s1: Vector3f, object: &Object) {
        let dir = Vector2f::new(s1.x - s0.x, s1.y - s0.y);
        let len = dir.norm();
        if len == 0.0 || !len.is_finite() {
            return;
        }
        let half = self.line_width / 2.0;
        let axis = dir / len * half;
        let normal = Vector2f::new(-axis.y, axis.x);
        let a = Vector2f::new(s0.x - axis.x, s0.y - axis.y);
        let b = Vector2f::new(s1.x + axis.x, s1.y + axis.y);
        let a0 = Vector3f::new(a.x + normal.x, a.y + normal.y, s0.z);
        let a1 = Vector3f::new(a.x - normal.x, a.y - normal.y, s0.z);
        let b0 = Vector3f::new(b.x + normal.x, b.y + normal.y, s1.z);
        let b1 = Vector3f::new(b.x - normal.x, b.y - normal.y, s1.z);
        self.rasterize(v0, v0, v1, a0, a1, b1, object);
        self.rasterize(v0, v1, v1, a0, b1, b0, object);
    }

    /// A zero edge value counts as covered only on top and left edges, so a
    /// pixel on an edge shared by two consistently wound triangles is
    /// filled by exactly one of them. Edge vectors arrive normalized to
    /// positive orientation.
    fn is_top_left(dx: f32, dy: f32) -> bool {
        dy < 0.0 || (dy == 0.0 && dx > 0.0)
    }

    #[allow(clippy::too_many_arguments)]
    fn rasterize(
        &self,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
        s0: Vector3f,
        s1: Vector3f,
        s2: Vector3f,
        object: &Object,
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        // Signed doubled area; zero-area output of the clipper is dropped here.
        let area = (s1.x - s0.x) * (s2.y - s0.y) - (s1.y - s0.y) * (s2.x - s0.x);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let ra = 1.0 / area;
        let sign = if area < 0.0 { -1.0 } else { 1.0 };

        let min_x = s0.x.min(s1.x).min(s2.x).floor();
        let max_x = s0.x.max(s1.x).max(s2.x).ceil();
        let min_y = s0.y.min(s1.y).min(s2.y).floor();
        let max_y = s0.y.max(s1.y).max(s2.y).ceil();
        let x0 = (min_x as i64).clamp(0, self.width as i64 - 1) as usize;
        let x1 = (max_x as i64).clamp(0, self.width as i64 - 1) as usize;
        let y0 = (min_y as i64).clamp(0, self.height as i64 - 1) as usize;
        let y1 = (max_y as i64).clamp(0, self.height as i64 - 1) as usize;

        // Edge functions at the first pixel center, stepped incrementally.
        // w0 tracks edge s1->s2, w1 edge s2->s0, w2 edge s0->s1.
        let edge = |a: Vector3f, b: Vector3f, px: f32, py: f32| {
            (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
        };
        let px = x0 as f32 + 0.5;
        let py = y0 as f32 + 0.5;
        let mut w0_row = edge(s1, s2, px, py);
        let mut w1_row = edge(s2, s0, px, py);
        let mut w2_row = edge(s0, s1, px, py);
        let (w0_dx, w0_dy) = (s1.y - s2.y, s2.x - s1.x);
        let (w1_dx, w1_dy) = (s2.y - s0.y, s0.x - s2.x);
        let (w2_dx, w2_dy) = (s0.y - s1.y, s1.x - s0.x);

        let tl0 = Self::is_top_left((s2.x - s1.x) * sign, (s2.y - s1.y) * sign);
        let tl1 = Self::is_top_left((s0.x - s2.x) * sign, (s0.y - s2.y) * sign);
        let tl2 = Self::is_top_left((s1.x - s0.x) * sign, (s1.y - s0.y) * sign);

        let r0 = 1.0 / v0.output.w;
        let r1 = 1.0 / v1.output.w;
        let r2 = 1.0 / v2.output.w;

        for y in y0..=y1 {
            let mut w0 = w0_row;
            let mut w1 = w1_row;
            let mut w2 = w2_row;
            for x in x0..=x1 {
                let (e0, e1, e2) = (w0 * sign, w1 * sign, w2 * sign);
                let covered = (e0 > 0.0 || (e0 == 0.0 && tl0))
                    && (e1 > 0.0 || (e1 == 0.0 && tl1))
                    && (e2 > 0.0 || (e2 == 0.0 && tl2));
                if covered {
                    let i = y * self.width + x;
                    let b0 = w0 * ra;
                    let b1 = w1 * ra;
                    let b2 = w2 * ra;
                    let z = b0 * s0.z + b1 * s1.z + b2 * s2.z;
                    let bz = z + self.depth_bias;

                    // Early depth test, re-checked under the stripe lock.
                    if !self.read_depth
                        || bz <= f32::from_bits(self.depth[i].load(Ordering::Relaxed))
                    {
                        let mut b = Vector4f::new(b0 * r0, b1 * r1, b2 * r2, 0.0);
                        b.w = 1.0 / (b.x + b.y + b.z);
                        let v = Vertex::interpolate(v0, v1, v2, b);

                        let color = self.shader.fragment(&v, object);
                        if color.a > 0.0 {
                            let stripe = (x + y) & (LOCK_STRIPES - 1);
                            let _guard = self.locks[stripe]
                                .lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner());
                            if !self.read_depth
                                || bz <= f32::from_bits(self.depth[i].load(Ordering::Relaxed))
                            {
                                if self.write_depth {
                                    self.depth[i].store(z.to_bits(), Ordering::Relaxed);
                                }
                                if self.write_color {
                                    self.write_pixel(i, color);
                                }
                            }
                        }
                    }
                }
                w0 += w0_dx;
                w1 += w1_dx;
                w2 += w2_dx;
            }
            w0_row += w0_dy;
            w1_row += w1_dy;
            w2_row += w2_dy;
        }
    }

    /// Commit one pixel; callers hold the stripe lock for its coordinates.
    fn write_pixel(&self, i: usize, src: Color) {
        let out = if self.alpha_blend && src.a < 1.0 {
            src.over(Color::unpack(self.color[i].load(Ordering::Relaxed)))
        } else {
            src
        };
        self.color[i].store(out.pack(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::SolidColorShader;
    use rastra_core::Point3f;
    use std::sync::Arc;

    fn red_context(size: usize) -> Context {
        Context::new(
            size,
            size,
            Box::new(SolidColorShader::new(Matrix4f::identity(), Color::RED)),
        )
    }

    fn unit_object() -> Object {
        Object::new(Arc::new(Mesh::new()))
    }

    #[test]
    fn test_is_top_left_partitions_opposite_edges() {
        let cases = [
            (1.0, 0.0),
            (-1.0, 0.0),
            (0.0, 1.0),
            (0.0, -1.0),
            (0.3, -0.7),
            (-2.0, 5.0),
        ];
        for (dx, dy) in cases {
            assert_ne!(
                Context::is_top_left(dx, dy),
                Context::is_top_left(-dx, -dy),
                "edge ({dx}, {dy}) must be owned by exactly one side"
            );
        }
    }

    #[test]
    fn test_degenerate_triangle_is_skipped() {
        let ctx = red_context(16);
        let p = Point3f::new(0.0, 0.0, 0.0);
        let t = Triangle::from_points(p, p, Point3f::new(0.5, 0.0, 0.0));
        ctx.draw_triangle(&t, &unit_object());
        assert!(ctx.color_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_nan_vertex_is_discarded() {
        let ctx = red_context(16);
        // Degeneracy check passes (positions differ and are finite) but the
        // shader output divides to NaN when w is zero.
        let mut t = Triangle::from_points(
            Point3f::new(-0.5, -0.5, 0.0),
            Point3f::new(0.5, -0.5, 0.0),
            Point3f::new(0.0, 0.5, 0.0),
        );
        t.v0.output.w = 0.0;
        // Draw through the clipped path directly to exercise the NaN guard.
        ctx.draw_clipped_triangle(&t.v0, &t.v1, &t.v2, &unit_object());
        assert!(ctx.color_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_mesh_renders_nothing() {
        let ctx = red_context(8);
        ctx.draw_mesh(&Mesh::new(), &unit_object());
        assert!(ctx.color_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clear_color_buffer() {
        let mut ctx = red_context(4);
        ctx.clear_color = Color::BLUE;
        ctx.clear_color_buffer();
        assert_eq!(ctx.pixel_at(0, 0), [0, 0, 255, 255]);
        assert_eq!(ctx.depth_at(2, 2), f32::INFINITY);
    }
}
