//! Clipping against the homogeneous clip volume
//!
//! Clipping happens after the vertex stage, in clip space, before the
//! perspective divide. The visible volume is bounded by six planes:
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//! -w <= z <= w
//! ```
//!
//! Triangles are clipped with Sutherland-Hodgman: the polygon is cut
//! against each plane in turn and re-fan-triangulated at the end. New
//! vertices on a plane interpolate every attribute linearly in the edge
//! parameter, so positions, normals, texture coordinates, colors and the
//! clip-space output all stay consistent across the cut.

use rastra_core::{Line, Triangle, Vertex};

/// One of the six clip half-spaces, in clipping order.
#[derive(Debug, Clone, Copy)]
enum ClipPlane {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}

const PLANES: [ClipPlane; 6] = [
    ClipPlane::NegX,
    ClipPlane::PosX,
    ClipPlane::NegY,
    ClipPlane::PosY,
    ClipPlane::NegZ,
    ClipPlane::PosZ,
];

impl ClipPlane {
    /// Signed homogeneous distance: >= 0 inside the half-space.
    fn signed_distance(self, v: &Vertex) -> f32 {
        let o = v.output;
        match self {
            ClipPlane::NegX => o.w + o.x,
            ClipPlane::PosX => o.w - o.x,
            ClipPlane::NegY => o.w + o.y,
            ClipPlane::PosY => o.w - o.y,
            ClipPlane::NegZ => o.w + o.z,
            ClipPlane::PosZ => o.w - o.z,
        }
    }
}

fn clip_polygon(polygon: &[Vertex], plane: ClipPlane) -> Vec<Vertex> {
    let mut output = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % polygon.len()];
        let d1 = plane.signed_distance(current);
        let d2 = plane.signed_distance(next);
        if d1 >= 0.0 {
            output.push(*current);
            if d2 < 0.0 {
                output.push(current.lerp(next, d1 / (d1 - d2)));
            }
        } else if d2 >= 0.0 {
            output.push(current.lerp(next, d1 / (d1 - d2)));
        }
    }
    output
}

/// Clip a triangle against the six clip planes.
///
/// Returns the fan triangulation of the clipped convex polygon; empty when
/// the triangle lies entirely outside the volume. Callers should test
/// [`Vertex::outside`] first and skip clipping when all vertices are inside.
pub fn clip_triangle(t: &Triangle) -> Vec<Triangle> {
    let mut polygon = vec![t.v0, t.v1, t.v2];
    for plane in PLANES {
        if polygon.len() < 3 {
            return Vec::new();
        }
        polygon = clip_polygon(&polygon, plane);
    }
    if polygon.len() < 3 {
        return Vec::new();
    }
    (1..polygon.len() - 1)
        .map(|i| Triangle {
            v0: polygon[0],
            v1: polygon[i],
            v2: polygon[i + 1],
        })
        .collect()
}

/// Clip a line segment against the six clip planes.
pub fn clip_line(l: &Line) -> Option<Line> {
    let (mut a, mut b) = (l.v0, l.v1);
    for plane in PLANES {
        let da = plane.signed_distance(&a);
        let db = plane.signed_distance(&b);
        match (da >= 0.0, db >= 0.0) {
            (true, true) => {}
            (false, false) => return None,
            (true, false) => b = a.lerp(&b, da / (da - db)),
            (false, true) => a = a.lerp(&b, da / (da - db)),
        }
    }
    Some(Line { v0: a, v1: b })
}
