//! Matrix constructors for model, view, projection and screen transforms
//!
//! All functions return a plain `Matrix4f` in nalgebra's column-vector
//! convention: composed transforms apply right-to-left, positions go through
//! `transform_point` (implicit w=1, perspective divide), directions through
//! `transform_vector` (w=0, no translation) and clip-space coordinates come
//! from `matrix * point.to_homogeneous()`.

use nalgebra::Unit;

use crate::point::{radians, Matrix4f, Point3f, Vector3f};

/// Translation by `v`
pub fn translate(v: Vector3f) -> Matrix4f {
    Matrix4f::new_translation(&v)
}

/// Per-axis scaling by `v`
pub fn scale(v: Vector3f) -> Matrix4f {
    Matrix4f::new_nonuniform_scaling(&v)
}

/// Rotation of `angle` radians about `axis`
pub fn rotate(axis: Vector3f, angle: f32) -> Matrix4f {
    Matrix4f::from_axis_angle(&Unit::new_normalize(axis), angle)
}

/// Perspective frustum with explicit clip planes
pub fn frustum(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Matrix4f {
    let t1 = 2.0 * n;
    let t2 = r - l;
    let t3 = t - b;
    let t4 = f - n;
    Matrix4f::new(
        t1 / t2, 0.0, (r + l) / t2, 0.0,
        0.0, t1 / t3, (t + b) / t3, 0.0,
        0.0, 0.0, (-f - n) / t4, (-t1 * f) / t4,
        0.0, 0.0, -1.0, 0.0,
    )
}

/// Orthographic projection with explicit clip planes
pub fn orthographic(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Matrix4f {
    Matrix4f::new_orthographic(l, r, b, t, n, f)
}

/// Symmetric perspective projection from a vertical field of view in degrees
pub fn perspective(fovy_deg: f32, aspect: f32, near: f32, far: f32) -> Matrix4f {
    let ymax = near * (radians(fovy_deg) / 2.0).tan();
    let xmax = ymax * aspect;
    frustum(-xmax, xmax, -ymax, ymax, near, far)
}

/// Right-handed view matrix looking from `eye` toward `center`
pub fn look_at(eye: Point3f, center: Point3f, up: Vector3f) -> Matrix4f {
    Matrix4f::look_at_rh(&eye, &center, &up)
}

/// Maps NDC [-1,1]^2 to a width x height pixel buffer.
///
/// Y is flipped (NDC y=+1 lands on screen y=0) and NDC z [-1,1] maps to the
/// [0,1] depth range stored in the depth buffer.
pub fn screen(width: usize, height: usize) -> Matrix4f {
    let w2 = width as f32 / 2.0;
    let h2 = height as f32 / 2.0;
    Matrix4f::new(
        w2, 0.0, 0.0, w2,
        0.0, -h2, 0.0, h2,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}
