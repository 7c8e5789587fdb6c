//! Scalar type aliases and angle helpers

use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

/// A 3D point with single precision coordinates
pub type Point3f = Point3<f32>;

/// A 2D vector with single precision components
pub type Vector2f = Vector2<f32>;

/// A 3D vector with single precision components
pub type Vector3f = Vector3<f32>;

/// A homogeneous clip-space coordinate
pub type Vector4f = Vector4<f32>;

/// A 4x4 single precision matrix
pub type Matrix4f = Matrix4<f32>;

/// Convert degrees to radians
pub fn radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Convert radians to degrees
pub fn degrees(radians: f32) -> f32 {
    radians * 180.0 / std::f32::consts::PI
}

/// Convert a latitude/longitude pair (in degrees) to a unit direction
pub fn lat_lng_to_xyz(lat: f32, lng: f32) -> Vector3f {
    let (lat, lng) = (radians(lat), radians(lng));
    Vector3f::new(
        lat.cos() * lng.cos(),
        lat.cos() * lng.sin(),
        lat.sin(),
    )
}
