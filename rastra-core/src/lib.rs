//! Core data structures for the rastra software renderer
//!
//! This crate provides the fundamental types of the render pipeline:
//! vectors and matrices (via nalgebra), colors, bounding boxes, vertices,
//! triangle and line primitives, meshes, renderable objects and textures.

pub mod aabb;
pub mod color;
pub mod error;
pub mod line;
pub mod mesh;
pub mod object;
pub mod point;
pub mod texture;
pub mod traits;
pub mod transform;
pub mod triangle;
pub mod vertex;

pub use aabb::*;
pub use color::*;
pub use error::*;
pub use line::*;
pub use mesh::*;
pub use object::*;
pub use point::*;
pub use texture::*;
pub use traits::*;
pub use triangle::*;
pub use vertex::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

/// Common result type for rastra operations
pub type Result<T> = std::result::Result<T, Error>;
