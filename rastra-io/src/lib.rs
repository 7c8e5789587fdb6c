//! I/O for the rastra software renderer
//!
//! Reads triangle meshes from OBJ and glTF 2.0 files, decodes images into
//! [`rastra_core::Texture`]s and encodes framebuffers as PNG.

pub mod gltf;
pub mod image_io;
pub mod obj;

pub use gltf::{load_gltf, load_gltf_from_slice};
pub use image_io::{load_texture, save_png, texture_from_bytes, write_png};
pub use obj::{load_obj, load_obj_from_reader};

use std::path::Path;

use rastra_core::{Error, Mesh, Object, Result};

/// Load a mesh and wrap it in a default-material [`Object`].
pub fn load_object<P: AsRef<Path>>(path: P) -> Result<Object> {
    Ok(Object::from_mesh(load_mesh(path)?))
}

/// Load a mesh, dispatching on the file extension.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("obj") => load_obj(path),
        Some("gltf") | Some("glb") => load_gltf(path),
        other => Err(Error::UnsupportedFormat(format!(
            "unrecognized mesh extension: {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_mesh_rejects_unknown_extension() {
        assert!(matches!(
            load_mesh("model.stl"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(load_mesh("model"), Err(Error::UnsupportedFormat(_))));
    }
}
