//! glTF 2.0 mesh loading
//!
//! Handles both `.gltf` (JSON with external binary buffers) and `.glb`
//! (binary container) files. Node TRS or matrix transforms compose
//! depth-first into world transforms and positions are baked into world
//! space. Per primitive, POSITION is required; NORMAL, TEXCOORD_0 and
//! indices are optional (indices default to 0..N-1). Only triangle-mode
//! primitives are converted; other modes are skipped with a warning.
//! Base64 data URIs are not supported.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use nalgebra::{Quaternion, UnitQuaternion};
use serde::Deserialize;

use rastra_core::{
    transform, Error, Matrix4f, Mesh, Point3f, Result, Triangle, Vector2f, Vector3f, Vertex,
};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const MODE_TRIANGLES: u32 = 4;
const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDesc>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    meshes: Vec<MeshDesc>,
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default)]
    buffer_views: Vec<BufferView>,
    #[serde(default)]
    buffers: Vec<Buffer>,
}

#[derive(Deserialize)]
struct SceneDesc {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Node {
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Deserialize)]
struct MeshDesc {
    #[serde(default)]
    primitives: Vec<Primitive>,
}

#[derive(Deserialize)]
struct Primitive {
    #[serde(default)]
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    #[serde(default = "default_mode")]
    mode: u32,
}

fn default_mode() -> u32 {
    MODE_TRIANGLES
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    uri: Option<String>,
    byte_length: usize,
}

/// Load a `.gltf` or `.glb` file.
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    load_gltf_from_slice(&data, path.parent())
}

/// Load glTF from memory. `base_dir` resolves external buffer URIs; pass
/// `None` when the document is self-contained (GLB with an embedded BIN
/// chunk).
pub fn load_gltf_from_slice(data: &[u8], base_dir: Option<&Path>) -> Result<Mesh> {
    let (json, bin) = if data.starts_with(b"glTF") {
        let (json, bin) = parse_glb(data)?;
        (json, bin)
    } else {
        (data.to_vec(), None)
    };

    let doc: Document = serde_json::from_slice(&json)
        .map_err(|e| Error::InvalidData(format!("gltf json: {}", e)))?;

    let buffers = doc
        .buffers
        .iter()
        .map(|b| buffer_data(b, bin.as_deref(), base_dir))
        .collect::<Result<Vec<Vec<u8>>>>()?;

    let mut triangles = Vec::new();
    let scene_index = doc.scene.unwrap_or(0);
    let scene = doc.scenes.get(scene_index).ok_or_else(|| {
        Error::InvalidData(format!("gltf scene {} does not exist", scene_index))
    })?;
    for &node in &scene.nodes {
        walk_node(&doc, &buffers, node, Matrix4f::identity(), &mut triangles)?;
    }

    if triangles.is_empty() {
        return Err(Error::InvalidData("no triangles found in gltf".to_string()));
    }
    Ok(Mesh::from_triangles(triangles))
}

fn parse_glb(data: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let mut r = data;
    let magic = r.read_u32::<LittleEndian>()?;
    if magic != GLB_MAGIC {
        return Err(Error::InvalidData("bad glb magic".to_string()));
    }
    let version = r.read_u32::<LittleEndian>()?;
    if version != 2 {
        return Err(Error::Unsupported(format!("glb version {}", version)));
    }
    let _total_length = r.read_u32::<LittleEndian>()?;

    let mut json = None;
    let mut bin = None;
    while !r.is_empty() {
        let length = r.read_u32::<LittleEndian>()? as usize;
        let kind = r.read_u32::<LittleEndian>()?;
        if r.len() < length {
            return Err(Error::InvalidData("truncated glb chunk".to_string()));
        }
        let mut chunk = vec![0u8; length];
        r.read_exact(&mut chunk)?;
        match kind {
            CHUNK_JSON if json.is_none() => json = Some(chunk),
            CHUNK_BIN if bin.is_none() => bin = Some(chunk),
            _ => {}
        }
    }
    let json = json.ok_or_else(|| Error::InvalidData("glb without JSON chunk".to_string()))?;
    Ok((json, bin))
}

fn buffer_data(buffer: &Buffer, bin: Option<&[u8]>, base_dir: Option<&Path>) -> Result<Vec<u8>> {
    let data = match &buffer.uri {
        None => bin
            .map(|b| b.to_vec())
            .ok_or_else(|| Error::InvalidData("buffer without uri or BIN chunk".to_string()))?,
        Some(uri) if uri.starts_with("data:") => {
            return Err(Error::Unsupported(
                "base64 data uris are not supported".to_string(),
            ))
        }
        Some(uri) => {
            let base = base_dir.ok_or_else(|| {
                Error::InvalidData("external buffer uri without a base directory".to_string())
            })?;
            fs::read(base.join(uri))?
        }
    };
    if data.len() < buffer.byte_length {
        return Err(Error::InvalidData(format!(
            "buffer holds {} bytes, expected {}",
            data.len(),
            buffer.byte_length
        )));
    }
    Ok(data)
}

fn local_matrix(node: &Node) -> Matrix4f {
    if let Some(m) = node.matrix {
        return Matrix4f::from_column_slice(&m);
    }
    let t = node.translation.unwrap_or([0.0; 3]);
    let r = node.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
    let s = node.scale.unwrap_or([1.0; 3]);
    let rotation =
        UnitQuaternion::from_quaternion(Quaternion::new(r[3], r[0], r[1], r[2])).to_homogeneous();
    transform::translate(Vector3f::from(t)) * rotation * transform::scale(Vector3f::from(s))
}

fn walk_node(
    doc: &Document,
    buffers: &[Vec<u8>],
    index: usize,
    parent: Matrix4f,
    out: &mut Vec<Triangle>,
) -> Result<()> {
    let node = doc
        .nodes
        .get(index)
        .ok_or_else(|| Error::InvalidData(format!("gltf node {} does not exist", index)))?;
    let world = parent * local_matrix(node);

    if let Some(mesh_index) = node.mesh {
        let mesh = doc.meshes.get(mesh_index).ok_or_else(|| {
            Error::InvalidData(format!("gltf mesh {} does not exist", mesh_index))
        })?;
        for primitive in &mesh.primitives {
            extract_primitive(doc, buffers, primitive, &world, out)?;
        }
    }

    for &child in &node.children {
        walk_node(doc, buffers, child, world, out)?;
    }
    Ok(())
}

fn extract_primitive(
    doc: &Document,
    buffers: &[Vec<u8>],
    primitive: &Primitive,
    world: &Matrix4f,
    out: &mut Vec<Triangle>,
) -> Result<()> {
    if primitive.mode != MODE_TRIANGLES {
        log::warn!("skipping non-triangle gltf primitive (mode {})", primitive.mode);
        return Ok(());
    }
    let position_accessor = match primitive.attributes.get("POSITION") {
        Some(&i) => i,
        None => return Ok(()),
    };

    let positions = read_vec3(doc, buffers, position_accessor)?;
    let normals = match primitive.attributes.get("NORMAL") {
        Some(&i) => read_vec3(doc, buffers, i)?,
        None => Vec::new(),
    };
    let texcoords = match primitive.attributes.get("TEXCOORD_0") {
        Some(&i) => read_vec2(doc, buffers, i)?,
        None => Vec::new(),
    };
    let indices = match primitive.indices {
        Some(i) => read_indices(doc, buffers, i)?,
        None => (0..positions.len()).collect(),
    };

    for chunk in indices.chunks_exact(3) {
        let mut corners = [Vertex::default(); 3];
        for (corner, &index) in corners.iter_mut().zip(chunk) {
            let position = *positions.get(index).ok_or_else(|| {
                Error::InvalidData(format!("gltf index {} out of range", index))
            })?;
            corner.position = world.transform_point(&Point3f::from(position));
            if let Some(normal) = normals.get(index) {
                corner.normal = world.transform_vector(normal);
            }
            if let Some(texcoord) = texcoords.get(index) {
                corner.texcoord = *texcoord;
            }
        }
        out.push(Triangle::new(corners[0], corners[1], corners[2]));
    }
    Ok(())
}

/// Iterate an accessor's raw elements, honoring the bufferView's stride.
fn accessor_elements<'a>(
    doc: &Document,
    buffers: &'a [Vec<u8>],
    accessor: &Accessor,
    element_size: usize,
) -> Result<impl Iterator<Item = &'a [u8]>> {
    let view_index = accessor.buffer_view.ok_or_else(|| {
        Error::Unsupported("sparse accessors are not supported".to_string())
    })?;
    let view = doc
        .buffer_views
        .get(view_index)
        .ok_or_else(|| Error::InvalidData(format!("bufferView {} does not exist", view_index)))?;
    let data = buffers
        .get(view.buffer)
        .ok_or_else(|| Error::InvalidData(format!("buffer {} does not exist", view.buffer)))?;
    let stride = view.byte_stride.unwrap_or(element_size);
    let base = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(|| Error::InvalidData("accessor offset overflow".to_string()))?;
    let count = accessor.count;

    if count > 0 {
        let last = (count - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(base))
            .and_then(|v| v.checked_add(element_size))
            .ok_or_else(|| Error::InvalidData("accessor range overflow".to_string()))?;
        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .ok_or_else(|| Error::InvalidData("bufferView range overflow".to_string()))?;
        if last > data.len() || last > view_end {
            return Err(Error::InvalidData(
                "accessor reads past the end of its buffer view".to_string(),
            ));
        }
    }

    Ok((0..count).map(move |i| &data[base + i * stride..base + i * stride + element_size]))
}

fn read_vec3(doc: &Document, buffers: &[Vec<u8>], index: usize) -> Result<Vec<Vector3f>> {
    let accessor = get_accessor(doc, index)?;
    expect_accessor(accessor, "VEC3", COMPONENT_F32)?;
    accessor_elements(doc, buffers, accessor, 12)?
        .map(|mut e| {
            Ok(Vector3f::new(
                e.read_f32::<LittleEndian>()?,
                e.read_f32::<LittleEndian>()?,
                e.read_f32::<LittleEndian>()?,
            ))
        })
        .collect()
}

fn read_vec2(doc: &Document, buffers: &[Vec<u8>], index: usize) -> Result<Vec<Vector2f>> {
    let accessor = get_accessor(doc, index)?;
    expect_accessor(accessor, "VEC2", COMPONENT_F32)?;
    accessor_elements(doc, buffers, accessor, 8)?
        .map(|mut e| {
            Ok(Vector2f::new(
                e.read_f32::<LittleEndian>()?,
                e.read_f32::<LittleEndian>()?,
            ))
        })
        .collect()
}

fn read_indices(doc: &Document, buffers: &[Vec<u8>], index: usize) -> Result<Vec<usize>> {
    let accessor = get_accessor(doc, index)?;
    if accessor.kind != "SCALAR" {
        return Err(Error::InvalidData(format!(
            "index accessor has type {}, expected SCALAR",
            accessor.kind
        )));
    }
    let element_size = match accessor.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => {
            return Err(Error::InvalidData(format!(
                "unsupported index component type {}",
                other
            )))
        }
    };
    accessor_elements(doc, buffers, accessor, element_size)?
        .map(|mut e| {
            Ok(match element_size {
                1 => e.read_u8()? as usize,
                2 => e.read_u16::<LittleEndian>()? as usize,
                _ => e.read_u32::<LittleEndian>()? as usize,
            })
        })
        .collect()
}

fn get_accessor(doc: &Document, index: usize) -> Result<&Accessor> {
    doc.accessors
        .get(index)
        .ok_or_else(|| Error::InvalidData(format!("accessor {} does not exist", index)))
}

fn expect_accessor(accessor: &Accessor, kind: &str, component_type: u32) -> Result<()> {
    if accessor.kind != kind || accessor.component_type != component_type {
        return Err(Error::InvalidData(format!(
            "accessor has type {}/{}, expected {}/{}",
            accessor.kind, accessor.component_type, kind, component_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    /// One triangle: positions (0,0,0) (1,0,0) (0,1,0), indices 0 1 2 as u16.
    fn triangle_bin() -> Vec<u8> {
        let mut bin = Vec::new();
        for p in [
            [0.0f32, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ] {
            for c in p {
                bin.write_f32::<LittleEndian>(c).unwrap();
            }
        }
        for i in [0u16, 1, 2] {
            bin.write_u16::<LittleEndian>(i).unwrap();
        }
        bin.extend_from_slice(&[0, 0]); // align to 4
        bin
    }

    fn triangle_json(extra_node: &str, buffer_uri: Option<&str>) -> String {
        let uri = match buffer_uri {
            Some(u) => format!("\"uri\": \"{}\", ", u),
            None => String::new(),
        };
        format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0{extra_node}}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}],
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}},
    {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
  ],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": 6}}
  ],
  "buffers": [{{{uri}"byteLength": 44}}]
}}"#
        )
    }

    fn glb_bytes(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut out = Vec::new();
        out.write_u32::<LittleEndian>(GLB_MAGIC).unwrap();
        out.write_u32::<LittleEndian>(2).unwrap();
        let total = 12 + 8 + json.len() + 8 + bin.len();
        out.write_u32::<LittleEndian>(total as u32).unwrap();
        out.write_u32::<LittleEndian>(json.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(CHUNK_JSON).unwrap();
        out.extend_from_slice(&json);
        out.write_u32::<LittleEndian>(bin.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(CHUNK_BIN).unwrap();
        out.extend_from_slice(bin);
        out
    }

    #[test]
    fn test_glb_triangle() {
        let glb = glb_bytes(&triangle_json("", None), &triangle_bin());
        let mesh = load_gltf_from_slice(&glb, None).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        let t = &mesh.triangles[0];
        assert_eq!(t.v1.position, Point3f::new(1.0, 0.0, 0.0));
        // No NORMAL attribute: face normal fills in.
        assert_eq!(t.v0.normal, Vector3f::z());
    }

    #[test]
    fn test_node_translation_bakes_into_positions() {
        let json = triangle_json(", \"translation\": [5.0, 0.0, 0.0]", None);
        let glb = glb_bytes(&json, &triangle_bin());
        let mesh = load_gltf_from_slice(&glb, None).unwrap();
        assert_eq!(mesh.triangles[0].v0.position, Point3f::new(5.0, 0.0, 0.0));
        assert_eq!(mesh.triangles[0].v1.position, Point3f::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_gltf_with_external_buffer_file() {
        let dir = std::env::temp_dir().join("rastra_gltf_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.bin"), triangle_bin()).unwrap();
        let json = triangle_json("", Some("tri.bin"));
        let gltf_path = dir.join("tri.gltf");
        std::fs::write(&gltf_path, json).unwrap();

        let mesh = load_gltf(&gltf_path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_data_uri_is_unsupported() {
        let json = triangle_json("", Some("data:application/octet-stream;base64,AAAA"));
        let result = load_gltf_from_slice(json.as_bytes(), None);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_bad_magic() {
        let mut glb = glb_bytes(&triangle_json("", None), &triangle_bin());
        glb[0] = b'x';
        // Without the magic this parses as (invalid) JSON instead.
        assert!(load_gltf_from_slice(&glb, None).is_err());
    }

    #[test]
    fn test_non_triangle_primitives_are_skipped() {
        let json = r#"{
  "scenes": [{"nodes": [0]}],
  "nodes": [{"mesh": 0}],
  "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "mode": 1}]}],
  "accessors": [{"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3"}],
  "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 24}],
  "buffers": [{"byteLength": 24}]
}"#;
        let glb = glb_bytes(json, &[0u8; 24]);
        // The only primitive is a line strip, so no triangles remain.
        assert!(load_gltf_from_slice(&glb, None).is_err());
    }

    #[test]
    fn test_huge_offsets_error_instead_of_wrapping() {
        // Offsets near usize::MAX must surface as InvalidData, not overflow.
        let accessor_overflow = format!(
            r#"{{
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "accessors": [{{"bufferView": 0, "byteOffset": {max}, "componentType": 5126, "count": 3, "type": "VEC3"}}],
  "bufferViews": [{{"buffer": 0, "byteOffset": {max}, "byteLength": 36}}],
  "buffers": [{{"byteLength": 44}}]
}}"#,
            max = usize::MAX
        );
        let glb = glb_bytes(&accessor_overflow, &triangle_bin());
        assert!(matches!(
            load_gltf_from_slice(&glb, None),
            Err(Error::InvalidData(_))
        ));

        // A valid base but a bufferView whose offset + length overflows.
        let view_overflow = format!(
            r#"{{
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}}],
  "bufferViews": [{{"buffer": 0, "byteOffset": 8, "byteLength": {max}}}],
  "buffers": [{{"byteLength": 44}}]
}}"#,
            max = usize::MAX
        );
        let glb = glb_bytes(&view_overflow, &triangle_bin());
        assert!(matches!(
            load_gltf_from_slice(&glb, None),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_missing_scene_is_invalid() {
        let json = r#"{"scenes": [], "scene": 3, "nodes": [], "meshes": [], "accessors": [], "bufferViews": [], "buffers": []}"#;
        assert!(matches!(
            load_gltf_from_slice(json.as_bytes(), None),
            Err(Error::InvalidData(_))
        ));
    }
}
