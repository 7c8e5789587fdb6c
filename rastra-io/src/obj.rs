//! Wavefront OBJ mesh loading
//!
//! Supports `v`, `vt`, `vn` and `f` directives with 1-based indices,
//! negative indices relative to the current element count, and faces of any
//! arity (fan-triangulated). Vertices without a normal inherit the face
//! normal. Unknown directives and `#` comments are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use rastra_core::{Error, Mesh, Point3f, Result, Triangle, Vector2f, Vector3f, Vertex};

pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    load_obj_from_reader(File::open(path)?)
}

pub fn load_obj_from_slice(data: &[u8]) -> Result<Mesh> {
    load_obj_from_reader(data)
}

pub fn load_obj_from_reader<R: Read>(r: R) -> Result<Mesh> {
    let mut positions: Vec<Point3f> = Vec::new();
    let mut texcoords: Vec<Vector2f> = Vec::new();
    let mut normals: Vec<Vector3f> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();

    for (line_number, line) in BufReader::new(r).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let directive = match fields.next() {
            Some(d) => d,
            None => continue,
        };
        let fields: Vec<&str> = fields.collect();
        let context = |what: &str| format!("line {}: {}", line_number + 1, what);

        match directive {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&fields).ok_or_else(|| {
                    Error::InvalidData(context("malformed vertex position"))
                })?;
                positions.push(Point3f::new(x, y, z));
            }
            "vt" => {
                // The v coordinate is optional; default 0.
                let u = parse_float(fields.first()).ok_or_else(|| {
                    Error::InvalidData(context("malformed texture coordinate"))
                })?;
                let v = parse_float(fields.get(1)).unwrap_or(0.0);
                texcoords.push(Vector2f::new(u, v));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&fields).ok_or_else(|| {
                    Error::InvalidData(context("malformed vertex normal"))
                })?;
                normals.push(Vector3f::new(x, y, z));
            }
            "f" => {
                if fields.len() < 3 {
                    return Err(Error::InvalidData(context("face with fewer than 3 vertices")));
                }
                let corners = fields
                    .iter()
                    .map(|s| {
                        face_vertex(s, &positions, &texcoords, &normals)
                            .ok_or_else(|| Error::InvalidData(context("malformed face vertex")))
                    })
                    .collect::<Result<Vec<Vertex>>>()?;
                for i in 1..corners.len() - 1 {
                    triangles.push(Triangle::new(corners[0], corners[i], corners[i + 1]));
                }
            }
            _ => {}
        }
    }

    Ok(Mesh::from_triangles(triangles))
}

fn parse_float(s: Option<&&str>) -> Option<f32> {
    s.and_then(|s| s.parse::<f32>().ok())
}

fn parse_floats<const N: usize>(fields: &[&str]) -> Option<[f32; N]> {
    if fields.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, s) in out.iter_mut().zip(fields) {
        *slot = s.parse::<f32>().ok()?;
    }
    Some(out)
}

/// Resolve a 1-based (or negative, count-relative) OBJ index.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        len as i64 + index
    } else {
        return None;
    };
    (0..len as i64).contains(&resolved).then(|| resolved as usize)
}

/// Parse one `v`, `v/vt`, `v//vn` or `v/vt/vn` face corner.
fn face_vertex(
    corner: &str,
    positions: &[Point3f],
    texcoords: &[Vector2f],
    normals: &[Vector3f],
) -> Option<Vertex> {
    let mut parts = corner.split('/');
    let position_index = parts.next()?.parse::<i64>().ok()?;
    let mut vertex = Vertex::from_position(
        *positions.get(resolve_index(position_index, positions.len())?)?,
    );
    if let Some(part) = parts.next() {
        if !part.is_empty() {
            let index = part.parse::<i64>().ok()?;
            vertex.texcoord = *texcoords.get(resolve_index(index, texcoords.len())?)?;
        }
    }
    if let Some(part) = parts.next() {
        if !part.is_empty() {
            let index = part.parse::<i64>().ok()?;
            vertex.normal = *normals.get(resolve_index(index, normals.len())?)?;
        }
    }
    Some(vertex)
}
