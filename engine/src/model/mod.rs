//! Model descriptions
//!
//! Loader for the JSON model format version 3 (the format Blender's legacy
//! three.js exporter writes). Only geometry and material colors are read;
//! UVs, vertex colors and animation data are skipped.
//!
//! Faces are stored as one flat integer array. Each face starts with a type
//! word whose bits describe what follows:
//!
//! | bit | meaning                  | values consumed     |
//! |-----|--------------------------|---------------------|
//! | 0   | quad (else triangle)     | 4 or 3 vertex ids   |
//! | 1   | material                 | 1                   |
//! | 2   | face uv                  | 1 per uv layer      |
//! | 3   | face vertex uvs          | n per uv layer      |
//! | 4   | face normal              | 1                   |
//! | 5   | face vertex normals      | n                   |
//! | 6   | face color               | 1                   |
//! | 7   | face vertex colors       | n                   |

use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::physics::Aabb;
use crate::render::Mesh;

/// Built-in player model, a small glider.
pub const GLIDER_JSON: &str = include_str!("../../../assets/models/glider.json");

const QUAD: u32 = 1 << 0;
const MATERIAL: u32 = 1 << 1;
const FACE_UV: u32 = 1 << 2;
const FACE_VERTEX_UV: u32 = 1 << 3;
const FACE_NORMAL: u32 = 1 << 4;
const FACE_VERTEX_NORMAL: u32 = 1 << 5;
const FACE_COLOR: u32 = 1 << 6;
const FACE_VERTEX_COLOR: u32 = 1 << 7;

/// Errors raised while reading a model description.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported model format version {0} (expected 3.x)")]
    UnsupportedVersion(f32),

    #[error("vertex array length {0} is not a multiple of 3")]
    RaggedVertices(usize),

    #[error("face data ends early at offset {0}")]
    TruncatedFaces(usize),

    #[error("face at offset {offset} references {kind} {index}, only {count} exist")]
    IndexOutOfRange {
        offset: usize,
        kind: &'static str,
        index: u32,
        count: usize,
    },

    #[error("model has no faces")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(rename = "formatVersion")]
    format_version: f32,
}

#[derive(Debug, Deserialize)]
struct RawMaterial {
    #[serde(rename = "DbgName", default)]
    name: String,
    #[serde(rename = "colorDiffuse", default)]
    color_diffuse: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    scale: Option<f32>,
    vertices: Vec<f32>,
    #[serde(default)]
    uvs: Vec<Vec<f32>>,
    faces: Vec<u32>,
    #[serde(default)]
    materials: Vec<RawMaterial>,
}

/// A model material; only the diffuse color matters here.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
}

/// One polygon of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Three or four vertex indices, counter-clockwise
    pub vertices: Vec<u32>,
    pub material: Option<u32>,
}

/// Parsed model geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGeometry {
    pub positions: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub materials: Vec<ModelMaterial>,
}

impl ModelGeometry {
    /// Parse a format 3 JSON model.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let raw: RawModel = serde_json::from_str(json)?;

        if let Some(metadata) = &raw.metadata {
            if !(3.0..4.0).contains(&metadata.format_version) {
                return Err(ModelError::UnsupportedVersion(metadata.format_version));
            }
        }
        if raw.vertices.len() % 3 != 0 {
            return Err(ModelError::RaggedVertices(raw.vertices.len()));
        }

        let file_scale = raw.scale.filter(|s| *s != 0.0).unwrap_or(1.0);
        let positions: Vec<Vec3> = raw
            .vertices
            .chunks_exact(3)
            .map(|v| Vec3::new(v[0], v[1], v[2]) / file_scale)
            .collect();

        let uv_layers = raw.uvs.iter().filter(|layer| !layer.is_empty()).count();
        let faces = parse_faces(&raw.faces, positions.len(), uv_layers)?;
        if faces.is_empty() {
            return Err(ModelError::Empty);
        }

        let materials = raw
            .materials
            .into_iter()
            .map(|m| ModelMaterial {
                name: m.name,
                diffuse: m.color_diffuse.unwrap_or([1.0, 1.0, 1.0]),
            })
            .collect();

        Ok(Self {
            positions,
            faces,
            materials,
        })
    }

    /// Read and parse a model file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The built-in glider model.
    pub fn glider() -> Result<Self, ModelError> {
        Self::from_json_str(GLIDER_JSON)
    }

    /// Bounding box of all vertices.
    pub fn bounds(&self) -> Aabb {
        let (min, max) = self.positions.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        );
        Aabb { min, max }
    }

    /// Half extents of the bounding box, used as the physics box.
    pub fn half_extents(&self) -> Vec3 {
        self.bounds().half_extents()
    }

    /// Moves the model into the Z-up physics frame.
    ///
    /// Centers the bounding box on the origin, rotates +90 degrees about X
    /// (authoring tools export Y-up), then scales uniformly.
    pub fn prepare(mut self, scale: f32) -> Self {
        let center = self.bounds().center();
        let rotation = Quat::from_rotation_x(FRAC_PI_2);
        for p in &mut self.positions {
            *p = (rotation * (*p - center)) * scale;
        }
        self
    }

    /// Flat-shaded triangle mesh. `palette` overrides material colors by index.
    pub fn to_mesh(&self, palette: &[[f32; 3]]) -> Mesh {
        let mut mesh = Mesh::default();
        for face in &self.faces {
            let color = self.face_color(face, palette);
            let p = |i: usize| self.positions[face.vertices[i] as usize];

            // Quads split as (a, b, d) and (b, c, d)
            if face.vertices.len() == 4 {
                mesh.push_triangle(p(0), p(1), p(3), color);
                mesh.push_triangle(p(1), p(2), p(3), color);
            } else {
                mesh.push_triangle(p(0), p(1), p(2), color);
            }
        }
        mesh
    }

    fn face_color(&self, face: &Face, palette: &[[f32; 3]]) -> [f32; 4] {
        let index = face.material.unwrap_or(0) as usize;
        let rgb = palette
            .get(index)
            .or_else(|| self.materials.get(index).map(|m| &m.diffuse))
            .copied()
            .unwrap_or([0.8, 0.8, 0.8]);
        [rgb[0], rgb[1], rgb[2], 1.0]
    }
}

struct FaceReader<'a> {
    data: &'a [u32],
    offset: usize,
}

impl FaceReader<'_> {
    fn take(&mut self) -> Result<u32, ModelError> {
        let value = *self
            .data
            .get(self.offset)
            .ok_or(ModelError::TruncatedFaces(self.offset))?;
        self.offset += 1;
        Ok(value)
    }

    fn skip(&mut self, count: usize) -> Result<(), ModelError> {
        if self.offset + count > self.data.len() {
            return Err(ModelError::TruncatedFaces(self.data.len()));
        }
        self.offset += count;
        Ok(())
    }
}

fn parse_faces(data: &[u32], vertex_count: usize, uv_layers: usize) -> Result<Vec<Face>, ModelError> {
    let mut reader = FaceReader { data, offset: 0 };
    let mut faces = Vec::new();

    while reader.offset < data.len() {
        let start = reader.offset;
        let kind = reader.take()?;
        let arity = if kind & QUAD != 0 { 4 } else { 3 };

        let mut vertices = Vec::with_capacity(arity);
        for _ in 0..arity {
            let index = reader.take()?;
            if index as usize >= vertex_count {
                return Err(ModelError::IndexOutOfRange {
                    offset: start,
                    kind: "vertex",
                    index,
                    count: vertex_count,
                });
            }
            vertices.push(index);
        }

        let material = if kind & MATERIAL != 0 {
            Some(reader.take()?)
        } else {
            None
        };

        if kind & FACE_UV != 0 {
            reader.skip(uv_layers)?;
        }
        if kind & FACE_VERTEX_UV != 0 {
            reader.skip(uv_layers * arity)?;
        }
        if kind & FACE_NORMAL != 0 {
            reader.skip(1)?;
        }
        if kind & FACE_VERTEX_NORMAL != 0 {
            reader.skip(arity)?;
        }
        if kind & FACE_COLOR != 0 {
            reader.skip(1)?;
        }
        if kind & FACE_VERTEX_COLOR != 0 {
            reader.skip(arity)?;
        }

        faces.push(Face { vertices, material });
    }

    Ok(faces)
}
