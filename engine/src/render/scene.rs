//! Scene description
//!
//! CPU-side meshes and the list of bodies they are drawn for. Both renderers
//! consume [`MeshInstance`]s; neither knows about physics.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::physics::{BodyHandle, PhysicsWorld};

/// Vertex for scene meshes (position, normal, color)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(SceneVertex, [u8; 40]);

impl SceneVertex {
    pub fn new(position: Vec3, normal: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<SceneVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends a flat-shaded triangle. Winding is counter-clockwise seen from outside.
    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: [f32; 4]) {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let base = self.vertices.len() as u32;
        self.vertices.push(SceneVertex::new(a, normal, color));
        self.vertices.push(SceneVertex::new(b, normal, color));
        self.vertices.push(SceneVertex::new(c, normal, color));
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

/// Converts a packed `0xRRGGBB` color to linear RGBA floats.
pub fn rgb_hex(hex: u32) -> [f32; 4] {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    [r, g, b, 1.0]
}

/// Axis-aligned box mesh centered on the origin, 12 triangles.
pub fn box_mesh(half_extents: Vec3, color: [f32; 4]) -> Mesh {
    let h = half_extents;
    // (normal, tangent u, tangent v) per face, u x v = normal
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut mesh = Mesh::default();
    for (normal, u, v) in faces {
        let center = normal * h;
        let du = u * h;
        let dv = v * h;
        let corners = [
            center - du - dv,
            center + du - dv,
            center + du + dv,
            center - du + dv,
        ];

        let base = mesh.vertices.len() as u32;
        for corner in corners {
            mesh.vertices.push(SceneVertex::new(corner, normal, color));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Flat grid of thin strips on the z = 0 plane, spanning -size..size.
pub fn grid_mesh(size: f32, spacing: f32, line_width: f32, color: [f32; 4]) -> Mesh {
    let mut mesh = Mesh::default();
    if spacing <= 0.0 || size <= 0.0 {
        return mesh;
    }

    let half = line_width * 0.5;
    let lines = (size * 2.0 / spacing).round() as i32;
    for i in 0..=lines {
        let offset = -size + i as f32 * spacing;
        // Strip along Y at x = offset, then along X at y = offset
        let a = Vec3::new(offset - half, -size, 0.0);
        let b = Vec3::new(offset + half, -size, 0.0);
        let c = Vec3::new(offset + half, size, 0.0);
        let d = Vec3::new(offset - half, size, 0.0);
        mesh.push_triangle(a, b, c, color);
        mesh.push_triangle(a, c, d, color);

        let a = Vec3::new(-size, offset - half, 0.0);
        let b = Vec3::new(size, offset - half, 0.0);
        let c = Vec3::new(size, offset + half, 0.0);
        let d = Vec3::new(-size, offset + half, 0.0);
        mesh.push_triangle(a, b, c, color);
        mesh.push_triangle(a, c, d, color);
    }
    mesh
}

/// One mesh drawn with one model transform.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
}

/// Render-side list of bodies and the meshes drawn for them.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    entries: Vec<(BodyHandle, Arc<Mesh>)>,
    statics: Vec<MeshInstance>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `mesh` at the pose of `body` every frame.
    pub fn attach(&mut self, body: BodyHandle, mesh: Arc<Mesh>) {
        self.entries.push((body, mesh));
    }

    /// Draw `mesh` at a fixed transform (grid lines, decoration).
    pub fn add_static(&mut self, mesh: Arc<Mesh>, transform: Mat4) {
        self.statics.push(MeshInstance { mesh, transform });
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.statics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.statics.clear();
    }

    /// Current instances, with body-attached meshes posed from the world.
    ///
    /// Bodies missing from the world are skipped.
    pub fn instances<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Vec<MeshInstance> {
        let posed = self.entries.iter().filter_map(|(handle, mesh)| {
            let body = world.body(*handle)?;
            Some(MeshInstance {
                mesh: Arc::clone(mesh),
                transform: Mat4::from_rotation_translation(body.orientation, body.position),
            })
        });
        self.statics.iter().cloned().chain(posed).collect()
    }
}
