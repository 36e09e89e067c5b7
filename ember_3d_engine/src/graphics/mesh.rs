/// Uploaded meshes, their bounding spheres and the built-in quad/cube data.

use glam::{Mat4, Vec2, Vec3};
use slotmap::new_key_type;
use crate::gpu::{GpuMesh, MeshData};

new_key_type! {
    /// Stable key of a mesh in the `GraphicsManager` arena
    pub struct MeshKey;
}

/// Sphere enclosing a mesh, used for point-light culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around the AABB center of `points`
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::new(Vec3::ZERO, 0.0);
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0f32, f32::max);
        Self { center, radius }
    }

    /// Sphere in the space `world` maps to
    ///
    /// The radius is scaled by the longest basis vector so non-uniform
    /// scale still encloses the mesh.
    pub fn transformed(&self, world: &Mat4) -> Self {
        let scale = world
            .x_axis
            .truncate()
            .length()
            .max(world.y_axis.truncate().length())
            .max(world.z_axis.truncate().length());
        Self {
            center: world.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }
}

/// Mesh owned by the `GraphicsManager` arena
#[derive(Debug, Clone)]
pub struct Mesh {
    handle: GpuMesh,
    bounds: BoundingSphere,
    vertex_count: usize,
    index_count: usize,
}

impl Mesh {
    pub(crate) fn new(handle: GpuMesh, data: &MeshData) -> Self {
        Self {
            handle,
            bounds: BoundingSphere::from_points(&data.positions),
            vertex_count: data.positions.len(),
            index_count: data.indices.len(),
        }
    }

    pub fn handle(&self) -> GpuMesh {
        self.handle
    }

    /// Bounding sphere in mesh space
    pub fn bounds(&self) -> BoundingSphere {
        self.bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }
}

/// Unit quad centered on the origin in the XY plane, for sprites
pub fn quad_mesh_data() -> MeshData {
    MeshData {
        positions: vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        normals: vec![Vec3::Z; 4],
        uvs: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Cube spanning [-1, 1] on every axis, for skyboxes
pub fn cube_mesh_data() -> MeshData {
    MeshData {
        positions: vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ],
        normals: Vec::new(),
        uvs: Vec::new(),
        indices: vec![
            0, 1, 2, 2, 3, 0, // -Z
            4, 5, 6, 6, 7, 4, // +Z
            0, 4, 7, 7, 3, 0, // -X
            1, 5, 6, 6, 2, 1, // +X
            3, 2, 6, 6, 7, 3, // +Y
            0, 1, 5, 5, 4, 0, // -Y
        ],
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
