//! Unit tests for mesh bounds and built-in mesh data

use crate::graphics::mesh::{cube_mesh_data, quad_mesh_data, BoundingSphere};
use glam::{Mat4, Quat, Vec3};

#[test]
fn test_bounding_sphere_of_empty_set() {
    let sphere = BoundingSphere::from_points(&[]);
    assert_eq!(sphere.center, Vec3::ZERO);
    assert_eq!(sphere.radius, 0.0);
}

#[test]
fn test_bounding_sphere_of_cube() {
    let sphere = BoundingSphere::from_points(&cube_mesh_data().positions);
    assert_eq!(sphere.center, Vec3::ZERO);
    assert!((sphere.radius - 3.0f32.sqrt()).abs() < 1e-6);
}

#[test]
fn test_bounding_sphere_offset_points() {
    let sphere = BoundingSphere::from_points(&[Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)]);
    assert_eq!(sphere.center, Vec3::new(3.0, 0.0, 0.0));
    assert_eq!(sphere.radius, 1.0);
}

#[test]
fn test_transformed_sphere_uses_largest_scale() {
    let sphere = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0);
    let world = Mat4::from_scale_rotation_translation(
        Vec3::new(1.0, 5.0, 2.0),
        Quat::IDENTITY,
        Vec3::new(10.0, 0.0, 0.0),
    );
    let moved = sphere.transformed(&world);
    assert_eq!(moved.center, Vec3::new(11.0, 0.0, 0.0));
    assert!((moved.radius - 10.0).abs() < 1e-5);
}

#[test]
fn test_builtin_meshes_are_indexed_triangles() {
    let quad = quad_mesh_data();
    assert_eq!(quad.indices.len() % 3, 0);
    assert_eq!(quad.positions.len(), quad.uvs.len());
    let cube = cube_mesh_data();
    assert_eq!(cube.indices.len(), 36);
    assert!(cube.indices.iter().all(|i| (*i as usize) < cube.positions.len()));
}
