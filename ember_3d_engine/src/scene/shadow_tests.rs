//! Unit tests for shadow projection math

use crate::gpu::CubeFace;
use crate::scene::shadow::{
    fit_directional_light_space, frustum_corners, light_up_vector, point_face_matrices,
    select_cube_face, PointShadow, POINT_FACES,
};
use glam::{Mat4, Vec3};

const EPS: f32 = 1e-3;

fn camera() -> (Mat4, Mat4) {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh_gl(60f32.to_radians(), 16.0 / 9.0, 0.1, 50.0);
    (view, projection)
}

// ============================================================================
// FRUSTUM CORNERS
// ============================================================================

#[test]
fn test_frustum_corners_of_simple_perspective() {
    let projection = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 1.0, 10.0);
    let corners = frustum_corners(&Mat4::IDENTITY, &projection);

    let near: Vec<_> = corners.iter().filter(|c| (c.z + 1.0).abs() < EPS).collect();
    let far: Vec<_> = corners.iter().filter(|c| (c.z + 10.0).abs() < EPS).collect();
    assert_eq!(near.len(), 4);
    assert_eq!(far.len(), 4);
    assert!(near.iter().all(|c| (c.x.abs() - 1.0).abs() < EPS && (c.y.abs() - 1.0).abs() < EPS));
    assert!(far.iter().all(|c| (c.x.abs() - 10.0).abs() < 1e-2));
}

// ============================================================================
// DIRECTIONAL FITTING
// ============================================================================

#[test]
fn test_up_vector_falls_back_near_vertical() {
    assert_eq!(light_up_vector(Vec3::new(1.0, -0.2, 0.0), 0.99), Vec3::Y);
    assert_eq!(light_up_vector(Vec3::NEG_Y, 0.99), Vec3::Z);
    assert_eq!(light_up_vector(Vec3::new(0.0, 5.0, 0.01), 0.99), Vec3::Z);
}

#[test]
fn test_fitted_volume_contains_every_corner() {
    let (view, projection) = camera();
    let corners = frustum_corners(&view, &projection);
    let light_space = fit_directional_light_space(Vec3::new(1.0, -1.0, 0.3), &corners, 50.0, 10.0, 0.99);

    for corner in &corners {
        let p = light_space.project_point3(*corner);
        assert!(p.x >= -1.0 - EPS && p.x <= 1.0 + EPS, "x {}", p.x);
        assert!(p.y >= -1.0 - EPS && p.y <= 1.0 + EPS, "y {}", p.y);
        assert!(p.z > 0.0 && p.z < 1.0, "z {}", p.z);
    }
}

#[test]
fn test_light_space_inverse_recovers_corners() {
    let (view, projection) = camera();
    let corners = frustum_corners(&view, &projection);

    for direction in [Vec3::new(1.0, -1.0, 0.3), Vec3::NEG_Y, Vec3::Y] {
        let light_space = fit_directional_light_space(direction, &corners, 50.0, 10.0, 0.99);
        let inverse = light_space.inverse();
        for corner in &corners {
            let back = inverse.project_point3(light_space.project_point3(*corner));
            assert!(back.distance(*corner) < 1e-2, "{:?}: {:?} -> {:?}", direction, corner, back);
        }
    }
}

#[test]
fn test_vertical_light_produces_finite_matrix() {
    let (view, projection) = camera();
    let corners = frustum_corners(&view, &projection);
    let light_space = fit_directional_light_space(Vec3::NEG_Y, &corners, 50.0, 10.0, 0.99);

    assert!(light_space.is_finite());
}

// ============================================================================
// POINT FACES
// ============================================================================

#[test]
fn test_face_order_and_ups() {
    let faces: Vec<CubeFace> = POINT_FACES.iter().map(|(face, ..)| *face).collect();
    assert_eq!(faces, CubeFace::ALL.to_vec());
    assert_eq!(POINT_FACES[2].2, Vec3::Z);
    assert_eq!(POINT_FACES[3].2, Vec3::NEG_Z);
}

#[test]
fn test_each_face_centers_its_axis() {
    let origin = Vec3::new(3.0, 1.0, -2.0);
    let matrices = point_face_matrices(origin, 0.1, 25.0);

    for (i, (_, axis, _)) in POINT_FACES.iter().enumerate() {
        let p = matrices[i].project_point3(origin + *axis * 5.0);
        assert!(p.x.abs() < EPS && p.y.abs() < EPS, "face {} -> {:?}", i, p);
        assert!(p.z > 0.0 && p.z < 1.0);
    }
}

#[test]
fn test_select_cube_face_dominant_axis() {
    assert_eq!(select_cube_face(Vec3::new(2.0, 1.0, 0.0)), CubeFace::PositiveX);
    assert_eq!(select_cube_face(Vec3::new(-2.0, 1.0, 0.0)), CubeFace::NegativeX);
    assert_eq!(select_cube_face(Vec3::new(0.0, -3.0, 1.0)), CubeFace::NegativeY);
    assert_eq!(select_cube_face(Vec3::new(0.1, 0.0, 4.0)), CubeFace::PositiveZ);
}

#[test]
fn test_select_cube_face_ties() {
    assert_eq!(select_cube_face(Vec3::new(1.0, 1.0, 1.0)), CubeFace::PositiveX);
    assert_eq!(select_cube_face(Vec3::new(0.0, 1.0, 1.0)), CubeFace::PositiveY);
    assert_eq!(select_cube_face(Vec3::ZERO), CubeFace::NegativeX);
}

#[test]
fn test_point_shadow_refreshes_lazily() {
    let mut shadow = PointShadow::new();
    let parent = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));

    assert!(shadow.refresh(10.0, 0.1, Vec3::X, parent));
    assert_eq!(shadow.world_position(), Vec3::new(1.0, 5.0, 0.0));
    assert!(!shadow.refresh(10.0, 0.1, Vec3::X, parent));

    assert!(shadow.refresh(12.0, 0.1, Vec3::X, parent));
    assert!(shadow.refresh(12.0, 0.1, Vec3::X, Mat4::IDENTITY));
    assert_eq!(shadow.world_position(), Vec3::X);

    shadow.invalidate();
    assert!(shadow.refresh(12.0, 0.1, Vec3::X, Mat4::IDENTITY));
}
