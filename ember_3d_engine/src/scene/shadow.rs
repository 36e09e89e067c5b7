/// Shadow projection math.
///
/// Directional lights fit an orthographic volume around the camera frustum.
/// Point lights render six 90 degree perspective faces into consecutive
/// atlas layers. Both produce depth in [0, 1].

use glam::{Mat4, Vec3, Vec4};
use crate::gpu::CubeFace;

/// Look direction and up vector of each point-light face, in atlas order
pub const POINT_FACES: [(CubeFace, Vec3, Vec3); 6] = [
    (CubeFace::PositiveX, Vec3::X, Vec3::Y),
    (CubeFace::NegativeX, Vec3::NEG_X, Vec3::Y),
    (CubeFace::PositiveY, Vec3::Y, Vec3::Z),
    (CubeFace::NegativeY, Vec3::NEG_Y, Vec3::NEG_Z),
    (CubeFace::PositiveZ, Vec3::Z, Vec3::Y),
    (CubeFace::NegativeZ, Vec3::NEG_Z, Vec3::Y),
];

/// World-space corners of the frustum described by `projection * view`
///
/// `projection` is expected to be GL-style (NDC z in [-1, 1]).
pub fn frustum_corners(view: &Mat4, projection: &Mat4) -> [Vec3; 8] {
    let inverse = (*projection * *view).inverse();
    let mut corners = [Vec3::ZERO; 8];
    let mut i = 0;
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                let p = inverse * Vec4::new(x, y, z, 1.0);
                corners[i] = p.truncate() / p.w;
                i += 1;
            }
        }
    }
    corners
}

/// Up vector for a light view looking along `direction`
pub fn light_up_vector(direction: Vec3, threshold: f32) -> Vec3 {
    if direction.normalize_or_zero().dot(Vec3::Y).abs() > threshold {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Orthographic light-space matrix covering `corners`
///
/// The eye sits at `centroid - direction * radius`, where radius is the
/// corners' bounding radius divided by the camera far plane. The depth
/// range is padded by `z_margin` on both ends.
pub fn fit_directional_light_space(
    direction: Vec3,
    corners: &[Vec3; 8],
    camera_far: f32,
    z_margin: f32,
    up_threshold: f32,
) -> Mat4 {
    let direction = direction.normalize_or_zero();
    let centroid = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
    let radius = corners
        .iter()
        .map(|c| c.distance(centroid))
        .fold(0.0f32, f32::max)
        / camera_far.max(f32::EPSILON);

    let up = light_up_vector(direction, up_threshold);
    let light_view = Mat4::look_at_rh(centroid - direction * radius, centroid, up);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for corner in corners {
        let p = light_view.transform_point3(*corner);
        min = min.min(p);
        max = max.max(p);
    }
    min.z -= z_margin;
    max.z += z_margin;

    // Right-handed view space looks down -Z: near/far are the negated bounds
    let projection = Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -max.z, -min.z);
    projection * light_view
}

/// Light-space matrices of the six faces of a point light at `position`
pub fn point_face_matrices(position: Vec3, near: f32, range: f32) -> [Mat4; 6] {
    let projection = Mat4::perspective_rh(90f32.to_radians(), 1.0, near, range.max(near + f32::EPSILON));
    POINT_FACES.map(|(_, axis, up)| projection * Mat4::look_at_rh(position, position + axis, up))
}

/// Face a direction from the light falls on
///
/// Dominant axis wins, ties prefer X then Y. A zero or negative component
/// selects the negative face.
pub fn select_cube_face(direction: Vec3) -> CubeFace {
    let a = direction.abs();
    if a.x >= a.y && a.x >= a.z {
        if direction.x > 0.0 { CubeFace::PositiveX } else { CubeFace::NegativeX }
    } else if a.y >= a.z {
        if direction.y > 0.0 { CubeFace::PositiveY } else { CubeFace::NegativeY }
    } else if direction.z > 0.0 {
        CubeFace::PositiveZ
    } else {
        CubeFace::NegativeZ
    }
}

/// Cached face matrices of one point light
///
/// Recomputed only when the range, the local position or the parent's
/// world matrix changed since the last refresh.
#[derive(Debug, Clone, Default)]
pub struct PointShadow {
    faces: [Mat4; 6],
    key: Option<(f32, Vec3, Mat4)>,
    world_position: Vec3,
}

impl PointShadow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the face matrices, returns whether they were recomputed
    pub fn refresh(&mut self, range: f32, near: f32, local_position: Vec3, parent_world: Mat4) -> bool {
        let key = (range, local_position, parent_world);
        if self.key == Some(key) {
            return false;
        }
        self.world_position = parent_world.transform_point3(local_position);
        self.faces = point_face_matrices(self.world_position, near, range);
        self.key = Some(key);
        true
    }

    pub fn faces(&self) -> &[Mat4; 6] {
        &self.faces
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Force a recompute on the next refresh
    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
#[path = "shadow_tests.rs"]
mod tests;
