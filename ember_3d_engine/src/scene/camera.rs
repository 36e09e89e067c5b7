/// Camera3D - perspective lens attached to a 3D node.
///
/// The camera holds lens parameters only. Its placement comes from the
/// node's world matrix: view = inverse(world).

use glam::Mat4;

/// Perspective camera lens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    /// Vertical field of view, in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(fov: f32, near: f32, far: f32) -> Self {
        Self { fov, near, far }
    }

    /// GL-style perspective (NDC z in [-1, 1])
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect_ratio, self.near, self.far)
    }

    /// View matrix for a camera placed at `world`
    pub fn view(world: &Mat4) -> Mat4 {
        world.inverse()
    }
}

impl Default for Camera3D {
    /// 60 degree field of view, 0.1 to 1000
    fn default() -> Self {
        Self::new(60f32.to_radians(), 0.1, 1000.0)
    }
}
