/// Local transforms carried by scene nodes.
///
/// 3D and 2D transforms compose independently: a node's world matrix only
/// picks up ancestors of its own dimensionality.

use glam::{Mat4, Quat, Vec2, Vec3};

/// Position, rotation and scale of a 3D node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform3D {
    pub const IDENTITY: Transform3D = Transform3D {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// T * R * S
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotate the node so its -Z axis points at `target`
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() <= f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.rotation = rotation;
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position, rotation (radians, around +Z) and scale of a 2D node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// T * R * S embedded in the XY plane
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation),
            self.position.extend(0.0),
        )
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform component of a node
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NodeTransform {
    /// Plain container, passes its parent's matrices through
    #[default]
    None,
    Spatial(Transform3D),
    Planar(Transform2D),
}

impl NodeTransform {
    pub fn as_3d(&self) -> Option<&Transform3D> {
        match self {
            NodeTransform::Spatial(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_3d_mut(&mut self) -> Option<&mut Transform3D> {
        match self {
            NodeTransform::Spatial(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_2d(&self) -> Option<&Transform2D> {
        match self {
            NodeTransform::Planar(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_2d_mut(&mut self) -> Option<&mut Transform2D> {
        match self {
            NodeTransform::Planar(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
