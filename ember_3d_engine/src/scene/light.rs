/// Lights and the per-frame light snapshot fed to the forward pass.
///
/// Light nodes register into per-kind scene registries when they gain a
/// parent. Their registry slot is also their shadow atlas slot, so slots
/// stay contiguous as lights come and go.

use glam::{Mat4, Vec3};
use crate::graphics::{BoundingSphere, GraphicsManager};
use crate::gpu::TextureKey;
use super::shadow::PointShadow;

/// Coefficients shared by every light kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProperties {
    pub color: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    /// Radiant flux
    pub energy: f32,
}

impl LightProperties {
    pub fn new(color: Vec3) -> Self {
        Self {
            color,
            ambient: 0.1,
            diffuse: 1.0,
            specular: 0.5,
            energy: 1.0,
        }
    }

    fn write(&self, gm: &mut GraphicsManager, prefix: &str) {
        gm.set_uniform(&format!("{}.color", prefix), self.color);
        gm.set_uniform(&format!("{}.ambient", prefix), self.ambient);
        gm.set_uniform(&format!("{}.diffuse", prefix), self.diffuse);
        gm.set_uniform(&format!("{}.specular", prefix), self.specular);
        gm.set_uniform(&format!("{}.energy", prefix), self.energy);
    }
}

impl Default for LightProperties {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}

/// Registry a light belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Point,
    Spot,
    Directional,
}

/// Kind-specific light data
#[derive(Debug, Clone)]
pub enum LightSource {
    Point {
        range: f32,
        shadow: PointShadow,
    },
    Spot {
        range: f32,
        cookie_radius: f32,
    },
    Directional {
        /// Fitted each frame before the directional shadow pass
        light_space: Mat4,
    },
}

/// A light attached to a 3D node
#[derive(Debug, Clone)]
pub struct Light {
    pub properties: LightProperties,
    pub source: LightSource,
}

impl Light {
    pub fn point(properties: LightProperties, range: f32) -> Self {
        Self {
            properties,
            source: LightSource::Point { range, shadow: PointShadow::new() },
        }
    }

    pub fn spot(properties: LightProperties, range: f32, cookie_radius: f32) -> Self {
        Self {
            properties,
            source: LightSource::Spot { range, cookie_radius },
        }
    }

    pub fn directional(properties: LightProperties) -> Self {
        Self {
            properties,
            source: LightSource::Directional { light_space: Mat4::IDENTITY },
        }
    }

    pub fn kind(&self) -> LightKind {
        match self.source {
            LightSource::Point { .. } => LightKind::Point,
            LightSource::Spot { .. } => LightKind::Spot,
            LightSource::Directional { .. } => LightKind::Directional,
        }
    }

    /// Range of point and spot lights
    pub fn range(&self) -> Option<f32> {
        match self.source {
            LightSource::Point { range, .. } | LightSource::Spot { range, .. } => Some(range),
            LightSource::Directional { .. } => None,
        }
    }

    pub fn set_range(&mut self, value: f32) {
        match &mut self.source {
            LightSource::Point { range, .. } | LightSource::Spot { range, .. } => *range = value,
            LightSource::Directional { .. } => {}
        }
    }
}

/// Direction a directional light shines along: its world rotation applied to +X
pub fn light_direction(world: &Mat4) -> Vec3 {
    let (_, rotation, _) = world.to_scale_rotation_translation();
    (rotation.normalize() * Vec3::X).normalize_or_zero()
}

/// Pure rotation part of a world matrix
pub fn world_rotation_matrix(world: &Mat4) -> Mat4 {
    let (_, rotation, _) = world.to_scale_rotation_translation();
    Mat4::from_quat(rotation.normalize())
}

// ============================================================================
// Frame snapshot
// ============================================================================

#[derive(Debug, Clone)]
pub struct PointLightState {
    pub properties: LightProperties,
    pub position: Vec3,
    pub range: f32,
    /// First of the six atlas layers
    pub shadow_layer: u32,
    pub faces: [Mat4; 6],
}

#[derive(Debug, Clone)]
pub struct SpotLightState {
    pub properties: LightProperties,
    pub position: Vec3,
    pub rotation: Mat4,
    pub range: f32,
    pub cookie_radius: f32,
}

#[derive(Debug, Clone)]
pub struct DirectionalLightState {
    pub properties: LightProperties,
    pub direction: Vec3,
    pub rotation: Mat4,
    pub shadow_layer: u32,
    pub light_space: Mat4,
}

/// World-space state of every registered light for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameLights {
    pub point: Vec<PointLightState>,
    pub spot: Vec<SpotLightState>,
    pub directional: Vec<DirectionalLightState>,
    pub ambient_light: Vec3,
    pub camera_position: Vec3,
    pub point_atlas: Option<TextureKey>,
    pub directional_atlas: Option<TextureKey>,
    pub shadow_map_size: f32,
}

impl FrameLights {
    /// Write the light uniforms of the active program for one object
    ///
    /// Point lights that cannot reach `bounds` are skipped. Lights past the
    /// configured array capacity are dropped. Every count is written, zero
    /// included.
    pub fn write_uniforms(&self, gm: &mut GraphicsManager, bounds: Option<BoundingSphere>) {
        gm.set_uniform("camera_position", self.camera_position);
        gm.set_uniform("environment.ambient_light", self.ambient_light);
        gm.set_uniform("shadow_map_size", self.shadow_map_size);

        let capacity = gm.config().max_point_lights;
        let mut count = 0usize;
        for light in &self.point {
            if count >= capacity {
                break;
            }
            if let Some(sphere) = bounds {
                if sphere.center.distance(light.position) - sphere.radius >= light.range {
                    continue;
                }
            }
            let prefix = format!("point_lights[{}]", count);
            light.properties.write(gm, &prefix);
            gm.set_uniform(&format!("{}.position", prefix), light.position);
            gm.set_uniform(&format!("{}.range", prefix), light.range);
            gm.set_uniform(&format!("{}.shadow_layer", prefix), light.shadow_layer as i32);
            for (face, matrix) in light.faces.iter().enumerate() {
                gm.set_uniform(&format!("u_point_light_space_matrix[{}]", count * 6 + face), *matrix);
            }
            count += 1;
        }
        gm.set_uniform("point_lights_count", count as i32);

        let capacity = gm.config().max_spot_lights;
        let mut count = 0usize;
        for light in self.spot.iter().take(capacity) {
            let prefix = format!("spot_lights[{}]", count);
            light.properties.write(gm, &prefix);
            gm.set_uniform(&format!("{}.position", prefix), light.position);
            gm.set_uniform(&format!("{}.rotation", prefix), light.rotation);
            gm.set_uniform(&format!("{}.range", prefix), light.range);
            gm.set_uniform(&format!("{}.cookie_radius", prefix), light.cookie_radius);
            count += 1;
        }
        gm.set_uniform("spot_lights_count", count as i32);

        let capacity = gm.config().max_directional_lights;
        let mut count = 0usize;
        for light in self.directional.iter().take(capacity) {
            let prefix = format!("directional_lights[{}]", count);
            light.properties.write(gm, &prefix);
            gm.set_uniform(&format!("{}.direction", prefix), light.direction);
            gm.set_uniform(&format!("{}.rotation", prefix), light.rotation);
            gm.set_uniform(&format!("{}.shadow_layer", prefix), light.shadow_layer as i32);
            gm.set_uniform(&format!("u_directional_light_space_matrix[{}]", count), light.light_space);
            count += 1;
        }
        gm.set_uniform("directional_lights_count", count as i32);

        if let Some(atlas) = self.point_atlas {
            gm.set_uniform("point_light_shadow_maps", atlas);
        }
        if let Some(atlas) = self.directional_atlas {
            gm.set_uniform("directional_light_shadow_maps", atlas);
        }
    }
}
