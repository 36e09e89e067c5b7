//! Engine configuration
//!
//! Plain structs with `Default` values and `with_*` builder setters.

use glam::Vec4;
use crate::graphics::programs::{DIRECTIONAL_SHADOW_PROGRAM, POINT_SHADOW_PROGRAM};

/// Rendering parameters consumed by `GraphicsManager`
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsConfig {
    /// Edge length of every shadow atlas layer, in texels
    pub shadow_map_size: u32,
    /// Padding added to both ends of a directional light's depth range
    pub directional_z_margin: f32,
    /// |dot(direction, +Y)| above which the light view falls back to +Z up
    pub up_fallback_threshold: f32,
    /// Near plane of the six point-light face projections
    pub point_shadow_near: f32,
    /// Capacity of the `point_lights[]` shader array
    pub max_point_lights: usize,
    /// Capacity of the `spot_lights[]` shader array
    pub max_spot_lights: usize,
    /// Capacity of the `directional_lights[]` shader array
    pub max_directional_lights: usize,
    /// Upper bound on the per-frame delta time, in seconds
    pub max_delta_time: f32,
    /// Back buffer clear color
    pub clear_color: Vec4,
    /// Number of cached element locations per array uniform
    pub uniform_array_bound: usize,
    /// Program used by the point-light shadow pass
    pub point_shadow_program: String,
    /// Program used by the directional shadow pass
    pub directional_shadow_program: String,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: 1024,
            directional_z_margin: 10.0,
            up_fallback_threshold: 0.99,
            point_shadow_near: 0.1,
            max_point_lights: 10,
            max_spot_lights: 10,
            max_directional_lights: 10,
            max_delta_time: 0.1,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            uniform_array_bound: 64,
            point_shadow_program: POINT_SHADOW_PROGRAM.to_string(),
            directional_shadow_program: DIRECTIONAL_SHADOW_PROGRAM.to_string(),
        }
    }
}

impl GraphicsConfig {
    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size.max(1);
        self
    }

    pub fn with_directional_z_margin(mut self, margin: f32) -> Self {
        self.directional_z_margin = margin;
        self
    }

    /// Set the capacity of all three light arrays
    pub fn with_light_capacity(mut self, capacity: usize) -> Self {
        self.max_point_lights = capacity;
        self.max_spot_lights = capacity;
        self.max_directional_lights = capacity;
        self
    }

    pub fn with_max_delta_time(mut self, seconds: f32) -> Self {
        self.max_delta_time = seconds.max(0.0);
        self
    }

    pub fn with_clear_color(mut self, color: Vec4) -> Self {
        self.clear_color = color;
        self
    }
}

/// Host window parameters for `Engine::run`
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub graphics: GraphicsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "ember3d".to_string(),
            width: 1280,
            height: 720,
            graphics: GraphicsConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_graphics(mut self, graphics: GraphicsConfig) -> Self {
        self.graphics = graphics;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
