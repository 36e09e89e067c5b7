//! Unit tests for config.rs

use crate::config::{EngineConfig, GraphicsConfig};
use glam::Vec4;

#[test]
fn test_graphics_config_defaults() {
    let config = GraphicsConfig::default();
    assert_eq!(config.directional_z_margin, 10.0);
    assert_eq!(config.up_fallback_threshold, 0.99);
    assert_eq!(config.point_shadow_near, 0.1);
    assert_eq!(config.max_point_lights, 10);
    assert_eq!(config.max_spot_lights, 10);
    assert_eq!(config.max_directional_lights, 10);
    assert_eq!(config.clear_color, Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(config.uniform_array_bound, 64);
}

#[test]
fn test_graphics_config_builders() {
    let config = GraphicsConfig::default()
        .with_shadow_map_size(0)
        .with_light_capacity(4)
        .with_max_delta_time(-1.0)
        .with_directional_z_margin(25.0);
    assert_eq!(config.shadow_map_size, 1);
    assert_eq!(config.max_point_lights, 4);
    assert_eq!(config.max_spot_lights, 4);
    assert_eq!(config.max_directional_lights, 4);
    assert_eq!(config.max_delta_time, 0.0);
    assert_eq!(config.directional_z_margin, 25.0);
}

#[test]
fn test_engine_config_builders() {
    let config = EngineConfig::default()
        .with_title("demo")
        .with_size(640, 480)
        .with_graphics(GraphicsConfig::default().with_shadow_map_size(512));
    assert_eq!(config.title, "demo");
    assert_eq!((config.width, config.height), (640, 480));
    assert_eq!(config.graphics.shadow_map_size, 512);
}
