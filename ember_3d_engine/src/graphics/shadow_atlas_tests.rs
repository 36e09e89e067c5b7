//! Unit tests for shadow atlas sizing

use crate::graphics::shadow_atlas::{ShadowAtlas, ShadowAtlasKind};
use crate::gpu::TextureKey;

#[test]
fn test_required_layers_never_zero() {
    assert_eq!(ShadowAtlasKind::Directional.required_layers(0), 1);
    assert_eq!(ShadowAtlasKind::Point.required_layers(0), 1);
}

#[test]
fn test_required_layers_per_kind() {
    assert_eq!(ShadowAtlasKind::Directional.required_layers(3), 3);
    assert_eq!(ShadowAtlasKind::Point.required_layers(3), 18);
}

#[test]
fn test_layer_offsets_are_contiguous() {
    let atlas = ShadowAtlas::new(ShadowAtlasKind::Point, TextureKey::default(), 512, 3);
    let offsets: Vec<u32> = (0..3).map(|slot| atlas.layer_offset(slot)).collect();
    assert_eq!(offsets, vec![0, 6, 12]);
    assert_eq!(atlas.layers(), 18);
}

#[test]
fn test_needs_resize_on_roster_change() {
    let atlas = ShadowAtlas::new(ShadowAtlasKind::Directional, TextureKey::default(), 512, 2);
    assert!(!atlas.needs_resize(2));
    assert!(atlas.needs_resize(1));
    assert!(atlas.needs_resize(3));
}

#[test]
fn test_resource_names_differ() {
    assert_ne!(
        ShadowAtlasKind::Directional.resource_name(),
        ShadowAtlasKind::Point.resource_name()
    );
}
