//! Unit tests for DrawFlags and AttachmentDesc validation

use crate::graphics::framebuffer::{AttachmentDesc, AttachmentType, DrawFlags};
use crate::gpu::{
    AttachmentPoint, AttachmentTarget, CubeFace, CullFace, DepthFunc, FixedFunctionState,
    GpuTexture, Texture, TextureDesc, TextureKey,
};
use crate::ember3d::Error;

fn depth_array(layers: u32) -> Texture {
    Texture::new("atlas", &TextureDesc::depth_array(256, 256, layers), GpuTexture(1))
}

// ============================================================================
// DRAW FLAG TESTS
// ============================================================================

#[test]
fn test_single_cull_and_depth_func_are_valid() {
    let flags = DrawFlags::DEPTH_TEST | DrawFlags::CULL_BACK | DrawFlags::DEPTH_FUNC_LESS_EQUAL;
    assert!(flags.validate().is_ok());
}

#[test]
fn test_two_cull_modes_rejected() {
    let flags = DrawFlags::CULL_FRONT | DrawFlags::CULL_BACK;
    assert!(matches!(flags.validate(), Err(Error::UnsupportedDrawFlags(_))));
}

#[test]
fn test_two_depth_funcs_rejected() {
    let flags = DrawFlags::DEPTH_FUNC_LESS | DrawFlags::DEPTH_FUNC_ALWAYS;
    assert!(matches!(flags.validate(), Err(Error::UnsupportedDrawFlags(_))));
}

#[test]
fn test_flag_decoding() {
    assert_eq!(DrawFlags::CULL_FRONT_AND_BACK.cull_face(), Some(CullFace::FrontAndBack));
    assert_eq!(DrawFlags::DEPTH_TEST.cull_face(), None);
    assert_eq!(DrawFlags::DEPTH_FUNC_GREATER_EQUAL.depth_func(), Some(DepthFunc::GreaterEqual));
    assert_eq!(DrawFlags::empty().depth_func(), None);
}

#[test]
fn test_shadow_flags() {
    let flags = DrawFlags::SHADOW;
    assert!(flags.validate().is_ok());
    assert!(flags.contains(DrawFlags::DEPTH_TEST));
    assert_eq!(flags.cull_face(), Some(CullFace::Front));
    assert_eq!(flags.depth_func(), Some(DepthFunc::Less));
    assert!(flags.contains(DrawFlags::FORCE_WRITE_DEPTH));
}

#[test]
fn test_apply_to_keeps_unrequested_state() {
    let current = FixedFunctionState {
        depth_test: true,
        depth_func: DepthFunc::Greater,
        cull_face: Some(CullFace::Back),
        depth_write: false,
    };
    let applied = DrawFlags::empty().apply_to(current);
    assert!(!applied.depth_test);
    assert_eq!(applied.depth_func, DepthFunc::Greater);
    assert_eq!(applied.cull_face, None);
    assert!(!applied.depth_write);

    let forced = DrawFlags::FORCE_WRITE_DEPTH.apply_to(current);
    assert!(forced.depth_write);
}

// ============================================================================
// ATTACHMENT TESTS
// ============================================================================

#[test]
fn test_layer_inside_array_is_valid() {
    let desc = AttachmentDesc::depth_layer("depth", TextureKey::default(), 1);
    assert!(desc.validate(&depth_array(2)).is_ok());
    assert_eq!(desc.target(), AttachmentTarget::Layer(1));
    assert_eq!(desc.point(0), AttachmentPoint::Depth);
}

#[test]
fn test_layer_past_array_end_fails() {
    let desc = AttachmentDesc::depth_layer("depth", TextureKey::default(), 3);
    assert!(matches!(desc.validate(&depth_array(2)), Err(Error::UnsupportedAttachment(_))));
}

#[test]
fn test_type_texture_mismatch_fails() {
    let color = Texture::new("albedo", &TextureDesc::color(64, 64, None), GpuTexture(2));
    let desc = AttachmentDesc::depth("depth", TextureKey::default());
    assert!(desc.validate(&color).is_err());
    assert!(AttachmentDesc::color("albedo", TextureKey::default()).validate(&color).is_ok());
}

#[test]
fn test_mip_level_range() {
    let color = Texture::new("albedo", &TextureDesc::color(64, 64, None), GpuTexture(2));
    assert!(AttachmentDesc::color("c", TextureKey::default()).with_mip_level(6).validate(&color).is_ok());
    assert!(AttachmentDesc::color("c", TextureKey::default()).with_mip_level(7).validate(&color).is_err());
}

#[test]
fn test_cube_face_target() {
    let cube = Texture::new("env", &TextureDesc::cube_map(32, None), GpuTexture(3));
    let desc = AttachmentDesc::cube_face("face", TextureKey::default(), CubeFace::NegativeY);
    assert!(desc.validate(&cube).is_ok());
    assert_eq!(desc.target(), AttachmentTarget::CubeFace(CubeFace::NegativeY));
    assert_eq!(desc.point(2), AttachmentPoint::Color(2));
    assert!(AttachmentType::CubeMapFace.is_color());
}
