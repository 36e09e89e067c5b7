//! Unit tests for MockGpuContext

use crate::gpu::*;
use glam::Vec3;

fn linked_program(ctx: &mut MockGpuContext, fragment: &str) -> GpuProgram {
    let vs = ctx.compile_shader(ShaderStage::Vertex, "in vec3 a_position; uniform mat4 u_model;").unwrap();
    let fs = ctx.compile_shader(ShaderStage::Fragment, fragment).unwrap();
    ctx.link_program(&[vs, fs]).unwrap()
}

// ============================================================================
// PROGRAM TESTS
// ============================================================================

#[test]
fn test_empty_source_fails_to_compile() {
    let mut ctx = MockGpuContext::new();
    let result = ctx.compile_shader(ShaderStage::Fragment, "   ");
    assert!(matches!(result, Err(crate::ember3d::Error::ShaderCompilation(_))));
}

#[test]
fn test_link_requires_both_stages() {
    let mut ctx = MockGpuContext::new();
    let vs = ctx.compile_shader(ShaderStage::Vertex, "void main() {}").unwrap();
    assert!(ctx.link_program(&[vs]).is_err());
}

#[test]
fn test_uniform_location_resolves_only_declared_names() {
    let mut ctx = MockGpuContext::new();
    let program = linked_program(&mut ctx, "uniform vec3 camera_position;");
    let a = ctx.uniform_location(program, "camera_position");
    let b = ctx.uniform_location(program, "camera_position");
    assert!(a.is_some());
    assert_eq!(a, b);
    assert!(ctx.uniform_location(program, "shadow_map_size").is_none());
}

#[test]
fn test_array_elements_get_distinct_locations() {
    let mut ctx = MockGpuContext::new();
    let program = linked_program(&mut ctx, "uniform Light point_lights[10];");
    let first = ctx.uniform_location(program, "point_lights[0].color").unwrap();
    let second = ctx.uniform_location(program, "point_lights[1].color").unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_uniform_round_trip_through_introspection() {
    let mut ctx = MockGpuContext::new();
    let program = linked_program(&mut ctx, "uniform vec3 light_color;");
    let location = ctx.uniform_location(program, "light_color").unwrap();
    ctx.use_program(Some(program));
    let data = UniformValue::from(Vec3::new(0.25, 0.5, 1.0)).to_data().unwrap();
    ctx.set_uniform(location, &data, false);
    assert_eq!(ctx.uniform_value(program, location), Some(data));
}

#[test]
fn test_set_uniform_without_program_is_ignored() {
    let mut ctx = MockGpuContext::new();
    let program = linked_program(&mut ctx, "uniform float energy;");
    let location = ctx.uniform_location(program, "energy").unwrap();
    ctx.set_uniform(location, &UniformData::Float { components: 1, values: vec![2.0] }, false);
    assert_eq!(ctx.uniform_value(program, location), None);
}

#[test]
fn test_transposed_matrix_upload() {
    let mut ctx = MockGpuContext::new();
    let program = linked_program(&mut ctx, "uniform mat2 u_rot;");
    let location = ctx.uniform_location(program, "u_rot").unwrap();
    ctx.use_program(Some(program));
    let data = UniformData::Matrix { dimension: 2, values: vec![1.0, 2.0, 3.0, 4.0] };
    ctx.set_uniform(location, &data, true);
    assert_eq!(
        ctx.uniform_value(program, location),
        Some(UniformData::Matrix { dimension: 2, values: vec![1.0, 3.0, 2.0, 4.0] })
    );
}

// ============================================================================
// FRAMEBUFFER TESTS
// ============================================================================

#[test]
fn test_framebuffer_without_attachments_is_incomplete() {
    let mut ctx = MockGpuContext::new();
    let fb = ctx.create_framebuffer().unwrap();
    ctx.bind_framebuffer(Some(fb));
    assert_eq!(ctx.framebuffer_status(), FramebufferStatus::IncompleteMissingAttachment);
}

#[test]
fn test_layer_attachment_status() {
    let mut ctx = MockGpuContext::new();
    let atlas = ctx.create_texture(&TextureDesc::depth_array(64, 64, 2)).unwrap();
    let fb = ctx.create_framebuffer().unwrap();
    ctx.bind_framebuffer(Some(fb));

    ctx.attach_texture(AttachmentPoint::Depth, atlas, AttachmentTarget::Layer(1), 0);
    assert_eq!(ctx.framebuffer_status(), FramebufferStatus::Complete);

    ctx.attach_texture(AttachmentPoint::Depth, atlas, AttachmentTarget::Layer(3), 0);
    assert_eq!(ctx.framebuffer_status(), FramebufferStatus::IncompleteAttachment);
    assert_eq!(ctx.attachments(fb).len(), 1);
}

#[test]
fn test_forced_status() {
    let mut ctx = MockGpuContext::new();
    ctx.force_framebuffer_status(Some(FramebufferStatus::Unsupported));
    assert_eq!(ctx.framebuffer_status(), FramebufferStatus::Unsupported);
}

#[test]
fn test_draw_records_depth_layer_and_state() {
    let mut ctx = MockGpuContext::new();
    let atlas = ctx.create_texture(&TextureDesc::depth_array(64, 64, 6)).unwrap();
    let fb = ctx.create_framebuffer().unwrap();
    ctx.bind_framebuffer(Some(fb));
    ctx.attach_texture(AttachmentPoint::Depth, atlas, AttachmentTarget::Layer(4), 0);
    ctx.set_cull_face(Some(CullFace::Front));

    let mesh_data = MeshData { positions: vec![Vec3::ZERO], ..Default::default() };
    let mesh = ctx.create_mesh(&mesh_data, &VertexLayout::default()).unwrap();
    ctx.draw_mesh(mesh);

    let call = &ctx.draw_calls()[0];
    assert_eq!(call.depth_layer, Some(4));
    assert_eq!(call.framebuffer, Some(fb));
    assert_eq!(call.state.cull_face, Some(CullFace::Front));
}

#[test]
fn test_resource_counters() {
    let mut ctx = MockGpuContext::new();
    let texture = ctx.create_texture(&TextureDesc::color(4, 4, None)).unwrap();
    assert_eq!(ctx.live_textures(), 1);
    ctx.bind_texture(0, TextureKind::Color, texture);
    ctx.delete_texture(texture);
    assert_eq!(ctx.live_textures(), 0);
    assert_eq!(ctx.bound_texture(0), None);
}
