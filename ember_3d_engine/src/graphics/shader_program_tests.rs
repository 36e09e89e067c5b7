//! Unit tests for ShaderProgram bookkeeping

use crate::graphics::shader_program::{LocationLookup, ShaderProgram};
use crate::gpu::{GpuContext, MockGpuContext, ShaderStage, UniformLabel, UniformType};

fn built_program(ctx: &mut MockGpuContext, fragment: &str) -> ShaderProgram {
    let mut program = ShaderProgram::new("test", 4);
    let vs = ctx.compile_shader(ShaderStage::Vertex, "uniform mat4 u_model;").unwrap();
    let fs = ctx.compile_shader(ShaderStage::Fragment, fragment).unwrap();
    program.push_stage(ShaderStage::Vertex, vs).unwrap();
    program.push_stage(ShaderStage::Fragment, fs).unwrap();
    program.register_uniform("u_model", UniformType::Mat4).unwrap();
    program.register_uniform("point_lights[].color", UniformType::Vec3).unwrap();
    let handle = ctx.link_program(&[vs, fs]).unwrap();
    program.set_handle(handle);
    program
}

// ============================================================================
// REGISTRY TESTS
// ============================================================================

#[test]
fn test_samplers_take_consecutive_units() {
    let mut program = ShaderProgram::new("forward", 64);
    let albedo = program.register_uniform("material_texture_albedo", UniformType::Texture2D).unwrap();
    let shadows = program.register_uniform("point_light_shadow_maps", UniformType::Texture2DArray).unwrap();
    let energy = program.register_uniform("energy", UniformType::Float).unwrap();

    assert_eq!(albedo.texture_unit, Some(0));
    assert_eq!(shadows.texture_unit, Some(1));
    assert_eq!(energy.texture_unit, None);
    assert_eq!(program.texture_units_used(), 2);
}

#[test]
fn test_sampler_array_reserves_declared_length() {
    let mut program = ShaderProgram::new("forward", 64);
    let cookies = program.register_uniform("cookies[4]", UniformType::Texture2D).unwrap();
    let next = program.register_uniform("skybox_texture", UniformType::TextureCubeMap).unwrap();

    assert_eq!(cookies.texture_unit, Some(0));
    assert_eq!(cookies.length, 4);
    assert!(cookies.is_array);
    assert_eq!(next.texture_unit, Some(4));
}

#[test]
fn test_indexed_forms_share_one_entry() {
    let mut program = ShaderProgram::new("forward", 64);
    program.register_uniform("point_lights[].range", UniformType::Float).unwrap();
    program.register_uniform("point_lights[7].range", UniformType::Float).unwrap();

    assert_eq!(program.uniform_count(), 1);
    assert!(program.uniform("point_lights[2].range").is_some());
}

#[test]
fn test_conflicting_redeclaration_fails() {
    let mut program = ShaderProgram::new("forward", 64);
    program.register_uniform("energy", UniformType::Float).unwrap();
    assert!(program.register_uniform("energy", UniformType::Int).is_err());
}

#[test]
fn test_built_program_rejects_changes() {
    let mut ctx = MockGpuContext::new();
    let mut program = built_program(&mut ctx, "uniform Light point_lights[4];");
    assert!(program.is_built());
    assert!(program.register_uniform("late", UniformType::Float).is_err());
    let shader = ctx.compile_shader(ShaderStage::Vertex, "void main() {}").unwrap();
    assert!(program.push_stage(ShaderStage::Vertex, shader).is_err());
}

// ============================================================================
// LOCATION CACHE TESTS
// ============================================================================

#[test]
fn test_location_lookup_outcomes() {
    let mut ctx = MockGpuContext::new();
    let mut program = built_program(&mut ctx, "uniform float other;");

    let model = UniformLabel::parse("u_model");
    assert!(matches!(program.location(&mut ctx, &model, "u_model"), LocationLookup::Bound(_)));

    let light = UniformLabel::parse("point_lights[0].color");
    assert_eq!(program.location(&mut ctx, &light, "point_lights[0].color"), LocationLookup::Unbound);

    let unknown = UniformLabel::parse("fog_color");
    assert_eq!(program.location(&mut ctx, &unknown, "fog_color"), LocationLookup::Unregistered);
}

#[test]
fn test_cached_location_is_stable_per_element() {
    let mut ctx = MockGpuContext::new();
    let mut program = built_program(&mut ctx, "uniform Light point_lights[4];");

    let first = UniformLabel::parse("point_lights[1].color");
    let a = program.location(&mut ctx, &first, "point_lights[1].color");
    let b = program.location(&mut ctx, &first, "point_lights[1].color");
    let other = UniformLabel::parse("point_lights[2].color");
    let c = program.location(&mut ctx, &other, "point_lights[2].color");

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_symbolic_index_does_not_take_slot_zero() {
    let mut ctx = MockGpuContext::new();
    let mut program = built_program(&mut ctx, "uniform Light point_lights[4];");

    let symbolic = UniformLabel::parse("point_lights[i].color");
    assert_eq!(symbolic.index, None);
    let a = program.location(&mut ctx, &symbolic, "point_lights[i].color");
    let first = UniformLabel::parse("point_lights[0].color");
    let b = program.location(&mut ctx, &first, "point_lights[0].color");

    assert!(matches!(a, LocationLookup::Bound(_)));
    assert!(matches!(b, LocationLookup::Bound(_)));
    assert_ne!(a, b);
}

#[test]
fn test_elements_beyond_bound_are_still_resolved() {
    let mut ctx = MockGpuContext::new();
    let mut program = built_program(&mut ctx, "uniform Light point_lights[16];");

    let far = UniformLabel::parse("point_lights[9].color");
    assert!(matches!(
        program.location(&mut ctx, &far, "point_lights[9].color"),
        LocationLookup::Bound(_)
    ));
}

#[test]
fn test_unresolved_uniforms_after_link() {
    let mut ctx = MockGpuContext::new();
    let mut program = built_program(&mut ctx, "uniform float other;");
    assert_eq!(program.unresolved_uniforms(&mut ctx), vec!["point_lights[0].color".to_string()]);
}

#[test]
fn test_first_warning_only_once() {
    let mut program = ShaderProgram::new("forward", 64);
    assert!(program.first_warning("fog_color"));
    assert!(!program.first_warning("fog_color"));
}
