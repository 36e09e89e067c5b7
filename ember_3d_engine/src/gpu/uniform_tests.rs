//! Unit tests for uniform.rs

use crate::gpu::{UniformData, UniformLabel, UniformType, UniformValue};
use glam::{IVec3, Mat4, Vec3};

// ============================================================================
// LABEL TESTS
// ============================================================================

#[test]
fn test_plain_label_is_unchanged() {
    let label = UniformLabel::parse("camera_position");
    assert_eq!(label.canonical, "camera_position");
    assert_eq!(label.index, None);
    assert!(!label.is_array);
    assert_eq!(label.slot(), 0);
}

#[test]
fn test_indexed_struct_member_normalizes() {
    let a = UniformLabel::parse("point_lights[3].color");
    let b = UniformLabel::parse("point_lights[0].color");
    assert_eq!(a.canonical, "point_lights[].color");
    assert_eq!(a.canonical, b.canonical);
    assert_eq!(a.index, Some(3));
    assert_eq!(b.index, Some(0));
    assert!(a.is_array);
    assert!(!a.nested);
}

#[test]
fn test_empty_brackets_declare_array() {
    let label = UniformLabel::parse("u_point_light_space_matrix[]");
    assert_eq!(label.canonical, "u_point_light_space_matrix[]");
    assert_eq!(label.index, None);
    assert!(label.is_array);
}

#[test]
fn test_first_index_wins_for_nested_arrays() {
    let label = UniformLabel::parse("cascades[2].splits[5]");
    assert_eq!(label.canonical, "cascades[].splits[]");
    assert_eq!(label.index, Some(2));
    assert_eq!(label.slot(), 2);
    assert!(label.nested);
}

// ============================================================================
// VALUE TESTS
// ============================================================================

#[test]
fn test_value_type_matching() {
    assert!(UniformValue::from(1.0f32).matches(UniformType::Float));
    assert!(!UniformValue::from(1.0f32).matches(UniformType::Int));
    assert!(UniformValue::from(true).matches(UniformType::Bool));
    assert!(UniformValue::from(Vec3::ONE).matches(UniformType::Vec3));
    assert!(UniformValue::from(vec![Mat4::IDENTITY; 6]).matches(UniformType::Mat4));
    assert!(!UniformValue::from(Mat4::IDENTITY).matches(UniformType::Struct));
}

#[test]
fn test_vec3_flattens_to_three_floats() {
    let data = UniformValue::from(Vec3::new(1.0, 2.0, 3.0)).to_data();
    assert_eq!(data, Some(UniformData::Float { components: 3, values: vec![1.0, 2.0, 3.0] }));
}

#[test]
fn test_ivec3_and_bool_flatten_to_ints() {
    assert_eq!(
        UniformValue::from(IVec3::new(4, 5, 6)).to_data(),
        Some(UniformData::Int { components: 3, values: vec![4, 5, 6] })
    );
    assert_eq!(
        UniformValue::from(true).to_data(),
        Some(UniformData::Int { components: 1, values: vec![1] })
    );
}

#[test]
fn test_mat4_array_is_column_major_and_contiguous() {
    let a = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let data = UniformValue::from(vec![Mat4::IDENTITY, a]).to_data();
    match data {
        Some(UniformData::Matrix { dimension, values }) => {
            assert_eq!(dimension, 4);
            assert_eq!(values.len(), 32);
            assert_eq!(&values[28..31], &[1.0, 2.0, 3.0]);
        }
        other => panic!("unexpected payload {:?}", other),
    }
}
