/// Uniform types, values and label normalization.
///
/// Array-indexed labels collapse to one canonical registry key so a single
/// declaration serves every element: `point_lights[3].color` and
/// `point_lights[0].color` both map to `point_lights[].color`, with the
/// index kept aside to offset the element slot or texture unit.

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use super::gpu_context::UniformData;
use super::texture::TextureKey;

/// Semantic type declared with `add_uniform`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Texture2D,
    Texture2DArray,
    TextureCubeMap,
    /// Struct base name, used for documentation only
    Struct,
    Float,
    Int,
    Bool,
    Vec2,
    IVec2,
    Vec3,
    IVec3,
    Vec4,
    IVec4,
    Mat2,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Whether the uniform consumes a texture unit
    pub fn is_sampler(&self) -> bool {
        matches!(
            self,
            UniformType::Texture2D | UniformType::Texture2DArray | UniformType::TextureCubeMap
        )
    }
}

/// Typed value passed to `GraphicsManager::set_uniform`
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    IVec2(IVec2),
    Vec3(Vec3),
    IVec3(IVec3),
    Vec4(Vec4),
    IVec4(IVec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
    /// Consecutive matrices starting at the label's element
    Mat4Array(Vec<Mat4>),
    Texture(TextureKey),
}

impl UniformValue {
    /// Whether the value can be written to a uniform declared as `ty`
    pub fn matches(&self, ty: UniformType) -> bool {
        match self {
            UniformValue::Float(_) => ty == UniformType::Float,
            UniformValue::Int(_) => ty == UniformType::Int,
            UniformValue::Bool(_) => ty == UniformType::Bool,
            UniformValue::Vec2(_) => ty == UniformType::Vec2,
            UniformValue::IVec2(_) => ty == UniformType::IVec2,
            UniformValue::Vec3(_) => ty == UniformType::Vec3,
            UniformValue::IVec3(_) => ty == UniformType::IVec3,
            UniformValue::Vec4(_) => ty == UniformType::Vec4,
            UniformValue::IVec4(_) => ty == UniformType::IVec4,
            UniformValue::Mat2(_) => ty == UniformType::Mat2,
            UniformValue::Mat3(_) => ty == UniformType::Mat3,
            UniformValue::Mat4(_) | UniformValue::Mat4Array(_) => ty == UniformType::Mat4,
            UniformValue::Texture(_) => ty.is_sampler(),
        }
    }

    /// Flattened payload, `None` for textures (bound through a unit instead)
    pub fn to_data(&self) -> Option<UniformData> {
        let data = match self {
            UniformValue::Float(v) => float(1, std::slice::from_ref(v)),
            UniformValue::Int(v) => int(1, std::slice::from_ref(v)),
            UniformValue::Bool(v) => int(1, &[*v as i32]),
            UniformValue::Vec2(v) => float(2, bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::IVec2(v) => int(2, bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::Vec3(v) => float(3, bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::IVec3(v) => int(3, bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::Vec4(v) => float(4, bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::IVec4(v) => int(4, bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::Mat2(m) => matrix(2, bytemuck::cast_slice(std::slice::from_ref(m))),
            UniformValue::Mat3(m) => matrix(3, &m.to_cols_array()),
            UniformValue::Mat4(m) => matrix(4, bytemuck::cast_slice(std::slice::from_ref(m))),
            UniformValue::Mat4Array(ms) => matrix(4, bytemuck::cast_slice(ms.as_slice())),
            UniformValue::Texture(_) => return None,
        };
        Some(data)
    }
}

fn float(components: u8, values: &[f32]) -> UniformData {
    UniformData::Float { components, values: values.to_vec() }
}

fn int(components: u8, values: &[i32]) -> UniformData {
    UniformData::Int { components, values: values.to_vec() }
}

fn matrix(dimension: u8, values: &[f32]) -> UniformData {
    UniformData::Matrix { dimension, values: values.to_vec() }
}

macro_rules! uniform_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

uniform_value_from! {
    f32 => Float,
    i32 => Int,
    bool => Bool,
    Vec2 => Vec2,
    IVec2 => IVec2,
    Vec3 => Vec3,
    IVec3 => IVec3,
    Vec4 => Vec4,
    IVec4 => IVec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Vec<Mat4> => Mat4Array,
    TextureKey => Texture,
}

impl From<&[Mat4]> for UniformValue {
    fn from(value: &[Mat4]) -> Self {
        UniformValue::Mat4Array(value.to_vec())
    }
}

impl From<u32> for UniformValue {
    fn from(value: u32) -> Self {
        UniformValue::Int(value as i32)
    }
}

impl From<usize> for UniformValue {
    fn from(value: usize) -> Self {
        UniformValue::Int(value as i32)
    }
}

/// A parsed uniform label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLabel {
    /// Label with every bracket emptied, e.g. `point_lights[].color`
    pub canonical: String,
    /// First bracket index, if any
    pub index: Option<u32>,
    /// Whether the label contains brackets
    pub is_array: bool,
    /// Whether the label contains more than one bracket
    pub nested: bool,
}

impl UniformLabel {
    pub fn parse(label: &str) -> Self {
        let mut canonical = String::with_capacity(label.len());
        let mut index = None;
        let mut is_array = false;
        let mut brackets = 0;
        let mut chars = label.chars();

        while let Some(c) = chars.next() {
            if c != '[' {
                canonical.push(c);
                continue;
            }
            is_array = true;
            brackets += 1;
            let mut digits = String::new();
            for inner in chars.by_ref() {
                if inner == ']' {
                    break;
                }
                digits.push(inner);
            }
            if index.is_none() {
                index = digits.trim().parse::<u32>().ok();
            }
            canonical.push_str("[]");
        }

        Self { canonical, index, is_array, nested: brackets > 1 }
    }

    /// Element slot used for location caching and unit offsets
    pub fn slot(&self) -> usize {
        self.index.unwrap_or(0) as usize
    }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
