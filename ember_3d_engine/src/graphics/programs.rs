/// Uniform contracts of the built-in programs.
///
/// The shader text itself is supplied by the application; these tables list
/// the uniforms the engine writes to each program so they can be declared
/// before linking.

use crate::gpu::UniformType;

/// Default program names
pub const FORWARD_PROGRAM: &str = "forward";
pub const DIRECTIONAL_SHADOW_PROGRAM: &str = "directional_shadow";
pub const POINT_SHADOW_PROGRAM: &str = "point_shadow";
pub const SPRITE_PROGRAM: &str = "sprite_2d";
pub const SKYBOX_PROGRAM: &str = "skybox";

/// Which built-in contract a program follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramContract {
    Forward,
    DirectionalShadow,
    PointShadow,
    Sprite,
    Skybox,
}

impl ProgramContract {
    pub fn uniforms(&self) -> &'static [(&'static str, UniformType)] {
        match self {
            ProgramContract::Forward => FORWARD_UNIFORMS,
            ProgramContract::DirectionalShadow => DIRECTIONAL_SHADOW_UNIFORMS,
            ProgramContract::PointShadow => POINT_SHADOW_UNIFORMS,
            ProgramContract::Sprite => SPRITE_UNIFORMS,
            ProgramContract::Skybox => SKYBOX_UNIFORMS,
        }
    }
}

const FORWARD_UNIFORMS: &[(&str, UniformType)] = &[
    ("u_model", UniformType::Mat4),
    ("u_view", UniformType::Mat4),
    ("u_projection", UniformType::Mat4),
    ("camera_position", UniformType::Vec3),
    ("environment.ambient_light", UniformType::Vec3),
    ("shadow_map_size", UniformType::Float),
    // Point lights
    ("point_lights_count", UniformType::Int),
    ("point_lights[].color", UniformType::Vec3),
    ("point_lights[].ambient", UniformType::Float),
    ("point_lights[].diffuse", UniformType::Float),
    ("point_lights[].specular", UniformType::Float),
    ("point_lights[].energy", UniformType::Float),
    ("point_lights[].position", UniformType::Vec3),
    ("point_lights[].range", UniformType::Float),
    ("point_lights[].shadow_layer", UniformType::Int),
    ("u_point_light_space_matrix[]", UniformType::Mat4),
    ("point_light_shadow_maps", UniformType::Texture2DArray),
    // Spot lights
    ("spot_lights_count", UniformType::Int),
    ("spot_lights[].color", UniformType::Vec3),
    ("spot_lights[].ambient", UniformType::Float),
    ("spot_lights[].diffuse", UniformType::Float),
    ("spot_lights[].specular", UniformType::Float),
    ("spot_lights[].energy", UniformType::Float),
    ("spot_lights[].position", UniformType::Vec3),
    ("spot_lights[].rotation", UniformType::Mat4),
    ("spot_lights[].range", UniformType::Float),
    ("spot_lights[].cookie_radius", UniformType::Float),
    // Directional lights
    ("directional_lights_count", UniformType::Int),
    ("directional_lights[].color", UniformType::Vec3),
    ("directional_lights[].ambient", UniformType::Float),
    ("directional_lights[].diffuse", UniformType::Float),
    ("directional_lights[].specular", UniformType::Float),
    ("directional_lights[].energy", UniformType::Float),
    ("directional_lights[].direction", UniformType::Vec3),
    ("directional_lights[].rotation", UniformType::Mat4),
    ("directional_lights[].shadow_layer", UniformType::Int),
    ("u_directional_light_space_matrix[]", UniformType::Mat4),
    ("directional_light_shadow_maps", UniformType::Texture2DArray),
    // Material
    ("material", UniformType::Struct),
    ("material.has_albedo_texture", UniformType::Bool),
    ("material.has_metallic_texture", UniformType::Bool),
    ("material.has_roughness_texture", UniformType::Bool),
    ("material.has_ao_texture", UniformType::Bool),
    ("material.has_normal_texture", UniformType::Bool),
    ("material.albedo", UniformType::Vec3),
    ("material.metallic", UniformType::Float),
    ("material.roughness", UniformType::Float),
    ("material.ao", UniformType::Float),
    ("material_texture_albedo", UniformType::Texture2D),
    ("material_texture_metallic", UniformType::Texture2D),
    ("material_texture_roughness", UniformType::Texture2D),
    ("material_texture_ao", UniformType::Texture2D),
    ("material_texture_normal", UniformType::Texture2D),
];

const DIRECTIONAL_SHADOW_UNIFORMS: &[(&str, UniformType)] = &[
    ("u_model", UniformType::Mat4),
    ("u_light_space_matrix", UniformType::Mat4),
];

const POINT_SHADOW_UNIFORMS: &[(&str, UniformType)] = &[
    ("u_model", UniformType::Mat4),
    ("u_light_space_matrix", UniformType::Mat4),
    ("origin", UniformType::Vec3),
    ("range", UniformType::Float),
];

const SPRITE_UNIFORMS: &[(&str, UniformType)] = &[
    ("sprite_texture", UniformType::Texture2D),
    ("u_model", UniformType::Mat4),
    ("u_projection", UniformType::Mat4),
];

const SKYBOX_UNIFORMS: &[(&str, UniformType)] = &[
    ("skybox_texture", UniformType::TextureCubeMap),
    ("u_view", UniformType::Mat4),
    ("u_projection", UniformType::Mat4),
];
