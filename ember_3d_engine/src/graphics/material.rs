/// Surface materials and models (mesh + material).

use glam::Vec3;
use crate::error::Result;
use crate::gpu::{BlendMode, TextureKey};
use super::graphics_manager::GraphicsManager;
use super::mesh::MeshKey;

/// A material channel driven by a constant or a texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialInput<T> {
    Value(T),
    Texture(TextureKey),
}

/// PBR-style material parameters and the program that shades them
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub program: String,
    pub albedo: MaterialInput<Vec3>,
    pub metallic: MaterialInput<f32>,
    pub roughness: MaterialInput<f32>,
    pub ao: MaterialInput<f32>,
    pub normal: Option<TextureKey>,
    pub depth_test: bool,
    pub blend: Option<BlendMode>,
}

impl Material {
    /// White, non-metallic, fully rough material shaded by `program`
    pub fn new(name: &str, program: &str) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            albedo: MaterialInput::Value(Vec3::ONE),
            metallic: MaterialInput::Value(0.0),
            roughness: MaterialInput::Value(1.0),
            ao: MaterialInput::Value(1.0),
            normal: None,
            depth_test: true,
            blend: None,
        }
    }

    pub fn with_albedo(mut self, albedo: MaterialInput<Vec3>) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_metallic(mut self, metallic: MaterialInput<f32>) -> Self {
        self.metallic = metallic;
        self
    }

    pub fn with_roughness(mut self, roughness: MaterialInput<f32>) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_ao(mut self, ao: MaterialInput<f32>) -> Self {
        self.ao = ao;
        self
    }

    pub fn with_normal(mut self, normal: TextureKey) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.depth_test = enabled;
        self
    }

    pub fn with_blend(mut self, blend: Option<BlendMode>) -> Self {
        self.blend = blend;
        self
    }

    /// Activate the program and apply state and `material.*` uniforms
    pub fn bind(&self, gm: &mut GraphicsManager) -> Result<()> {
        gm.use_shader(&self.program)?;
        gm.set_depth_test(self.depth_test);
        gm.set_blend(self.blend);

        match self.normal {
            Some(texture) => {
                gm.set_uniform("material.has_normal_texture", true);
                gm.set_uniform("material_texture_normal", texture);
            }
            None => gm.set_uniform("material.has_normal_texture", false),
        }
        write_channel(gm, "albedo", self.albedo);
        write_channel(gm, "metallic", self.metallic);
        write_channel(gm, "roughness", self.roughness);
        write_channel(gm, "ao", self.ao);
        Ok(())
    }
}

fn write_channel<T>(gm: &mut GraphicsManager, channel: &str, input: MaterialInput<T>)
where
    T: Into<crate::gpu::UniformValue>,
{
    match input {
        MaterialInput::Value(value) => {
            gm.set_uniform(&format!("material.has_{}_texture", channel), false);
            gm.set_uniform(&format!("material.{}", channel), value);
        }
        MaterialInput::Texture(texture) => {
            gm.set_uniform(&format!("material.has_{}_texture", channel), true);
            gm.set_uniform(&format!("material_texture_{}", channel), texture);
        }
    }
}

/// Mesh drawn with a material
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub mesh: MeshKey,
    pub material: Material,
}

impl Model {
    pub fn new(mesh: MeshKey, material: Material) -> Self {
        Self { mesh, material }
    }
}
