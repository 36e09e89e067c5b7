/// GraphicsManager: owner of the GPU context and mediator of all GPU state.
///
/// Owns the shader-program and framebuffer tables, the texture and mesh
/// arenas, the two shadow atlases and the frame clock. Exactly one program
/// and at most one framebuffer are active at a time; binding a new one
/// releases the previous first. Scoped guards (`scoped_shader`,
/// `scoped_framebuffer`) restore the previous binding when dropped.
///
/// GPU objects live until released explicitly or until `release_all`, which
/// also runs on drop. Removing scene nodes never frees GPU memory.

use std::ops::{Deref, DerefMut};
use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::config::GraphicsConfig;
use crate::error::{Error, Result};
use crate::gpu::{
    AttachmentPoint, AttachmentTarget, BlendMode, DepthFunc, FixedFunctionState, GpuContext,
    GpuFramebuffer, MeshData, ShaderStage, Texture, TextureDesc, TextureKey, UniformData,
    UniformLabel, UniformType, UniformValue, VertexLayout, Viewport,
};
use crate::scene::Scene;
use crate::{engine_bail, engine_debug, engine_err, engine_info, engine_trace, engine_warn};
use super::frame_clock::{FrameClock, FrameTime};
use super::framebuffer::{Attachment, AttachmentDesc, DrawFlags, Framebuffer};
use super::mesh::{cube_mesh_data, quad_mesh_data, Mesh, MeshKey};
use super::programs::{ProgramContract, FORWARD_PROGRAM, SKYBOX_PROGRAM, SPRITE_PROGRAM};
use super::shader_program::{LocationLookup, ShaderProgram, UniformInfo};
use super::shadow_atlas::{ShadowAtlas, ShadowAtlasKind, ATLAS_DEPTH_ATTACHMENT};

const SOURCE: &str = "ember3d::GraphicsManager";

/// Attribute names looked up when uploading a mesh
pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const NORMAL_ATTRIBUTE: &str = "a_normal";
pub const UV_ATTRIBUTE: &str = "a_uv";

/// Bound framebuffer and the state to restore on unbind
#[derive(Debug, Clone)]
struct ActiveFramebuffer {
    name: String,
    handle: GpuFramebuffer,
    saved_state: FixedFunctionState,
    saved_viewport: Viewport,
}

#[derive(Debug, Default, Clone, Copy)]
struct BuiltinMeshes {
    quad: Option<MeshKey>,
    cube: Option<MeshKey>,
}

/// GPU resource and state mediator
pub struct GraphicsManager {
    context: Box<dyn GpuContext>,
    config: GraphicsConfig,
    programs: FxHashMap<String, ShaderProgram>,
    active_program: Option<String>,
    framebuffers: FxHashMap<String, Framebuffer>,
    active_framebuffer: Option<ActiveFramebuffer>,
    textures: SlotMap<TextureKey, Texture>,
    meshes: SlotMap<MeshKey, Mesh>,
    builtin_meshes: BuiltinMeshes,
    directional_atlas: Option<ShadowAtlas>,
    point_atlas: Option<ShadowAtlas>,
    clock: FrameClock,
}

impl GraphicsManager {
    /// Take ownership of a context and allocate the empty shadow atlases
    pub fn new(context: Box<dyn GpuContext>, config: GraphicsConfig) -> Result<Self> {
        let clock = FrameClock::new(config.max_delta_time);
        let mut manager = Self {
            context,
            config,
            programs: FxHashMap::default(),
            active_program: None,
            framebuffers: FxHashMap::default(),
            active_framebuffer: None,
            textures: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            builtin_meshes: BuiltinMeshes::default(),
            directional_atlas: None,
            point_atlas: None,
            clock,
        };
        manager.sync_shadow_atlases(0, 0)?;
        engine_info!(SOURCE, "GraphicsManager created (shadow map size {})", manager.config.shadow_map_size);
        Ok(manager)
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    pub fn context(&self) -> &dyn GpuContext {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> &mut dyn GpuContext {
        self.context.as_mut()
    }

    /// Downcast the context, e.g. to inspect a `MockGpuContext`
    pub fn context_as<T: 'static>(&self) -> Option<&T> {
        self.context.as_any().downcast_ref::<T>()
    }

    pub fn context_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.context.as_any_mut().downcast_mut::<T>()
    }

    // ===== SHADER PROGRAMS =====

    /// Register a new, empty program
    pub fn create_shader_program(&mut self, name: &str) -> Result<()> {
        if self.programs.contains_key(name) {
            engine_bail!(SOURCE, "Shader program '{}' already exists", name);
        }
        self.programs
            .insert(name.to_string(), ShaderProgram::new(name, self.config.uniform_array_bound));
        engine_debug!(SOURCE, "Shader program '{}' created", name);
        Ok(())
    }

    /// Compile one stage of an unbuilt program
    pub fn add_shader(&mut self, program: &str, stage: ShaderStage, source: &str) -> Result<()> {
        let Some(entry) = self.programs.get_mut(program) else {
            engine_bail!(SOURCE, Error::MissingShaderProgram(program.to_string()));
        };
        if entry.is_built() {
            engine_bail!(SOURCE, Error::InvalidResource(format!(
                "program '{}' is already built", program
            )));
        }
        let shader = self
            .context
            .compile_shader(stage, source)
            .map_err(|e| engine_err!(SOURCE, e))?;
        entry.push_stage(stage, shader)
    }

    /// Declare a uniform of an unbuilt program
    pub fn add_uniform(&mut self, program: &str, label: &str, uniform_type: UniformType) -> Result<UniformInfo> {
        let Some(entry) = self.programs.get_mut(program) else {
            engine_bail!(SOURCE, Error::MissingShaderProgram(program.to_string()));
        };
        entry.register_uniform(label, uniform_type).map_err(|e| engine_err!(SOURCE, e))
    }

    /// Declare every uniform of a built-in contract
    pub fn add_contract(&mut self, program: &str, contract: ProgramContract) -> Result<()> {
        for (label, uniform_type) in contract.uniforms() {
            self.add_uniform(program, label, *uniform_type)?;
        }
        Ok(())
    }

    /// Link the program; declared uniforms the linked program lacks are reported
    pub fn build_shader_program(&mut self, program: &str) -> Result<()> {
        let Some(entry) = self.programs.get_mut(program) else {
            engine_bail!(SOURCE, Error::MissingShaderProgram(program.to_string()));
        };
        if entry.is_built() {
            engine_bail!(SOURCE, Error::InvalidResource(format!(
                "program '{}' is already built", program
            )));
        }
        let shaders: Vec<_> = entry.stages().iter().map(|(_, shader)| *shader).collect();
        let handle = self
            .context
            .link_program(&shaders)
            .map_err(|e| engine_err!(SOURCE, e))?;
        entry.set_handle(handle);

        let missing = entry.unresolved_uniforms(self.context.as_mut());
        for label in &missing {
            engine_warn!(SOURCE, "Uniform '{}' of program '{}' is not used by the linked program", label, program);
        }
        engine_info!(SOURCE, "Shader program '{}' built ({} uniforms, {} unused)",
            program, entry.uniform_count(), missing.len());
        Ok(())
    }

    /// Create, compile, declare and link a program following a built-in contract
    pub fn create_program_with_contract(
        &mut self,
        name: &str,
        contract: ProgramContract,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<()> {
        self.create_shader_program(name)?;
        self.add_shader(name, ShaderStage::Vertex, vertex_source)?;
        self.add_shader(name, ShaderStage::Fragment, fragment_source)?;
        self.add_contract(name, contract)?;
        self.build_shader_program(name)
    }

    /// Forward program under its default name
    pub fn create_forward_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        self.create_program_with_contract(FORWARD_PROGRAM, ProgramContract::Forward, vertex_source, fragment_source)
    }

    /// Point shadow program under the configured name
    pub fn create_point_shadow_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        let name = self.config.point_shadow_program.clone();
        self.create_program_with_contract(&name, ProgramContract::PointShadow, vertex_source, fragment_source)
    }

    /// Directional shadow program under the configured name
    pub fn create_directional_shadow_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        let name = self.config.directional_shadow_program.clone();
        self.create_program_with_contract(&name, ProgramContract::DirectionalShadow, vertex_source, fragment_source)
    }

    /// 2D sprite program under its default name
    pub fn create_sprite_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        self.create_program_with_contract(SPRITE_PROGRAM, ProgramContract::Sprite, vertex_source, fragment_source)
    }

    /// Skybox program under its default name
    pub fn create_skybox_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        self.create_program_with_contract(SKYBOX_PROGRAM, ProgramContract::Skybox, vertex_source, fragment_source)
    }

    pub fn shader_program(&self, name: &str) -> Option<&ShaderProgram> {
        self.programs.get(name)
    }

    pub fn has_shader_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    /// Make `name` the single active program
    pub fn use_shader(&mut self, name: &str) -> Result<()> {
        let Some(program) = self.programs.get(name) else {
            engine_bail!(SOURCE, Error::MissingShaderProgram(name.to_string()));
        };
        let Some(handle) = program.handle() else {
            engine_bail!(SOURCE, Error::InvalidResource(format!(
                "program '{}' is used before build", name
            )));
        };
        self.context.use_program(Some(handle));
        if self.active_program.as_deref() != Some(name) {
            self.active_program = Some(name.to_string());
        }
        Ok(())
    }

    /// Deactivate the active program
    pub fn clear_shader(&mut self) {
        self.context.use_program(None);
        self.active_program = None;
    }

    pub fn active_shader(&self) -> Option<&str> {
        self.active_program.as_deref()
    }

    /// Activate `name` until the guard drops, then restore the previous program
    pub fn scoped_shader(&mut self, name: &str) -> Result<ShaderScope<'_>> {
        let previous = self.active_program.clone();
        self.use_shader(name)?;
        Ok(ShaderScope { manager: self, previous })
    }

    /// Destroy a program
    pub fn release_shader_program(&mut self, name: &str) -> bool {
        let Some(program) = self.programs.remove(name) else {
            return false;
        };
        if self.active_program.as_deref() == Some(name) {
            self.clear_shader();
        }
        if let Some(handle) = program.handle() {
            self.context.delete_program(handle);
        }
        true
    }

    // ===== UNIFORMS =====

    /// Write a uniform of the active program
    pub fn set_uniform(&mut self, label: &str, value: impl Into<UniformValue>) {
        self.set_uniform_transposed(label, value, false);
    }

    /// Write a uniform of the active program, optionally transposing matrices
    ///
    /// Unknown labels, labels the linked program does not expose and values
    /// of the wrong type log a warning the first time and are skipped.
    pub fn set_uniform_transposed(&mut self, label: &str, value: impl Into<UniformValue>, transpose: bool) {
        let value = value.into();
        let Some(name) = self.active_program.as_deref() else {
            engine_warn!(SOURCE, "Uniform '{}' set with no active program", label);
            return;
        };
        let Some(program) = self.programs.get_mut(name) else {
            return;
        };

        let parsed = UniformLabel::parse(label);
        let location = match program.location(self.context.as_mut(), &parsed, label) {
            LocationLookup::Bound(location) => location,
            LocationLookup::Unregistered => {
                if program.first_warning(label) {
                    engine_warn!(SOURCE, "Uniform '{}' is not registered in program '{}'", label, name);
                } else {
                    engine_trace!(SOURCE, "Skipping unregistered uniform '{}'", label);
                }
                return;
            }
            LocationLookup::Unbound => {
                if program.first_warning(label) {
                    engine_warn!(SOURCE, "Uniform '{}' is not bound in program '{}'", label, name);
                } else {
                    engine_trace!(SOURCE, "Skipping unbound uniform '{}'", label);
                }
                return;
            }
        };

        let Some(info) = program.uniform(label).copied() else {
            return;
        };
        if !value.matches(info.uniform_type) {
            if program.first_warning(label) {
                engine_warn!(SOURCE, "Uniform '{}' declared as {:?} cannot take {:?}",
                    label, info.uniform_type, value);
            }
            return;
        }

        match value {
            UniformValue::Texture(key) => {
                let Some(texture) = self.textures.get(key) else {
                    engine_warn!(SOURCE, "Uniform '{}' references a released texture", label);
                    return;
                };
                let element = parsed.index.unwrap_or(0);
                if element >= info.length {
                    engine_warn!(SOURCE, "Sampler '{}' index {} exceeds declared length {}",
                        label, element, info.length);
                    return;
                }
                let unit = info.texture_unit.unwrap_or(0) + element;
                self.context.bind_texture(unit, texture.kind(), texture.handle());
                let data = UniformData::Int { components: 1, values: vec![unit as i32] };
                self.context.set_uniform(location, &data, false);
            }
            other => {
                if let Some(data) = other.to_data() {
                    self.context.set_uniform(location, &data, transpose);
                }
            }
        }
    }

    /// Read a uniform of the active program back through the context
    pub fn uniform_value(&mut self, label: &str) -> Option<UniformData> {
        let name = self.active_program.as_deref()?;
        let program = self.programs.get_mut(name)?;
        let handle = program.handle()?;
        let parsed = UniformLabel::parse(label);
        match program.location(self.context.as_mut(), &parsed, label) {
            LocationLookup::Bound(location) => self.context.uniform_value(handle, location),
            _ => None,
        }
    }

    // ===== TEXTURES =====

    pub fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> Result<TextureKey> {
        let handle = self
            .context
            .create_texture(desc)
            .map_err(|e| engine_err!(SOURCE, e))?;
        let key = self.textures.insert(Texture::new(name, desc, handle));
        engine_debug!(SOURCE, "Texture '{}' created ({:?} {}x{})", name, desc.kind, desc.width, desc.height);
        Ok(key)
    }

    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Destroy a texture; framebuffers still referencing it become invalid
    pub fn release_texture(&mut self, key: TextureKey) -> bool {
        match self.textures.remove(key) {
            Some(texture) => {
                self.context.delete_texture(texture.handle());
                true
            }
            None => false,
        }
    }

    // ===== MESHES =====

    /// Upload a mesh, resolving attribute locations against `program`
    pub fn create_mesh(&mut self, program: &str, data: &MeshData) -> Result<MeshKey> {
        let Some(handle) = self.programs.get(program).and_then(|p| p.handle()) else {
            engine_bail!(SOURCE, Error::MissingShaderProgram(program.to_string()));
        };
        let mut lookup = |attribute: &str, present: bool| -> Option<u32> {
            if !present {
                return None;
            }
            let location = self.context.attribute_location(handle, attribute);
            if location.is_none() {
                engine_warn!(SOURCE, "Attribute '{}' not found in program '{}'", attribute, program);
            }
            location
        };
        let layout = VertexLayout {
            position: lookup(POSITION_ATTRIBUTE, !data.positions.is_empty()),
            normal: lookup(NORMAL_ATTRIBUTE, !data.normals.is_empty()),
            uv: lookup(UV_ATTRIBUTE, !data.uvs.is_empty()),
        };
        let gpu_mesh = self
            .context
            .create_mesh(data, &layout)
            .map_err(|e| engine_err!(SOURCE, e))?;
        Ok(self.meshes.insert(Mesh::new(gpu_mesh, data)))
    }

    pub fn mesh(&self, key: MeshKey) -> Option<&Mesh> {
        self.meshes.get(key)
    }

    pub fn release_mesh(&mut self, key: MeshKey) -> bool {
        match self.meshes.remove(key) {
            Some(mesh) => {
                self.context.delete_mesh(mesh.handle());
                true
            }
            None => false,
        }
    }

    /// Draw a mesh with the current program and state
    pub fn draw_mesh(&mut self, key: MeshKey) -> Result<()> {
        let Some(mesh) = self.meshes.get(key) else {
            engine_bail!(SOURCE, Error::InvalidResource("mesh was released".to_string()));
        };
        self.context.draw_mesh(mesh.handle());
        Ok(())
    }

    /// Shared unit quad, uploaded on first use with `program`
    pub fn quad_mesh(&mut self, program: &str) -> Result<MeshKey> {
        if let Some(key) = self.builtin_meshes.quad.filter(|k| self.meshes.contains_key(*k)) {
            return Ok(key);
        }
        let key = self.create_mesh(program, &quad_mesh_data())?;
        self.builtin_meshes.quad = Some(key);
        Ok(key)
    }

    /// Shared skybox cube, uploaded on first use with `program`
    pub fn cube_mesh(&mut self, program: &str) -> Result<MeshKey> {
        if let Some(key) = self.builtin_meshes.cube.filter(|k| self.meshes.contains_key(*k)) {
            return Ok(key);
        }
        let key = self.create_mesh(program, &cube_mesh_data())?;
        self.builtin_meshes.cube = Some(key);
        Ok(key)
    }

    // ===== FRAMEBUFFERS =====

    /// Create a named render target
    ///
    /// Fails on duplicate names, invalid flag combinations, attachments
    /// whose texture kind, layer or mip level do not fit, and on an
    /// incomplete status reported by the context.
    pub fn create_framebuffer(&mut self, name: &str, attachments: Vec<AttachmentDesc>, draw_flags: DrawFlags) -> Result<()> {
        if self.framebuffers.contains_key(name) {
            engine_bail!(SOURCE, "Framebuffer '{}' already exists", name);
        }
        draw_flags.validate().map_err(|e| engine_err!(SOURCE, e))?;
        if attachments.is_empty() {
            engine_bail!(SOURCE, Error::UnsupportedAttachment(format!(
                "framebuffer '{}' has no attachments", name
            )));
        }

        let mut resolved = Vec::with_capacity(attachments.len());
        let mut extent = (u32::MAX, u32::MAX);
        let mut color_index = 0;
        for desc in attachments {
            let Some(texture) = self.textures.get(desc.texture) else {
                engine_bail!(SOURCE, Error::InvalidResource(format!(
                    "attachment '{}' of framebuffer '{}' references a released texture", desc.name, name
                )));
            };
            desc.validate(texture).map_err(|e| engine_err!(SOURCE, e))?;
            let (w, h) = texture.mip_extent(desc.mip_level);
            extent = (extent.0.min(w), extent.1.min(h));
            let point = desc.point(color_index);
            if let AttachmentPoint::Color(_) = point {
                color_index += 1;
            }
            resolved.push(Attachment { desc, point });
        }

        let handle = self
            .context
            .create_framebuffer()
            .map_err(|e| engine_err!(SOURCE, e))?;
        self.context.bind_framebuffer(Some(handle));
        for attachment in &resolved {
            let texture = &self.textures[attachment.desc.texture];
            self.context.attach_texture(
                attachment.point,
                texture.handle(),
                attachment.desc.target(),
                attachment.desc.mip_level,
            );
        }
        self.context.set_draw_buffers(color_index);
        let status = self.context.framebuffer_status();
        let previous = self.active_framebuffer.as_ref().map(|a| a.handle);
        self.context.bind_framebuffer(previous);

        if status != crate::gpu::FramebufferStatus::Complete {
            self.context.delete_framebuffer(handle);
            engine_bail!(SOURCE, Error::IncompleteFramebuffer { name: name.to_string(), status });
        }

        self.framebuffers
            .insert(name.to_string(), Framebuffer::new(name, handle, extent, resolved, draw_flags));
        engine_debug!(SOURCE, "Framebuffer '{}' created ({}x{})", name, extent.0, extent.1);
        Ok(())
    }

    pub fn framebuffer(&self, name: &str) -> Option<&Framebuffer> {
        self.framebuffers.get(name)
    }

    pub fn framebuffer_mut(&mut self, name: &str) -> Option<&mut Framebuffer> {
        self.framebuffers.get_mut(name)
    }

    pub fn active_framebuffer(&self) -> Option<&str> {
        self.active_framebuffer.as_ref().map(|a| a.name.as_str())
    }

    /// Bind a framebuffer, apply its draw flags and viewport
    ///
    /// A framebuffer already bound is unbound first.
    pub fn use_framebuffer(&mut self, name: &str) -> Result<()> {
        let Some(framebuffer) = self.framebuffers.get(name) else {
            engine_bail!(SOURCE, Error::InvalidResource(format!("framebuffer '{}' not found", name)));
        };
        let handle = framebuffer.handle();
        let flags = framebuffer.draw_flags();
        let viewport = framebuffer.viewport();

        if self.active_framebuffer.is_some() {
            self.unuse_framebuffer();
        }

        let saved_state = self.context.fixed_function_state();
        let saved_viewport = self.context.viewport();
        self.context.bind_framebuffer(Some(handle));
        self.apply_state(flags.apply_to(saved_state));
        self.context.set_viewport(viewport);

        self.active_framebuffer = Some(ActiveFramebuffer {
            name: name.to_string(),
            handle,
            saved_state,
            saved_viewport,
        });
        Ok(())
    }

    /// Bind the default framebuffer and restore the state saved on bind
    pub fn unuse_framebuffer(&mut self) {
        let Some(active) = self.active_framebuffer.take() else {
            engine_trace!(SOURCE, "unuse_framebuffer with no framebuffer bound");
            return;
        };
        self.context.bind_framebuffer(None);
        self.apply_state(active.saved_state);
        self.context.set_viewport(active.saved_viewport);
    }

    /// Bind `name` until the guard drops, then rebind the previous framebuffer
    pub fn scoped_framebuffer(&mut self, name: &str) -> Result<FramebufferScope<'_>> {
        let previous = self.active_framebuffer.take();
        if let Err(e) = self.use_framebuffer(name) {
            self.active_framebuffer = previous;
            return Err(e);
        }
        Ok(FramebufferScope { manager: self, previous })
    }

    /// Point a layered attachment at another array layer
    pub fn set_attachment_layer(&mut self, framebuffer: &str, attachment: &str, layer: u32) -> Result<()> {
        self.retarget_attachment(framebuffer, attachment, |desc| {
            if !desc.attachment_type.is_layered() {
                return Err(Error::UnsupportedAttachment(format!(
                    "attachment '{}' is not layered", desc.name
                )));
            }
            desc.layer = layer;
            Ok(())
        })
    }

    /// Point a cubemap attachment at another face
    pub fn set_attachment_cube_face(&mut self, framebuffer: &str, attachment: &str, face: crate::gpu::CubeFace) -> Result<()> {
        self.retarget_attachment(framebuffer, attachment, |desc| {
            if !desc.attachment_type.is_cube_face() {
                return Err(Error::UnsupportedAttachment(format!(
                    "attachment '{}' is not a cubemap face", desc.name
                )));
            }
            desc.cube_face = face;
            Ok(())
        })
    }

    fn retarget_attachment<F>(&mut self, framebuffer: &str, attachment: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut AttachmentDesc) -> Result<()>,
    {
        let Some(fb) = self.framebuffers.get_mut(framebuffer) else {
            engine_bail!(SOURCE, Error::InvalidResource(format!("framebuffer '{}' not found", framebuffer)));
        };
        let fb_handle = fb.handle();
        let Some(entry) = fb.attachment_mut(attachment) else {
            engine_bail!(SOURCE, Error::InvalidResource(format!(
                "framebuffer '{}' has no attachment '{}'", framebuffer, attachment
            )));
        };
        let Some(texture) = self.textures.get(entry.desc.texture) else {
            engine_bail!(SOURCE, Error::InvalidResource(format!(
                "attachment '{}' references a released texture", attachment
            )));
        };

        let mut desc = entry.desc.clone();
        change(&mut desc).map_err(|e| engine_err!(SOURCE, e))?;
        desc.validate(texture).map_err(|e| engine_err!(SOURCE, e))?;

        let (point, target, mip_level, texture_handle) =
            (entry.point, desc.target(), desc.mip_level, texture.handle());
        entry.desc = desc;
        self.attach_to(fb_handle, point, texture_handle, target, mip_level);
        Ok(())
    }

    fn attach_to(
        &mut self,
        framebuffer: GpuFramebuffer,
        point: AttachmentPoint,
        texture: crate::gpu::GpuTexture,
        target: AttachmentTarget,
        mip_level: u32,
    ) {
        let bound = self.active_framebuffer.as_ref().map(|a| a.handle);
        if bound == Some(framebuffer) {
            self.context.attach_texture(point, texture, target, mip_level);
            return;
        }
        self.context.bind_framebuffer(Some(framebuffer));
        self.context.attach_texture(point, texture, target, mip_level);
        self.context.bind_framebuffer(bound);
    }

    /// Clear the bound framebuffer, or the back buffer when none is bound
    pub fn clear_framebuffer(&mut self) {
        match &self.active_framebuffer {
            Some(active) => {
                let Some(fb) = self.framebuffers.get(&active.name) else {
                    return;
                };
                let color = fb.has_color().then(|| fb.clear_color());
                let depth = fb.has_depth();
                self.context.clear(color, depth, depth);
            }
            None => {
                let color = self.config.clear_color;
                self.context.clear(Some(color), true, true);
            }
        }
    }

    /// Destroy a framebuffer (its textures stay alive)
    pub fn release_framebuffer(&mut self, name: &str) -> bool {
        if self.active_framebuffer.as_ref().is_some_and(|a| a.name == name) {
            self.unuse_framebuffer();
        }
        match self.framebuffers.remove(name) {
            Some(fb) => {
                self.context.delete_framebuffer(fb.handle());
                true
            }
            None => false,
        }
    }

    // ===== FIXED-FUNCTION STATE =====

    fn apply_state(&mut self, state: FixedFunctionState) {
        self.context.set_depth_test(state.depth_test);
        self.context.set_depth_func(state.depth_func);
        self.context.set_cull_face(state.cull_face);
        self.context.set_depth_write(state.depth_write);
    }

    pub fn fixed_function_state(&self) -> FixedFunctionState {
        self.context.fixed_function_state()
    }

    pub fn viewport(&self) -> Viewport {
        self.context.viewport()
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.context.set_depth_test(enabled);
    }

    pub fn set_depth_func(&mut self, func: DepthFunc) {
        self.context.set_depth_func(func);
    }

    pub fn set_blend(&mut self, mode: Option<BlendMode>) {
        self.context.set_blend(mode);
    }

    pub fn blend_mode(&self) -> Option<BlendMode> {
        self.context.blend_mode()
    }

    // ===== SHADOW ATLASES =====

    pub fn directional_atlas(&self) -> Option<&ShadowAtlas> {
        self.directional_atlas.as_ref()
    }

    pub fn point_atlas(&self) -> Option<&ShadowAtlas> {
        self.point_atlas.as_ref()
    }

    /// Reallocate the atlases whose light count changed
    pub fn sync_shadow_atlases(&mut self, directional_lights: usize, point_lights: usize) -> Result<()> {
        if self.directional_atlas.as_ref().map_or(true, |a| a.needs_resize(directional_lights)) {
            let atlas = self.allocate_atlas(ShadowAtlasKind::Directional, directional_lights)?;
            self.directional_atlas = Some(atlas);
        }
        if self.point_atlas.as_ref().map_or(true, |a| a.needs_resize(point_lights)) {
            let atlas = self.allocate_atlas(ShadowAtlasKind::Point, point_lights)?;
            self.point_atlas = Some(atlas);
        }
        Ok(())
    }

    fn allocate_atlas(&mut self, kind: ShadowAtlasKind, light_count: usize) -> Result<ShadowAtlas> {
        let previous = match kind {
            ShadowAtlasKind::Directional => self.directional_atlas.take(),
            ShadowAtlasKind::Point => self.point_atlas.take(),
        };
        if let Some(previous) = previous {
            self.release_framebuffer(previous.framebuffer_name());
            self.release_texture(previous.texture());
        }

        let size = self.config.shadow_map_size;
        let layers = kind.required_layers(light_count);
        let texture = self.create_texture(kind.resource_name(), &TextureDesc::depth_array(size, size, layers))?;
        if let Err(e) = self.create_framebuffer(
            kind.resource_name(),
            vec![AttachmentDesc::depth_layer(ATLAS_DEPTH_ATTACHMENT, texture, 0)],
            DrawFlags::SHADOW,
        ) {
            self.release_texture(texture);
            return Err(e);
        }
        engine_info!(SOURCE, "{:?} shadow atlas sized for {} lights ({} layers)", kind, light_count, layers);
        Ok(ShadowAtlas::new(kind, texture, size, light_count))
    }

    // ===== FRAME LOOP =====

    /// Run one frame
    ///
    /// Clamped delta time, caller update, surface resize, back buffer clear,
    /// shadow atlas sync, point shadow faces, directional shadows, main pass.
    pub fn render_frame<F>(&mut self, scene: &mut Scene, timestamp: f64, mut update: F) -> Result<FrameTime>
    where
        F: FnMut(&mut Scene, &FrameTime),
    {
        let frame = self.clock.tick(timestamp);
        update(scene, &frame);

        let display = self.context.display_size();
        if self.context.surface_size() != display {
            self.context.resize_surface(display.0, display.1);
        }
        if self.active_framebuffer.is_some() {
            self.unuse_framebuffer();
        }
        self.context.set_viewport(Viewport::new(display.0, display.1));
        self.context.set_depth_write(true);
        self.clear_framebuffer();

        self.sync_shadow_atlases(scene.directional_light_count(), scene.point_light_count())?;
        scene.render(self, &frame)?;
        Ok(frame)
    }

    /// Orthographic projection mapping pixels of the surface to clip space
    pub fn projection_2d(&self) -> Mat4 {
        let (w, h) = self.context.surface_size();
        Mat4::orthographic_rh_gl(0.0, w as f32, 0.0, h as f32, -1.0, 1.0)
    }

    /// Width over height of the surface
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.context.surface_size();
        w.max(1) as f32 / h.max(1) as f32
    }

    // ===== TEARDOWN =====

    /// Destroy every GPU object owned by the manager
    pub fn release_all(&mut self) {
        if self.active_framebuffer.is_some() {
            self.unuse_framebuffer();
        }
        self.clear_shader();

        for (_, fb) in self.framebuffers.drain() {
            self.context.delete_framebuffer(fb.handle());
        }
        for (_, program) in self.programs.drain() {
            if let Some(handle) = program.handle() {
                self.context.delete_program(handle);
            }
        }
        for (_, texture) in self.textures.drain() {
            self.context.delete_texture(texture.handle());
        }
        for (_, mesh) in self.meshes.drain() {
            self.context.delete_mesh(mesh.handle());
        }
        self.builtin_meshes = BuiltinMeshes::default();
        self.directional_atlas = None;
        self.point_atlas = None;
    }

    /// Clear color of the back buffer
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.config.clear_color = color;
    }
}

impl Drop for GraphicsManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

// ===== SCOPED BINDINGS =====

/// Active program guard returned by `GraphicsManager::scoped_shader`
pub struct ShaderScope<'a> {
    manager: &'a mut GraphicsManager,
    previous: Option<String>,
}

impl Deref for ShaderScope<'_> {
    type Target = GraphicsManager;

    fn deref(&self) -> &GraphicsManager {
        self.manager
    }
}

impl DerefMut for ShaderScope<'_> {
    fn deref_mut(&mut self) -> &mut GraphicsManager {
        self.manager
    }
}

impl Drop for ShaderScope<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(name) => {
                if self.manager.use_shader(&name).is_err() {
                    self.manager.clear_shader();
                }
            }
            None => self.manager.clear_shader(),
        }
    }
}

/// Framebuffer guard returned by `GraphicsManager::scoped_framebuffer`
pub struct FramebufferScope<'a> {
    manager: &'a mut GraphicsManager,
    previous: Option<ActiveFramebuffer>,
}

impl Deref for FramebufferScope<'_> {
    type Target = GraphicsManager;

    fn deref(&self) -> &GraphicsManager {
        self.manager
    }
}

impl DerefMut for FramebufferScope<'_> {
    fn deref_mut(&mut self) -> &mut GraphicsManager {
        self.manager
    }
}

impl Drop for FramebufferScope<'_> {
    fn drop(&mut self) {
        self.manager.unuse_framebuffer();
        if let Some(previous) = self.previous.take() {
            self.manager.context.bind_framebuffer(Some(previous.handle));
            self.manager.active_framebuffer = Some(previous);
        }
    }
}

#[cfg(test)]
#[path = "graphics_manager_tests.rs"]
mod tests;
