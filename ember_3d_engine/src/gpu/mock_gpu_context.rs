/// Headless in-memory GpuContext.
///
/// Keeps every object the engine creates in hash maps and records draws and
/// clears so tests and tools can inspect a frame without a GPU. Uniform names
/// resolve when their base identifier appears in one of the program's shader
/// sources, which mirrors how a real driver strips unused uniforms.

use std::any::Any;
use glam::{Mat2, Mat3, Mat4, Vec4};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use super::gpu_context::*;
use super::texture::{TextureDesc, TextureKind};

// ============================================================================
// Recorded calls
// ============================================================================

/// One `draw_mesh` call
#[derive(Debug, Clone, PartialEq)]
pub struct MockDrawCall {
    pub mesh: GpuMesh,
    pub program: Option<GpuProgram>,
    pub framebuffer: Option<GpuFramebuffer>,
    /// Layer of the bound framebuffer's depth attachment, if layered
    pub depth_layer: Option<u32>,
    pub state: FixedFunctionState,
    pub blend: Option<BlendMode>,
}

/// One `clear` call
#[derive(Debug, Clone, PartialEq)]
pub struct MockClear {
    pub framebuffer: Option<GpuFramebuffer>,
    pub color: Option<Vec4>,
    pub depth: bool,
    pub depth_layer: Option<u32>,
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Default)]
struct MockProgram {
    sources: Vec<String>,
    locations: FxHashMap<String, UniformLocation>,
    values: FxHashMap<UniformLocation, UniformData>,
    attributes: FxHashMap<String, u32>,
}

#[derive(Debug, Clone, Copy)]
struct MockTexture {
    kind: TextureKind,
    layers: u32,
}

#[derive(Debug, Default)]
struct MockFramebuffer {
    attachments: Vec<(AttachmentPoint, GpuTexture, AttachmentTarget, u32)>,
    draw_buffers: u32,
}

#[derive(Debug, Clone, Copy)]
struct MockMesh {
    layout: VertexLayout,
}

// ============================================================================
// Mock context
// ============================================================================

/// In-memory implementation of `GpuContext`
#[derive(Debug)]
pub struct MockGpuContext {
    next_id: u32,
    shaders: FxHashMap<GpuShader, (ShaderStage, String)>,
    programs: FxHashMap<GpuProgram, MockProgram>,
    current_program: Option<GpuProgram>,
    textures: FxHashMap<GpuTexture, MockTexture>,
    texture_units: FxHashMap<u32, GpuTexture>,
    framebuffers: FxHashMap<GpuFramebuffer, MockFramebuffer>,
    bound_framebuffer: Option<GpuFramebuffer>,
    meshes: FxHashMap<GpuMesh, MockMesh>,
    viewport: Viewport,
    state: FixedFunctionState,
    blend: Option<BlendMode>,
    display_size: (u32, u32),
    surface_size: (u32, u32),
    forced_status: Option<FramebufferStatus>,
    draw_calls: Vec<MockDrawCall>,
    clears: Vec<MockClear>,
}

impl MockGpuContext {
    /// Context with an 800x600 display
    pub fn new() -> Self {
        Self::with_display_size(800, 600)
    }

    pub fn with_display_size(width: u32, height: u32) -> Self {
        Self {
            next_id: 1,
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            current_program: None,
            textures: FxHashMap::default(),
            texture_units: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            bound_framebuffer: None,
            meshes: FxHashMap::default(),
            viewport: Viewport::new(width, height),
            state: FixedFunctionState::default(),
            blend: None,
            display_size: (width, height),
            surface_size: (width, height),
            forced_status: None,
            draw_calls: Vec::new(),
            clears: Vec::new(),
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ===== TEST CONTROLS =====

    /// Simulate a window resize
    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display_size = (width, height);
    }

    /// Force every status query to report `status`
    pub fn force_framebuffer_status(&mut self, status: Option<FramebufferStatus>) {
        self.forced_status = status;
    }

    /// Overwrite the fixed-function state directly
    pub fn set_fixed_function_state(&mut self, state: FixedFunctionState) {
        self.state = state;
    }

    // ===== INSPECTION =====

    pub fn draw_calls(&self) -> &[MockDrawCall] {
        &self.draw_calls
    }

    pub fn clears(&self) -> &[MockClear] {
        &self.clears
    }

    /// Forget recorded draws and clears
    pub fn reset_recording(&mut self) {
        self.draw_calls.clear();
        self.clears.clear();
    }

    pub fn current_program(&self) -> Option<GpuProgram> {
        self.current_program
    }

    pub fn bound_framebuffer(&self) -> Option<GpuFramebuffer> {
        self.bound_framebuffer
    }

    pub fn bound_texture(&self, unit: u32) -> Option<GpuTexture> {
        self.texture_units.get(&unit).copied()
    }

    pub fn blend(&self) -> Option<BlendMode> {
        self.blend
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Attachments of a framebuffer as (point, texture, target)
    pub fn attachments(&self, framebuffer: GpuFramebuffer) -> Vec<(AttachmentPoint, GpuTexture, AttachmentTarget)> {
        self.framebuffers
            .get(&framebuffer)
            .map(|fb| fb.attachments.iter().map(|(p, t, target, _)| (*p, *t, *target)).collect())
            .unwrap_or_default()
    }

    /// Layer count a texture was created with
    pub fn texture_layers(&self, texture: GpuTexture) -> Option<u32> {
        self.textures.get(&texture).map(|t| t.layers)
    }

    /// Vertex layout a mesh was uploaded with
    pub fn mesh_layout(&self, mesh: GpuMesh) -> Option<VertexLayout> {
        self.meshes.get(&mesh).map(|m| m.layout)
    }

    fn depth_layer(&self) -> Option<u32> {
        let fb = self.framebuffers.get(&self.bound_framebuffer?)?;
        fb.attachments.iter().find_map(|(point, _, target, _)| match (point, target) {
            (AttachmentPoint::Depth | AttachmentPoint::DepthStencil, AttachmentTarget::Layer(layer)) => Some(*layer),
            _ => None,
        })
    }
}

impl Default for MockGpuContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier a uniform or attribute name is looked up by in the sources
fn base_identifier(name: &str) -> &str {
    let end = name.find(|c| c == '[' || c == '.').unwrap_or(name.len());
    &name[..end]
}

fn transpose_blocks(dimension: u8, values: &[f32]) -> Vec<f32> {
    let block = (dimension as usize) * (dimension as usize);
    values
        .chunks(block)
        .flat_map(|chunk| match dimension {
            2 => Mat2::from_cols_slice(chunk).transpose().to_cols_array().to_vec(),
            3 => Mat3::from_cols_slice(chunk).transpose().to_cols_array().to_vec(),
            _ => Mat4::from_cols_slice(chunk).transpose().to_cols_array().to_vec(),
        })
        .collect()
}

impl GpuContext for MockGpuContext {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<GpuShader> {
        if source.trim().is_empty() {
            return Err(Error::ShaderCompilation(format!("{:?} stage source is empty", stage)));
        }
        let shader = GpuShader(self.next_id());
        self.shaders.insert(shader, (stage, source.to_string()));
        Ok(shader)
    }

    fn link_program(&mut self, shaders: &[GpuShader]) -> Result<GpuProgram> {
        let mut program = MockProgram::default();
        let mut has_vertex = false;
        let mut has_fragment = false;
        for shader in shaders {
            let (stage, source) = self.shaders.get(shader).ok_or_else(|| {
                Error::ShaderCompilation(format!("unknown shader {:?}", shader))
            })?;
            match stage {
                ShaderStage::Vertex => has_vertex = true,
                ShaderStage::Fragment => has_fragment = true,
            }
            program.sources.push(source.clone());
        }
        if !(has_vertex && has_fragment) {
            return Err(Error::ShaderCompilation(
                "program needs a vertex and a fragment stage".to_string(),
            ));
        }
        let handle = GpuProgram(self.next_id());
        self.programs.insert(handle, program);
        Ok(handle)
    }

    fn delete_program(&mut self, program: GpuProgram) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<GpuProgram>) {
        self.current_program = program;
    }

    fn uniform_location(&mut self, program: GpuProgram, name: &str) -> Option<UniformLocation> {
        let next = self.next_id as i32;
        let entry = self.programs.get_mut(&program)?;
        if let Some(location) = entry.locations.get(name) {
            return Some(*location);
        }
        let base = base_identifier(name);
        if base.is_empty() || !entry.sources.iter().any(|s| s.contains(base)) {
            return None;
        }
        let location = UniformLocation(next);
        entry.locations.insert(name.to_string(), location);
        self.next_id += 1;
        Some(location)
    }

    fn attribute_location(&mut self, program: GpuProgram, name: &str) -> Option<u32> {
        let entry = self.programs.get_mut(&program)?;
        if let Some(location) = entry.attributes.get(name) {
            return Some(*location);
        }
        if !entry.sources.iter().any(|s| s.contains(name)) {
            return None;
        }
        let location = entry.attributes.len() as u32;
        entry.attributes.insert(name.to_string(), location);
        Some(location)
    }

    fn set_uniform(&mut self, location: UniformLocation, data: &UniformData, transpose: bool) {
        let Some(program) = self.current_program.and_then(|p| self.programs.get_mut(&p)) else {
            return;
        };
        let stored = match data {
            UniformData::Matrix { dimension, values } if transpose => UniformData::Matrix {
                dimension: *dimension,
                values: transpose_blocks(*dimension, values),
            },
            other => other.clone(),
        };
        program.values.insert(location, stored);
    }

    fn uniform_value(&self, program: GpuProgram, location: UniformLocation) -> Option<UniformData> {
        self.programs.get(&program)?.values.get(&location).cloned()
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuTexture> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::BackendError(format!(
                "texture extent {}x{} is empty", desc.width, desc.height
            )));
        }
        let layers = if desc.kind.is_array() {
            desc.layers.max(1)
        } else if desc.kind.is_cube_map() {
            6
        } else {
            1
        };
        let texture = GpuTexture(self.next_id());
        self.textures.insert(texture, MockTexture { kind: desc.kind, layers });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: GpuTexture) {
        self.textures.remove(&texture);
        self.texture_units.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&mut self, unit: u32, _kind: TextureKind, texture: GpuTexture) {
        self.texture_units.insert(unit, texture);
    }

    fn create_framebuffer(&mut self) -> Result<GpuFramebuffer> {
        let framebuffer = GpuFramebuffer(self.next_id());
        self.framebuffers.insert(framebuffer, MockFramebuffer::default());
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: GpuFramebuffer) {
        self.framebuffers.remove(&framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<GpuFramebuffer>) {
        self.bound_framebuffer = framebuffer;
    }

    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        texture: GpuTexture,
        target: AttachmentTarget,
        mip_level: u32,
    ) {
        let Some(fb) = self.bound_framebuffer.and_then(|f| self.framebuffers.get_mut(&f)) else {
            return;
        };
        fb.attachments.retain(|(p, ..)| *p != point);
        fb.attachments.push((point, texture, target, mip_level));
    }

    fn set_draw_buffers(&mut self, color_attachments: u32) {
        if let Some(fb) = self.bound_framebuffer.and_then(|f| self.framebuffers.get_mut(&f)) {
            fb.draw_buffers = color_attachments;
        }
    }

    fn framebuffer_status(&self) -> FramebufferStatus {
        if let Some(status) = self.forced_status {
            return status;
        }
        let Some(fb) = self.bound_framebuffer.and_then(|f| self.framebuffers.get(&f)) else {
            return FramebufferStatus::Complete;
        };
        if fb.attachments.is_empty() {
            return FramebufferStatus::IncompleteMissingAttachment;
        }
        for (_, texture, target, _) in &fb.attachments {
            let Some(info) = self.textures.get(texture) else {
                return FramebufferStatus::IncompleteAttachment;
            };
            let valid = match target {
                AttachmentTarget::Texture2D => !info.kind.is_array() && !info.kind.is_cube_map(),
                AttachmentTarget::Layer(layer) => info.kind.is_array() && *layer < info.layers,
                AttachmentTarget::CubeFace(_) => info.kind.is_cube_map(),
            };
            if !valid {
                return FramebufferStatus::IncompleteAttachment;
            }
        }
        FramebufferStatus::Complete
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn fixed_function_state(&self) -> FixedFunctionState {
        self.state
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.state.depth_func = func;
    }

    fn set_cull_face(&mut self, cull: Option<CullFace>) {
        self.state.cull_face = cull;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth_write = enabled;
    }

    fn set_blend(&mut self, mode: Option<BlendMode>) {
        self.blend = mode;
    }

    fn blend_mode(&self) -> Option<BlendMode> {
        self.blend
    }

    fn clear(&mut self, color: Option<Vec4>, depth: bool, _stencil: bool) {
        let depth_layer = self.depth_layer();
        self.clears.push(MockClear {
            framebuffer: self.bound_framebuffer,
            color,
            depth,
            depth_layer,
        });
    }

    fn create_mesh(&mut self, data: &MeshData, layout: &VertexLayout) -> Result<GpuMesh> {
        if data.positions.is_empty() {
            return Err(Error::BackendError("mesh has no positions".to_string()));
        }
        let mesh = GpuMesh(self.next_id());
        self.meshes.insert(mesh, MockMesh { layout: *layout });
        Ok(mesh)
    }

    fn delete_mesh(&mut self, mesh: GpuMesh) {
        self.meshes.remove(&mesh);
    }

    fn draw_mesh(&mut self, mesh: GpuMesh) {
        let depth_layer = self.depth_layer();
        self.draw_calls.push(MockDrawCall {
            mesh,
            program: self.current_program,
            framebuffer: self.bound_framebuffer,
            depth_layer,
            state: self.state,
            blend: self.blend,
        });
    }

    fn display_size(&self) -> (u32, u32) {
        self.display_size
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }
}

#[cfg(test)]
#[path = "mock_gpu_context_tests.rs"]
mod tests;
