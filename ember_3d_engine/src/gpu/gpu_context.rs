/// GpuContext trait, the only path from the engine to a graphics API.
///
/// The shape follows an immediate-mode, GL-like API: one bound program, one
/// bound framebuffer, and global fixed-function state that can be queried
/// back. `GraphicsManager` is the only caller; it owns the boxed context.

use std::any::Any;
use glam::Vec4;
use crate::error::Result;
use super::texture::{TextureDesc, TextureKind, CubeFace};

// ===== HANDLES =====

/// Compiled shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuShader(pub u32);

/// Linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuProgram(pub u32);

/// Texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuTexture(pub u32);

/// Framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuFramebuffer(pub u32);

/// Uploaded vertex/index arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuMesh(pub u32);

/// Uniform location inside one program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

// ===== STATE TYPES =====

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Faces discarded by culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
    FrontAndBack,
}

/// Snapshot of the fixed-function state a framebuffer bind may change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFunctionState {
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    /// `None` when culling is disabled
    pub cull_face: Option<CullFace>,
    pub depth_write: bool,
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_func: DepthFunc::Less,
            cull_face: None,
            depth_write: true,
        }
    }
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Alpha blending equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// src_alpha, one_minus_src_alpha
    Alpha,
    /// one, one
    Additive,
}

/// Attachment point on the bound framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

/// Which image of a texture an attachment refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentTarget {
    /// Whole 2D texture
    Texture2D,
    /// One layer of an array texture
    Layer(u32),
    /// One face of a cubemap
    CubeFace(CubeFace),
}

/// Completeness status of the bound framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    IncompleteMissingAttachment,
    IncompleteDimensions,
    Unsupported,
}

/// Vertex attribute locations resolved for a mesh upload
///
/// `None` entries are skipped by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub position: Option<u32>,
    pub normal: Option<u32>,
    pub uv: Option<u32>,
}

/// Raw uniform payload handed to the context
///
/// Vectors and matrices are flattened column-major; arrays are consecutive
/// elements starting at the target location.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData {
    Float { components: u8, values: Vec<f32> },
    Int { components: u8, values: Vec<i32> },
    Matrix { dimension: u8, values: Vec<f32> },
}

/// Triangle mesh arrays supplied by an external importer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<glam::Vec3>,
    pub normals: Vec<glam::Vec3>,
    pub uvs: Vec<glam::Vec2>,
    pub indices: Vec<u32>,
}

// ===== TRAIT =====

/// Graphics API seam
///
/// Errors from creation calls are returned as `Error::BackendError` or
/// `Error::ShaderCompilation`; state setters cannot fail.
pub trait GpuContext {
    /// Concrete context, for inspection by tools and tests
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    // Programs

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<GpuShader>;
    fn link_program(&mut self, shaders: &[GpuShader]) -> Result<GpuProgram>;
    fn delete_program(&mut self, program: GpuProgram);
    fn use_program(&mut self, program: Option<GpuProgram>);
    fn uniform_location(&mut self, program: GpuProgram, name: &str) -> Option<UniformLocation>;
    fn attribute_location(&mut self, program: GpuProgram, name: &str) -> Option<u32>;
    /// Upload to the currently used program
    fn set_uniform(&mut self, location: UniformLocation, data: &UniformData, transpose: bool);
    /// Read back the value stored at a location of a linked program
    fn uniform_value(&self, program: GpuProgram, location: UniformLocation) -> Option<UniformData>;

    // Textures

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuTexture>;
    fn delete_texture(&mut self, texture: GpuTexture);
    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: GpuTexture);

    // Framebuffers

    fn create_framebuffer(&mut self) -> Result<GpuFramebuffer>;
    fn delete_framebuffer(&mut self, framebuffer: GpuFramebuffer);
    /// `None` binds the default (window) framebuffer
    fn bind_framebuffer(&mut self, framebuffer: Option<GpuFramebuffer>);
    /// Attach to the bound framebuffer
    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        texture: GpuTexture,
        target: AttachmentTarget,
        mip_level: u32,
    );
    fn set_draw_buffers(&mut self, color_attachments: u32);
    fn framebuffer_status(&self) -> FramebufferStatus;

    // Fixed-function state

    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    fn fixed_function_state(&self) -> FixedFunctionState;
    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_func(&mut self, func: DepthFunc);
    fn set_cull_face(&mut self, cull: Option<CullFace>);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_blend(&mut self, mode: Option<BlendMode>);
    fn blend_mode(&self) -> Option<BlendMode>;
    /// Clear the bound framebuffer; `None` color leaves color untouched
    fn clear(&mut self, color: Option<Vec4>, depth: bool, stencil: bool);

    // Meshes

    fn create_mesh(&mut self, data: &MeshData, layout: &VertexLayout) -> Result<GpuMesh>;
    fn delete_mesh(&mut self, mesh: GpuMesh);
    fn draw_mesh(&mut self, mesh: GpuMesh);

    // Surface

    /// Current display size of the presentation surface
    fn display_size(&self) -> (u32, u32);
    /// Size of the back buffer
    fn surface_size(&self) -> (u32, u32);
    fn resize_surface(&mut self, width: u32, height: u32);
}
