/// GPU resource mediation: programs, framebuffers, meshes, materials,
/// shadow atlases and the frame clock.

pub mod shader_program;
pub mod framebuffer;
pub mod frame_clock;
pub mod mesh;
pub mod material;
pub mod programs;
pub mod shadow_atlas;
pub mod graphics_manager;

pub use shader_program::{ShaderProgram, UniformInfo};
pub use framebuffer::{Attachment, AttachmentDesc, AttachmentType, DrawFlags, Framebuffer};
pub use frame_clock::{FrameClock, FrameTime};
pub use mesh::{cube_mesh_data, quad_mesh_data, BoundingSphere, Mesh, MeshKey};
pub use material::{Material, MaterialInput, Model};
pub use programs::*;
pub use shadow_atlas::{ShadowAtlas, ShadowAtlasKind, ATLAS_DEPTH_ATTACHMENT};
pub use graphics_manager::{
    FramebufferScope, GraphicsManager, ShaderScope, NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE, UV_ATTRIBUTE,
};
