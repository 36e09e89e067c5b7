/// Framebuffer: named render target built from texture attachments, with
/// the draw-state flags applied while it is bound.

use bitflags::bitflags;
use glam::Vec4;
use crate::error::{Error, Result};
use crate::gpu::{
    AttachmentPoint, AttachmentTarget, CubeFace, CullFace, DepthFunc, FixedFunctionState,
    GpuFramebuffer, Texture, TextureKey, TextureKind, Viewport,
};

bitflags! {
    /// Fixed-function state a framebuffer sets on bind and restores on unbind
    ///
    /// At most one `CULL_*` and at most one `DEPTH_FUNC_*` flag may be set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawFlags: u32 {
        const DEPTH_TEST = 1 << 0;
        const CULL_FRONT = 1 << 1;
        const CULL_BACK = 1 << 2;
        const CULL_FRONT_AND_BACK = 1 << 3;
        const DEPTH_FUNC_NEVER = 1 << 4;
        const DEPTH_FUNC_LESS = 1 << 5;
        const DEPTH_FUNC_EQUAL = 1 << 6;
        const DEPTH_FUNC_LESS_EQUAL = 1 << 7;
        const DEPTH_FUNC_GREATER = 1 << 8;
        const DEPTH_FUNC_NOT_EQUAL = 1 << 9;
        const DEPTH_FUNC_GREATER_EQUAL = 1 << 10;
        const DEPTH_FUNC_ALWAYS = 1 << 11;
        const FORCE_WRITE_DEPTH = 1 << 12;

        const CULL_MASK = Self::CULL_FRONT.bits()
            | Self::CULL_BACK.bits()
            | Self::CULL_FRONT_AND_BACK.bits();
        const DEPTH_FUNC_MASK = Self::DEPTH_FUNC_NEVER.bits()
            | Self::DEPTH_FUNC_LESS.bits()
            | Self::DEPTH_FUNC_EQUAL.bits()
            | Self::DEPTH_FUNC_LESS_EQUAL.bits()
            | Self::DEPTH_FUNC_GREATER.bits()
            | Self::DEPTH_FUNC_NOT_EQUAL.bits()
            | Self::DEPTH_FUNC_GREATER_EQUAL.bits()
            | Self::DEPTH_FUNC_ALWAYS.bits();
    }
}

impl DrawFlags {
    /// Flags used by the shadow atlases
    pub const SHADOW: DrawFlags = DrawFlags::DEPTH_TEST
        .union(DrawFlags::CULL_FRONT)
        .union(DrawFlags::DEPTH_FUNC_LESS)
        .union(DrawFlags::FORCE_WRITE_DEPTH);

    /// Reject contradictory combinations
    pub fn validate(&self) -> Result<()> {
        if self.intersection(DrawFlags::CULL_MASK).bits().count_ones() > 1 {
            return Err(Error::UnsupportedDrawFlags(format!(
                "more than one cull mode in {:?}", self
            )));
        }
        if self.intersection(DrawFlags::DEPTH_FUNC_MASK).bits().count_ones() > 1 {
            return Err(Error::UnsupportedDrawFlags(format!(
                "more than one depth function in {:?}", self
            )));
        }
        Ok(())
    }

    pub fn cull_face(&self) -> Option<CullFace> {
        if self.contains(DrawFlags::CULL_FRONT) {
            Some(CullFace::Front)
        } else if self.contains(DrawFlags::CULL_BACK) {
            Some(CullFace::Back)
        } else if self.contains(DrawFlags::CULL_FRONT_AND_BACK) {
            Some(CullFace::FrontAndBack)
        } else {
            None
        }
    }

    pub fn depth_func(&self) -> Option<DepthFunc> {
        const TABLE: [(DrawFlags, DepthFunc); 8] = [
            (DrawFlags::DEPTH_FUNC_NEVER, DepthFunc::Never),
            (DrawFlags::DEPTH_FUNC_LESS, DepthFunc::Less),
            (DrawFlags::DEPTH_FUNC_EQUAL, DepthFunc::Equal),
            (DrawFlags::DEPTH_FUNC_LESS_EQUAL, DepthFunc::LessEqual),
            (DrawFlags::DEPTH_FUNC_GREATER, DepthFunc::Greater),
            (DrawFlags::DEPTH_FUNC_NOT_EQUAL, DepthFunc::NotEqual),
            (DrawFlags::DEPTH_FUNC_GREATER_EQUAL, DepthFunc::GreaterEqual),
            (DrawFlags::DEPTH_FUNC_ALWAYS, DepthFunc::Always),
        ];
        TABLE.iter().find(|(flag, _)| self.contains(*flag)).map(|(_, func)| *func)
    }

    /// State in effect while bound, starting from `current`
    ///
    /// Depth test and culling are always set from the flags; depth function
    /// and depth write only change when requested.
    pub fn apply_to(&self, current: FixedFunctionState) -> FixedFunctionState {
        FixedFunctionState {
            depth_test: self.contains(DrawFlags::DEPTH_TEST),
            depth_func: self.depth_func().unwrap_or(current.depth_func),
            cull_face: self.cull_face(),
            depth_write: current.depth_write || self.contains(DrawFlags::FORCE_WRITE_DEPTH),
        }
    }
}

/// Attachment semantic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentType {
    Color,
    Depth,
    DepthStencil,
    ColorArrayLayer,
    DepthArrayLayer,
    CubeMapFace,
    DepthCubeMapFace,
}

impl AttachmentType {
    /// Texture kind this attachment type must be backed by
    pub fn texture_kind(&self) -> TextureKind {
        match self {
            AttachmentType::Color => TextureKind::Color,
            AttachmentType::Depth => TextureKind::Depth,
            AttachmentType::DepthStencil => TextureKind::DepthStencil,
            AttachmentType::ColorArrayLayer => TextureKind::ColorArray,
            AttachmentType::DepthArrayLayer => TextureKind::DepthArray,
            AttachmentType::CubeMapFace => TextureKind::CubeMap,
            AttachmentType::DepthCubeMapFace => TextureKind::DepthCubeMap,
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(
            self,
            AttachmentType::Color | AttachmentType::ColorArrayLayer | AttachmentType::CubeMapFace
        )
    }

    pub fn is_layered(&self) -> bool {
        matches!(self, AttachmentType::ColorArrayLayer | AttachmentType::DepthArrayLayer)
    }

    pub fn is_cube_face(&self) -> bool {
        matches!(self, AttachmentType::CubeMapFace | AttachmentType::DepthCubeMapFace)
    }
}

/// Description of one attachment
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDesc {
    pub name: String,
    pub attachment_type: AttachmentType,
    pub texture: TextureKey,
    /// Array layer, for layered types
    pub layer: u32,
    /// Cubemap face, for face types
    pub cube_face: CubeFace,
    pub mip_level: u32,
}

impl AttachmentDesc {
    pub fn new(name: &str, attachment_type: AttachmentType, texture: TextureKey) -> Self {
        Self {
            name: name.to_string(),
            attachment_type,
            texture,
            layer: 0,
            cube_face: CubeFace::PositiveX,
            mip_level: 0,
        }
    }

    pub fn color(name: &str, texture: TextureKey) -> Self {
        Self::new(name, AttachmentType::Color, texture)
    }

    pub fn depth(name: &str, texture: TextureKey) -> Self {
        Self::new(name, AttachmentType::Depth, texture)
    }

    pub fn depth_layer(name: &str, texture: TextureKey, layer: u32) -> Self {
        Self { layer, ..Self::new(name, AttachmentType::DepthArrayLayer, texture) }
    }

    pub fn color_layer(name: &str, texture: TextureKey, layer: u32) -> Self {
        Self { layer, ..Self::new(name, AttachmentType::ColorArrayLayer, texture) }
    }

    pub fn cube_face(name: &str, texture: TextureKey, face: CubeFace) -> Self {
        Self { cube_face: face, ..Self::new(name, AttachmentType::CubeMapFace, texture) }
    }

    pub fn with_mip_level(mut self, mip_level: u32) -> Self {
        self.mip_level = mip_level;
        self
    }

    /// Check type pairing, layer range and mip range against the backing texture
    pub fn validate(&self, texture: &Texture) -> Result<()> {
        let expected = self.attachment_type.texture_kind();
        if texture.kind() != expected {
            return Err(Error::UnsupportedAttachment(format!(
                "attachment '{}' of type {:?} needs a {:?} texture, got {:?} '{}'",
                self.name, self.attachment_type, expected, texture.kind(), texture.name()
            )));
        }
        if self.attachment_type.is_layered() && self.layer >= texture.layers() {
            return Err(Error::UnsupportedAttachment(format!(
                "attachment '{}' layer {} out of range, '{}' has {} layers",
                self.name, self.layer, texture.name(), texture.layers()
            )));
        }
        let max_dimension = texture.width().max(texture.height()).max(1);
        if self.mip_level > max_dimension.ilog2() {
            return Err(Error::UnsupportedAttachment(format!(
                "attachment '{}' mip level {} out of range", self.name, self.mip_level
            )));
        }
        Ok(())
    }

    /// Attachment point, given the index among color attachments
    pub(crate) fn point(&self, color_index: u32) -> AttachmentPoint {
        match self.attachment_type {
            AttachmentType::Depth | AttachmentType::DepthArrayLayer | AttachmentType::DepthCubeMapFace => {
                AttachmentPoint::Depth
            }
            AttachmentType::DepthStencil => AttachmentPoint::DepthStencil,
            _ => AttachmentPoint::Color(color_index),
        }
    }

    pub(crate) fn target(&self) -> AttachmentTarget {
        if self.attachment_type.is_layered() {
            AttachmentTarget::Layer(self.layer)
        } else if self.attachment_type.is_cube_face() {
            AttachmentTarget::CubeFace(self.cube_face)
        } else {
            AttachmentTarget::Texture2D
        }
    }
}

/// One attachment as stored in the framebuffer
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub desc: AttachmentDesc,
    pub point: AttachmentPoint,
}

/// Render target owned by `GraphicsManager`
#[derive(Debug, Clone)]
pub struct Framebuffer {
    name: String,
    handle: GpuFramebuffer,
    width: u32,
    height: u32,
    attachments: Vec<Attachment>,
    draw_flags: DrawFlags,
    clear_color: Vec4,
}

impl Framebuffer {
    pub(crate) fn new(
        name: &str,
        handle: GpuFramebuffer,
        (width, height): (u32, u32),
        attachments: Vec<Attachment>,
        draw_flags: DrawFlags,
    ) -> Self {
        Self {
            name: name.to_string(),
            handle,
            width,
            height,
            attachments,
            draw_flags,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> GpuFramebuffer {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn draw_flags(&self) -> DrawFlags {
        self.draw_flags
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    /// Attachments in declaration order
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.desc.name == name)
    }

    pub(crate) fn attachment_mut(&mut self, name: &str) -> Option<&mut Attachment> {
        self.attachments.iter_mut().find(|a| a.desc.name == name)
    }

    pub fn has_color(&self) -> bool {
        self.attachments.iter().any(|a| a.desc.attachment_type.is_color())
    }

    pub fn has_depth(&self) -> bool {
        self.attachments.iter().any(|a| !a.desc.attachment_type.is_color())
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
