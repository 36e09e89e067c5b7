/// Shared depth-array shadow atlases.
///
/// One atlas per light kind. A directional light owns one layer, a point
/// light owns six consecutive layers (one per cube face). The atlas is
/// reallocated whenever the number of lights of its kind changes, and every
/// light is then addressed by its contiguous registry slot.

use crate::gpu::TextureKey;

/// Light kind an atlas serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowAtlasKind {
    Directional,
    Point,
}

impl ShadowAtlasKind {
    pub fn layers_per_light(&self) -> u32 {
        match self {
            ShadowAtlasKind::Directional => 1,
            ShadowAtlasKind::Point => 6,
        }
    }

    /// Name of the atlas texture and framebuffer
    pub fn resource_name(&self) -> &'static str {
        match self {
            ShadowAtlasKind::Directional => "ember3d.directional_shadow_atlas",
            ShadowAtlasKind::Point => "ember3d.point_shadow_atlas",
        }
    }

    /// Layers needed for `light_count` lights, never zero
    pub fn required_layers(&self, light_count: usize) -> u32 {
        (light_count as u32 * self.layers_per_light()).max(1)
    }
}

/// Attachment name of the atlas depth layer
pub const ATLAS_DEPTH_ATTACHMENT: &str = "depth";

/// A live atlas: texture, framebuffer and the roster size it was built for
#[derive(Debug, Clone)]
pub struct ShadowAtlas {
    kind: ShadowAtlasKind,
    texture: TextureKey,
    size: u32,
    light_count: usize,
}

impl ShadowAtlas {
    pub(crate) fn new(kind: ShadowAtlasKind, texture: TextureKey, size: u32, light_count: usize) -> Self {
        Self { kind, texture, size, light_count }
    }

    pub fn kind(&self) -> ShadowAtlasKind {
        self.kind
    }

    pub fn texture(&self) -> TextureKey {
        self.texture
    }

    pub fn framebuffer_name(&self) -> &'static str {
        self.kind.resource_name()
    }

    /// Edge length of each layer
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn light_count(&self) -> usize {
        self.light_count
    }

    pub fn layers(&self) -> u32 {
        self.kind.required_layers(self.light_count)
    }

    /// First layer of the light in registry slot `slot`
    pub fn layer_offset(&self, slot: usize) -> u32 {
        slot as u32 * self.kind.layers_per_light()
    }

    pub fn needs_resize(&self, light_count: usize) -> bool {
        self.light_count != light_count
    }
}

#[cfg(test)]
#[path = "shadow_atlas_tests.rs"]
mod tests;
