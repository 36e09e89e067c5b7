/// Texture descriptions and the engine-side texture record.
///
/// Depth-array textures double as shadow atlases: each light owns one layer
/// (directional) or six consecutive layers (point).

use slotmap::new_key_type;
use super::gpu_context::GpuTexture;

new_key_type! {
    /// Stable key of a texture in the `GraphicsManager` arena
    pub struct TextureKey;
}

/// Semantic texture type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Color,
    Depth,
    DepthStencil,
    ColorArray,
    DepthArray,
    CubeMap,
    DepthCubeMap,
}

impl TextureKind {
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureKind::Depth | TextureKind::DepthArray | TextureKind::DepthCubeMap)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TextureKind::ColorArray | TextureKind::DepthArray)
    }

    pub fn is_cube_map(&self) -> bool {
        matches!(self, TextureKind::CubeMap | TextureKind::DepthCubeMap)
    }
}

/// Cubemap face, in the conventional +X, -X, +Y, -Y, +Z, -Z order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Position in `CubeFace::ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<CubeFace> {
        Self::ALL.get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// Sampler state baked into the texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap: Wrap,
    /// Depth comparison sampling (shadow lookups)
    pub compare: bool,
    pub generate_mipmaps: bool,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap: Wrap::Repeat,
            compare: false,
            generate_mipmaps: false,
        }
    }
}

impl SamplerDesc {
    /// Nearest, clamped, comparison sampling
    pub fn shadow() -> Self {
        Self {
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            wrap: Wrap::ClampToEdge,
            compare: true,
            generate_mipmaps: false,
        }
    }
}

/// Texture creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    /// Layer count for array kinds, ignored otherwise
    pub layers: u32,
    pub sampler: SamplerDesc,
    /// Optional RGBA8 pixels; cubemaps expect six faces back to back
    pub pixels: Option<Vec<u8>>,
}

impl TextureDesc {
    pub fn new(kind: TextureKind, width: u32, height: u32) -> Self {
        Self {
            kind,
            width,
            height,
            layers: 1,
            sampler: SamplerDesc::default(),
            pixels: None,
        }
    }

    pub fn color(width: u32, height: u32, pixels: Option<Vec<u8>>) -> Self {
        Self { pixels, ..Self::new(TextureKind::Color, width, height) }
    }

    pub fn depth(width: u32, height: u32) -> Self {
        Self {
            sampler: SamplerDesc::shadow(),
            ..Self::new(TextureKind::Depth, width, height)
        }
    }

    /// Depth array with comparison sampling, at least one layer
    pub fn depth_array(width: u32, height: u32, layers: u32) -> Self {
        Self {
            layers: layers.max(1),
            sampler: SamplerDesc::shadow(),
            ..Self::new(TextureKind::DepthArray, width, height)
        }
    }

    pub fn color_array(width: u32, height: u32, layers: u32) -> Self {
        Self { layers: layers.max(1), ..Self::new(TextureKind::ColorArray, width, height) }
    }

    pub fn cube_map(size: u32, pixels: Option<Vec<u8>>) -> Self {
        Self {
            pixels,
            sampler: SamplerDesc { wrap: Wrap::ClampToEdge, ..SamplerDesc::default() },
            ..Self::new(TextureKind::CubeMap, size, size)
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerDesc) -> Self {
        self.sampler = sampler;
        self
    }
}

/// Texture owned by the `GraphicsManager` arena
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    kind: TextureKind,
    width: u32,
    height: u32,
    layers: u32,
    handle: GpuTexture,
}

impl Texture {
    pub(crate) fn new(name: &str, desc: &TextureDesc, handle: GpuTexture) -> Self {
        let layers = if desc.kind.is_array() {
            desc.layers.max(1)
        } else if desc.kind.is_cube_map() {
            6
        } else {
            1
        };
        Self {
            name: name.to_string(),
            kind: desc.kind,
            width: desc.width,
            height: desc.height,
            layers,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Array length, 6 for cubemaps, 1 otherwise
    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn handle(&self) -> GpuTexture {
        self.handle
    }

    /// Size of a mip level
    pub fn mip_extent(&self, mip_level: u32) -> (u32, u32) {
        let w = self.width.checked_shr(mip_level).unwrap_or(0).max(1);
        let h = self.height.checked_shr(mip_level).unwrap_or(0).max(1);
        (w, h)
    }
}
