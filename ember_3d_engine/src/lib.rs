/*!
# Ember 3D Engine

Real-time 3D rendering engine with a mixed 2D/3D scene graph.

The engine drives a forward renderer through an abstract GPU context and
renders shadows for every light before the main pass: one atlas layer per
directional light, fitted to the camera frustum, and six layers per point
light emulating a cube map.

## Architecture

- **GpuContext**: graphics API seam (shaders, textures, framebuffers, draws)
- **GraphicsManager**: owns every GPU object, the active program and
  framebuffer slots, uniform upload and the frame loop
- **Scene**: node arena, hierarchy, light registries and render passes
- **Engine**: global logger and the winit host driver

`MockGpuContext` implements the GPU seam in memory and backs the test suite.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod gpu;
pub mod graphics;
pub mod scene;

// Main ember3d namespace module
pub mod ember3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine entry points
    pub use crate::engine::{Application, ContextFactory, Engine, FrameDriver};

    // Configuration
    pub use crate::config::{EngineConfig, GraphicsConfig};

    // Logging sub-module (types only, macros stay internal)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // GPU seam and the in-memory context
    pub mod gpu {
        pub use crate::gpu::*;
    }

    // Resource mediator, programs, framebuffers, meshes
    pub mod graphics {
        pub use crate::graphics::*;
    }

    // Scene graph
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
