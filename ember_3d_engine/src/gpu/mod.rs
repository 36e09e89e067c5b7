/// GPU context seam and the value types that cross it

pub mod gpu_context;
pub mod texture;
pub mod uniform;
pub mod mock_gpu_context;

pub use gpu_context::*;
pub use texture::*;
pub use uniform::*;
pub use mock_gpu_context::MockGpuContext;
