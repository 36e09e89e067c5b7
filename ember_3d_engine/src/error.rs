//! Error types for the Ember3D engine
//!
//! Fatal conditions (incomplete framebuffers, missing camera, invalid
//! attachments) surface as `Error`. Soft conditions such as unknown uniform
//! labels are logged and skipped instead, see `GraphicsManager::set_uniform`.

use std::fmt;
use crate::gpu::FramebufferStatus;

/// Result type for Ember3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ember3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error reported by the GPU context
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, mesh, program, framebuffer, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, window, GPU context)
    InitializationFailed(String),

    /// A shader stage failed to compile or a program failed to link
    ShaderCompilation(String),

    /// Framebuffer failed its completeness check
    IncompleteFramebuffer {
        name: String,
        status: FramebufferStatus,
    },

    /// Attachment type does not fit its backing texture or layer range
    UnsupportedAttachment(String),

    /// Draw flags request more than one cull mode or depth function
    UnsupportedDrawFlags(String),

    /// A pass that needs the active camera ran without one
    MissingCamera(String),

    /// A drawable node references a program that does not exist
    MissingShaderProgram(String),

    /// Node key does not belong to the scene
    InvalidNode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            Error::IncompleteFramebuffer { name, status } => {
                write!(f, "Framebuffer '{}' is incomplete: {:?}", name, status)
            }
            Error::UnsupportedAttachment(msg) => write!(f, "Unsupported attachment: {}", msg),
            Error::UnsupportedDrawFlags(msg) => write!(f, "Unsupported draw flags: {}", msg),
            Error::MissingCamera(msg) => write!(f, "Missing active camera: {}", msg),
            Error::MissingShaderProgram(name) => write!(f, "Missing shader program '{}'", name),
            Error::InvalidNode(msg) => write!(f, "Invalid node: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error at ERROR severity and evaluate to it
///
/// With a format string the error is a `BackendError` carrying the message.
/// With an `Error` expression that error is logged and returned unchanged.
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("ember3d::GraphicsManager", "Program '{}' not found", name);
/// let err = engine_err!("ember3d::Scene", Error::MissingCamera("main pass".to_string()));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let message = format!($fmt $(, $arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::ember3d::Error::BackendError(message)
    }};
    ($source:expr, $error:expr) => {{
        let error: $crate::ember3d::Error = $error;
        $crate::engine_error!($source, "{}", error);
        error
    }};
}

/// Log an error and return it from the enclosing function
///
/// Accepts the same arguments as `engine_err!`.
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
