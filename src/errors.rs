//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`RenderError`] covers the failure modes that can
//! reach the host application:
//! - Configuration errors (an invalid camera handed to `render`)
//! - Context creation failures (fatal, only at construction time)
//! - Per-resource allocation failures (texture objects, compiled lists)
//!
//! Backend-level failures are described by [`BackendError`], which the
//! renderer wraps where needed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use retrogl::errors::{RenderError, Result};
//!
//! fn draw(renderer: &mut Renderer<MyBackend>, scene: &mut Scene, camera: NodeKey) -> Result<()> {
//!     let info = renderer.render(scene, camera)?;
//!     log::trace!("{} draw calls", info.render.calls);
//!     Ok(())
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// Failures reported by a [`FixedFunction`](crate::backend::FixedFunction) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The rendering context could not be created or has been lost.
    #[error("Rendering context unavailable: {0}")]
    ContextUnavailable(String),

    /// The backend ran out of compiled-list names.
    #[error("Failed to allocate a compiled command list")]
    ListAllocationFailed,

    /// The backend could not create a texture object.
    #[error("Failed to allocate a texture object")]
    TextureAllocationFailed,
}

/// Kind of backend resource that failed to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    CompiledList,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Texture => f.write_str("texture"),
            Self::CompiledList => f.write_str("compiled list"),
        }
    }
}

/// The main error type for the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The node handed to `render` as the camera does not hold a camera.
    #[error("Render target camera is not a camera node")]
    InvalidCamera,

    /// A node handle does not refer to a live node.
    #[error("Node not found in scene")]
    NodeNotFound,

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The backend context could not be created. Fatal at construction time.
    #[error("Failed to create rendering context: {0}")]
    ContextCreation(#[source] BackendError),

    /// A per-resource allocation failed. Never crosses the render loop; it is
    /// reported once and the allocation is retried on a later frame.
    #[error("Failed to create {kind}: {source}")]
    ResourceCreation {
        /// What was being allocated
        kind: ResourceKind,
        /// The backend failure
        #[source]
        source: BackendError,
    },
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
