//! Renderer Settings
//!
//! Configuration consumed once by [`Renderer::new`](crate::renderer::Renderer::new).
//! Every field can also be changed later through
//! [`Renderer::settings_mut`](crate::renderer::Renderer::settings_mut).
//!
//! # Example
//!
//! ```rust,ignore
//! use retrogl::renderer::{Renderer, RendererSettings};
//!
//! let settings = RendererSettings {
//!     force_wireframe: true,
//!     max_lights: 4,
//!     ..Default::default()
//! };
//! let renderer = Renderer::new(backend, settings)?;
//! ```

/// Global renderer configuration.
///
/// # Fields
///
/// | Field                     | Description                               | Default |
/// |---------------------------|-------------------------------------------|---------|
/// | `force_wireframe`         | Draw every polygon in line mode           | `false` |
/// | `sort_objects`            | Depth-sort opaque meshes each frame       | `true`  |
/// | `max_lights`              | Light unit budget (clamped to backend)    | `8`     |
/// | `device_pixel_ratio`      | Scale applied by `set_size`               | `1.0`   |
/// | `auto_clear`              | Clear buffers at the start of `render`    | `true`  |
/// | `resource_retry_interval` | Frames before a failed allocation retries | `30`    |
#[derive(Debug, Clone)]
pub struct RendererSettings {
    // === Drawing ===
    /// Renders every polygon as outlines, regardless of the material's own
    /// wireframe flag.
    pub force_wireframe: bool,

    /// Sorts opaque meshes by view-space depth, farthest first.
    ///
    /// When `false`, meshes are drawn in traversal order.
    pub sort_objects: bool,

    // === Lighting ===
    /// Upper bound on hardware light units used per frame.
    ///
    /// The effective budget is the smaller of this value and the unit count
    /// reported by the backend.
    pub max_lights: u8,

    // === Framebuffer ===
    /// Ratio between canvas pixels and logical size units.
    pub device_pixel_ratio: f32,

    /// Clears color, depth and stencil before each frame.
    pub auto_clear: bool,

    // === Resources ===
    /// Number of frames to wait before retrying a texture or compiled-list
    /// allocation that failed.
    pub resource_retry_interval: u64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            force_wireframe: false,
            sort_objects: true,
            max_lights: 8,
            device_pixel_ratio: 1.0,
            auto_clear: true,
            resource_retry_interval: 30,
        }
    }
}
