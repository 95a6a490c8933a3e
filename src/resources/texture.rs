use uuid::Uuid;

use crate::resources::image::Image;

/// How texture coordinates are generated for a texture.
///
/// Only [`Mapping::Uv`] can be expressed by the fixed-function path; the
/// other mappings are kept so that authored content round-trips, but such
/// textures are never uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mapping {
    #[default]
    Uv,
    Reflection,
    Refraction,
}

/// Texture description: an optional image plus upload parameters.
///
/// The image may be missing while it is still loading; the renderer creates
/// the backend texture lazily on the first frame the image is available.
#[derive(Debug, Clone)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: Option<String>,

    image: Option<Image>,
    pub flip_y: bool,
    pub mapping: Mapping,

    /// Set by the owner when the image content must be re-uploaded.
    /// Cleared by the renderer once the upload has been issued.
    pub needs_update: bool,
}

impl Default for Texture {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Texture {
    #[must_use]
    pub fn new(image: Option<Image>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            needs_update: image.is_some(),
            image,
            flip_y: true,
            mapping: Mapping::Uv,
        }
    }

    #[must_use]
    pub fn with_image(image: Image) -> Self {
        Self::new(Some(image))
    }

    #[inline]
    #[must_use]
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// Replaces the pixel payload and requests a re-upload.
    pub fn set_image(&mut self, image: Option<Image>) {
        self.image = image;
        self.needs_update = true;
    }

    /// A texture can be uploaded when it has pixels and UV mapping.
    #[must_use]
    pub fn is_uploadable(&self) -> bool {
        self.mapping == Mapping::Uv && self.image.as_ref().is_some_and(|img| !img.is_empty())
    }
}
