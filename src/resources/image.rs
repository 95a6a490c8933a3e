use std::sync::Arc;

/// CPU-side pixel payload of a texture.
///
/// Pixels are tightly packed RGB8 rows, which is the only layout the
/// fixed-function upload path accepts. The buffer is shared through an
/// `Arc`, so cloning an image (e.g. to reuse it across textures) is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    data: Arc<Vec<u8>>,
}

impl Image {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Wraps raw RGB8 bytes. Returns `None` when the byte count does not
    /// match `width * height * 3`.
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if data.len() != expected {
            log::warn!(
                "Image payload size mismatch: {}x{} expects {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            );
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// Builds an image from an array of RGB triples.
    #[must_use]
    pub fn from_rgb_pixels(width: u32, height: u32, pixels: &[[u8; 3]]) -> Option<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(pixels);
        Self::new(width, height, bytes.to_vec())
    }

    /// A single-colour image, mostly useful for placeholders and tests.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = vec![rgb; width as usize * height as usize];
        let bytes: &[u8] = bytemuck::cast_slice(&pixels);
        Self {
            width,
            height,
            data: Arc::new(bytes.to_vec()),
        }
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the image has any pixels to upload.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
