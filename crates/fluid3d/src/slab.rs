//! Double-buffered texture pairs.

use crate::error::FluidError;
use crate::layout::TiledLayout;
use crate::texture::{Texture, TextureFormat};

/// A read/write pair of identically-shaped textures.
///
/// Passes read from `read` and write into `write`; [`Slab::swap`] publishes
/// the result. Swapping exchanges the buffers, no texels are copied.
#[derive(Clone, Debug)]
pub struct Slab {
    pub read: Texture,
    pub write: Texture,
}

impl Slab {
    /// Allocate both buffers at the layout's texture resolution, zero-filled.
    pub fn new(layout: &TiledLayout, format: TextureFormat) -> Result<Self, FluidError> {
        let resolution = layout.texture_resolution();
        Ok(Self {
            read: Texture::new(resolution, format)?,
            write: Texture::new(resolution, format)?,
        })
    }

    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
    }

    pub fn format(&self) -> Option<TextureFormat> {
        self.read.format()
    }

    /// Move the write buffer out, leaving an empty placeholder.
    pub(crate) fn take_write(&mut self) -> Texture {
        std::mem::take(&mut self.write)
    }

    /// Return a rendered write buffer and publish it as the new read buffer.
    pub(crate) fn commit(&mut self, rendered: Texture) {
        self.write = rendered;
        self.swap();
    }
}
