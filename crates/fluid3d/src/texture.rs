//! CPU-side float textures backing the simulation fields.

use glam::{UVec2, Vec4};

use crate::error::FluidError;

/// Channel layout of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One float per texel (density, pressure, divergence).
    Red,
    /// Four floats per texel (velocity, curl).
    Rgba,
}

impl TextureFormat {
    pub fn channels(self) -> usize {
        match self {
            TextureFormat::Red => 1,
            TextureFormat::Rgba => 4,
        }
    }
}

/// A 2D float texture in row-major order.
///
/// A default texture is empty; it is used as a placeholder while a write
/// buffer is checked out of its slab.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    format: Option<TextureFormat>,
    data: Vec<f32>,
}

impl Texture {
    /// Allocate a zero-filled texture.
    pub fn new(resolution: UVec2, format: TextureFormat) -> Result<Self, FluidError> {
        let channels = format.channels();
        let len = resolution.x as usize * resolution.y as usize * channels;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FluidError::Allocation {
                width: resolution.x,
                height: resolution.y,
                channels,
            })?;
        data.resize(len, 0.0);

        Ok(Self {
            width: resolution.x,
            height: resolution.y,
            format: Some(format),
            data,
        })
    }

    pub fn resolution(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Format of the texture, `None` for the empty placeholder.
    pub fn format(&self) -> Option<TextureFormat> {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.format.map_or(0, TextureFormat::channels)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw texel data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Texel data as bytes, ready for upload or dumping.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Read a texel. Single-channel textures read as `(r, 0, 0, 0)`.
    #[inline]
    pub fn texel(&self, index: usize) -> Vec4 {
        match self.format {
            Some(TextureFormat::Red) => Vec4::new(self.data[index], 0.0, 0.0, 0.0),
            Some(TextureFormat::Rgba) => Vec4::from_slice(&self.data[index * 4..index * 4 + 4]),
            None => Vec4::ZERO,
        }
    }

    /// Write a texel. Single-channel textures keep only `x`.
    #[inline]
    pub fn set_texel(&mut self, index: usize, value: Vec4) {
        match self.format {
            Some(TextureFormat::Red) => self.data[index] = value.x,
            Some(TextureFormat::Rgba) => {
                value.write_to_slice(&mut self.data[index * 4..index * 4 + 4]);
            }
            None => {}
        }
    }

    /// Copy every texel of `other` into `self`. Both must share size and format.
    pub fn copy_from(&mut self, other: &Texture) {
        debug_assert_eq!(self.resolution(), other.resolution());
        debug_assert_eq!(self.format, other.format);
        self.data.copy_from_slice(&other.data);
    }

    /// Set every texel to `value`.
    pub fn fill(&mut self, value: Vec4) {
        match self.format {
            Some(TextureFormat::Red) => self.data.fill(value.x),
            Some(TextureFormat::Rgba) => {
                for texel in self.data.chunks_exact_mut(4) {
                    value.write_to_slice(texel);
                }
            }
            None => {}
        }
    }

    /// Sum of each channel over all texels.
    pub fn channel_sums(&self) -> Vec4 {
        let mut sums = [0.0f64; 4];
        let channels = self.channels().max(1);
        for texel in self.data.chunks_exact(channels) {
            for (sum, value) in sums.iter_mut().zip(texel) {
                *sum += *value as f64;
            }
        }
        Vec4::new(sums[0] as f32, sums[1] as f32, sums[2] as f32, sums[3] as f32)
    }
}
