//! Stencil operators over the tiled grid.
//!
//! Every operator covers the interior of each tile on slices `1..Cz-1` with one
//! [`TileQuad`]; the 1-cell halo around each tile and the first and last slice
//! are owned by [`Boundary`]. A pass renders into one output field and swaps it
//! (see [`Fields::render`]).

mod advect;
mod boundary;
mod buoyancy;
mod curl;
mod divergence;
mod force;
mod gradient;
mod jacobi;
mod maccormack;
mod vorticity;

pub use advect::{Advect, AdvectParams};
pub use boundary::{Boundary, BoundaryParams, BoundaryPrimitive, PrimitiveKind};
pub use buoyancy::{Buoyancy, BuoyancyParams};
pub use curl::{Curl, CurlParams};
pub use divergence::{Divergence, DivergenceParams};
pub use force::{Force, ForceParams};
pub use gradient::{Gradient, GradientParams};
pub use jacobi::{Jacobi, JacobiBoundary, JacobiParams, JacobiStencil};
pub use maccormack::{MacCormack, MacCormackParams};
pub use vorticity::{Vorticity, VorticityParams};

use glam::{UVec2, UVec3, Vec4};
use rayon::prelude::*;

use crate::fields::Fields;
use crate::layout::TiledLayout;
use crate::texture::Texture;

/// A numerical kernel executed as one full-grid pass.
pub trait StencilOperator {
    /// Per-call inputs: fields to read, the output field and scalar coefficients.
    type Params<'p>;

    fn compute(&self, fields: &mut Fields, params: Self::Params<'_>);
}

/// Texel-space footprint of one tile's interior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileQuad {
    pub slice: u32,
    /// Texel of the tile's cell `(0, 0)`.
    pub origin: UVec2,
    /// First covered texel.
    pub min: UVec2,
    /// One past the last covered texel.
    pub max: UVec2,
}

/// Iteration domain shared by the interior operators.
#[derive(Clone, Debug)]
pub struct Slabop {
    layout: TiledLayout,
    quads: Vec<TileQuad>,
}

impl Slabop {
    pub fn new(layout: &TiledLayout) -> Self {
        let tile = layout.tile_resolution();
        let slices = layout.tile_count().z;

        let quads = (1..slices.saturating_sub(1))
            .filter(|_| tile.min_element() >= 3)
            .map(|slice| {
                let origin = layout.tile_origin(slice);
                TileQuad {
                    slice,
                    origin,
                    min: origin + UVec2::ONE,
                    max: origin + tile - UVec2::ONE,
                }
            })
            .collect();

        Self {
            layout: *layout,
            quads,
        }
    }

    pub fn layout(&self) -> &TiledLayout {
        &self.layout
    }

    /// One quad per interior slice, ordered by slice.
    pub fn quads(&self) -> &[TileQuad] {
        &self.quads
    }

    pub fn interior_cell_count(&self) -> usize {
        self.quads
            .iter()
            .map(|q| ((q.max.x - q.min.x) * (q.max.y - q.min.y)) as usize)
            .sum()
    }

    /// Evaluate `kernel` for every interior cell and store the result in `target`.
    ///
    /// Rows of the texture are processed in parallel; returning from this call
    /// is the pass barrier.
    pub fn dispatch<K>(&self, target: &mut Texture, kernel: K)
    where
        K: Fn(UVec3) -> Vec4 + Sync,
    {
        let width = self.layout.texture_resolution().x as usize;
        let channels = target.channels();
        if width == 0 || channels == 0 {
            return;
        }

        target
            .data_mut()
            .par_chunks_mut(width * channels)
            .enumerate()
            .for_each(|(row_index, row)| {
                let texel_y = row_index as u32;
                for quad in self.quads_in_row(texel_y) {
                    let y = texel_y - quad.origin.y;
                    for texel_x in quad.min.x..quad.max.x {
                        let cell = UVec3::new(texel_x - quad.origin.x, y, quad.slice);
                        store(row, texel_x as usize, channels, kernel(cell));
                    }
                }
            });
    }

    /// Quads crossing texel row `texel_y`.
    fn quads_in_row(&self, texel_y: u32) -> &[TileQuad] {
        let tile = self.layout.tile_resolution();
        let local_y = texel_y % tile.y;
        if local_y == 0 || local_y + 1 >= tile.y {
            return &[];
        }

        // Quad `i` holds slice `i + 1`.
        let columns = self.layout.tile_count().x as usize;
        let first_slice = (texel_y / tile.y) as usize * columns;
        let start = first_slice.max(1) - 1;
        let end = (first_slice + columns - 1).min(self.quads.len());
        if start >= end {
            &[]
        } else {
            &self.quads[start..end]
        }
    }
}

#[inline]
fn store(row: &mut [f32], texel_x: usize, channels: usize, value: Vec4) {
    if channels == 1 {
        row[texel_x] = value.x;
    } else {
        value.write_to_slice(&mut row[texel_x * 4..texel_x * 4 + 4]);
    }
}
