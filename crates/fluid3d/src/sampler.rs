//! Point and trilinear reads of a tiled texture in 3D cell coordinates.
//!
//! Positions are continuous cell coordinates: cell `i` is centred at `i`.
//! Reads clamp to the grid per axis, so halo cells act as clamp-to-edge.
//! Interpolation is done by hand across tiles instead of relying on 2D
//! texture filtering, which would bleed between neighbouring slices.

use glam::{IVec3, UVec3, Vec3, Vec4};

use crate::layout::TiledLayout;
use crate::texture::Texture;

/// Borrowed view of one texture through its layout.
#[derive(Clone, Copy)]
pub struct TiledSampler<'a> {
    layout: &'a TiledLayout,
    texture: &'a Texture,
}

impl<'a> TiledSampler<'a> {
    pub fn new(layout: &'a TiledLayout, texture: &'a Texture) -> Self {
        Self { layout, texture }
    }

    /// Value of a single cell, clamped to the grid.
    #[inline]
    pub fn fetch(&self, cell: IVec3) -> Vec4 {
        let max = self.layout.simulation_resolution().as_ivec3() - IVec3::ONE;
        let cell = cell.clamp(IVec3::ZERO, max).as_uvec3();
        self.texture.texel(self.layout.texel_index(cell))
    }

    /// Value of a cell known to be inside the grid.
    #[inline]
    pub fn fetch_cell(&self, cell: UVec3) -> Vec4 {
        self.texture.texel(self.layout.texel_index(cell))
    }

    /// Trilinear interpolation at a continuous position.
    pub fn sample(&self, position: Vec3) -> Vec4 {
        let (c, t) = self.corners(position);

        let x00 = lerp(c[0], c[1], t.x);
        let x10 = lerp(c[2], c[3], t.x);
        let x01 = lerp(c[4], c[5], t.x);
        let x11 = lerp(c[6], c[7], t.x);
        let y0 = lerp(x00, x10, t.y);
        let y1 = lerp(x01, x11, t.y);
        lerp(y0, y1, t.z)
    }

    /// Component-wise min and max over the eight cells surrounding `position`.
    pub fn neighborhood_bounds(&self, position: Vec3) -> (Vec4, Vec4) {
        let (c, _) = self.corners(position);
        c[1..].iter().fold((c[0], c[0]), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
    }

    /// The eight corner values around `position` (x fastest, then y, then z)
    /// and the fractional offset inside that cube.
    fn corners(&self, position: Vec3) -> ([Vec4; 8], Vec3) {
        let res = self.layout.simulation_resolution().as_ivec3();
        let upper = (res - IVec3::ONE).as_vec3();
        let p = position.clamp(Vec3::ZERO, upper);

        let lower_limit = (res - IVec3::splat(2)).max(IVec3::ZERO);
        let i0 = p.floor().as_ivec3().min(lower_limit);
        let i1 = (i0 + IVec3::ONE).min(res - IVec3::ONE);
        let t = (p - i0.as_vec3()).clamp(Vec3::ZERO, Vec3::ONE);

        let corners = [
            self.fetch(IVec3::new(i0.x, i0.y, i0.z)),
            self.fetch(IVec3::new(i1.x, i0.y, i0.z)),
            self.fetch(IVec3::new(i0.x, i1.y, i0.z)),
            self.fetch(IVec3::new(i1.x, i1.y, i0.z)),
            self.fetch(IVec3::new(i0.x, i0.y, i1.z)),
            self.fetch(IVec3::new(i1.x, i0.y, i1.z)),
            self.fetch(IVec3::new(i0.x, i1.y, i1.z)),
            self.fetch(IVec3::new(i1.x, i1.y, i1.z)),
        ];
        (corners, t)
    }
}

/// Linear blend that is exact at both ends.
#[inline]
fn lerp(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    a * (1.0 - t) + b * t
}
