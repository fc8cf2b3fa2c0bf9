//! Flat 3D texture layout.
//!
//! The simulation grid is stored in a single 2D texture by laying its Z-slices
//! out as tiles. Slice `z` occupies tile column `z % tile_count.x` and tile row
//! `z / tile_count.x`, so the texture is `tile_resolution * tile_count.xy`
//! texels large and holds `tile_count.z` slices.
//!
//! The layout is searched for under a maximum texture size so that the
//! simulated voxels stay roughly cubic for the requested physical domain.

use std::fmt;

use glam::{UVec2, UVec3, Vec3};

use crate::error::FluidError;

/// Bookkeeping from the tile-resolution search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutSearch {
    /// Iterations actually evaluated (including the one that stopped early).
    pub iterations: u32,
    /// Upper bound on iterations: `ceil(sqrt(max(width, height)))` of the
    /// fitted rectangle.
    pub max_iterations: u32,
    /// Slice count the chosen tile width would need for cubic voxels.
    pub target_tiles: f32,
    /// True when the chosen tile count matches the target exactly.
    pub exact: bool,
}

/// One evaluated point of the binary search.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    tile_resolution: UVec2,
    tile_count: UVec2,
    total_tiles: u32,
    target: f64,
    error: f64,
}

impl Candidate {
    fn cell_count(&self) -> u64 {
        self.tile_resolution.x as u64 * self.tile_resolution.y as u64 * self.total_tiles as u64
    }

    /// Nearest to the target wins; ties go to the candidate simulating more cells.
    fn is_better_than(&self, other: &Candidate) -> bool {
        self.error < other.error
            || (self.error == other.error && self.cell_count() > other.cell_count())
    }
}

/// Mapping of a 3D simulation domain onto a 2D texture atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TiledLayout {
    domain: Vec3,
    max_texture: UVec2,
    texture_resolution: UVec2,
    tile_resolution: UVec2,
    tile_count: UVec3,
    simulation_resolution: UVec3,
    search: LayoutSearch,
}

impl TiledLayout {
    /// Search the tile layout for `domain` inside a `max_texture` sized texture.
    ///
    /// Returns [`FluidError::InfeasibleLayout`] when the search ends without a
    /// single tile, which callers must treat as "keep the previous state".
    pub fn compute(max_texture: UVec2, domain: Vec3) -> Result<Self, FluidError> {
        if !domain.is_finite() || domain.min_element() <= 0.0 {
            return Err(FluidError::DegenerateDomain { domain });
        }
        if max_texture.min_element() == 0 {
            return Err(FluidError::InvalidTextureResolution {
                resolution: max_texture,
            });
        }

        let (lx, ly, lz) = (domain.x as f64, domain.y as f64, domain.z as f64);
        let aspect_xy = lx / ly;
        let depth_per_width = lz / lx;

        let mut low = UVec2::ZERO;
        let mut high = fitted_rectangle(max_texture, aspect_xy);
        let max_iterations = (high.max_element() as f64).sqrt().ceil() as u32;

        let mut best: Option<Candidate> = None;
        let mut iterations = 0;
        while iterations < max_iterations {
            iterations += 1;

            let mid = (low + high) / 2;
            if mid.x == 0 || mid.y == 0 {
                break;
            }

            let tile_count = max_texture / mid;
            let total = tile_count.x as u64 * tile_count.y as u64;
            let total_tiles = total.min(u32::MAX as u64) as u32;
            let target = mid.x as f64 * depth_per_width;

            let candidate = Candidate {
                tile_resolution: mid,
                tile_count,
                total_tiles,
                target,
                error: (total_tiles as f64 - target).abs(),
            };
            if best.map_or(true, |b| candidate.is_better_than(&b)) {
                best = Some(candidate);
            }

            if total_tiles as f64 == target {
                break;
            } else if (total_tiles as f64) < target {
                high = mid;
            } else {
                low = mid;
            }
        }

        let best = match best {
            Some(candidate) if candidate.total_tiles > 0 => candidate,
            _ => {
                return Err(FluidError::InfeasibleLayout {
                    max_texture,
                    domain,
                })
            }
        };

        Ok(Self {
            domain,
            max_texture,
            texture_resolution: best.tile_resolution * best.tile_count,
            tile_resolution: best.tile_resolution,
            tile_count: best.tile_count.extend(best.total_tiles),
            simulation_resolution: best.tile_resolution.extend(best.total_tiles),
            search: LayoutSearch {
                iterations,
                max_iterations,
                target_tiles: best.target as f32,
                exact: best.error == 0.0,
            },
        })
    }

    // ========== Accessors ==========

    /// Physical size of the simulated box.
    pub fn domain(&self) -> Vec3 {
        self.domain
    }

    /// Texture bound the layout was searched under.
    pub fn max_texture(&self) -> UVec2 {
        self.max_texture
    }

    /// Size of the 2D texture that stores one field.
    pub fn texture_resolution(&self) -> UVec2 {
        self.texture_resolution
    }

    /// Size of one Z-slice.
    pub fn tile_resolution(&self) -> UVec2 {
        self.tile_resolution
    }

    /// Tiles along X and Y; `z` is the number of slices.
    pub fn tile_count(&self) -> UVec3 {
        self.tile_count
    }

    /// Logical 3D grid resolution `(tile.x, tile.y, slices)`.
    pub fn simulation_resolution(&self) -> UVec3 {
        self.simulation_resolution
    }

    pub fn search(&self) -> &LayoutSearch {
        &self.search
    }

    /// Number of texels (and therefore cells) in one field.
    pub fn texel_count(&self) -> usize {
        self.texture_resolution.x as usize * self.texture_resolution.y as usize
    }

    /// True when every axis keeps at least one cell inside the 1-cell halo.
    pub fn has_interior(&self) -> bool {
        self.simulation_resolution.min_element() >= 3
    }

    // ========== Addressing ==========

    /// Texel-space origin of the tile storing slice `slice`.
    #[inline]
    pub fn tile_origin(&self, slice: u32) -> UVec2 {
        let columns = self.tile_count.x;
        UVec2::new(
            (slice % columns) * self.tile_resolution.x,
            (slice / columns) * self.tile_resolution.y,
        )
    }

    /// Texel coordinates of a cell.
    #[inline]
    pub fn texel(&self, cell: UVec3) -> UVec2 {
        self.tile_origin(cell.z) + cell.truncate()
    }

    /// Row-major index of a cell's texel.
    #[inline]
    pub fn texel_index(&self, cell: UVec3) -> usize {
        let texel = self.texel(cell);
        texel.y as usize * self.texture_resolution.x as usize + texel.x as usize
    }

    /// Cell stored at a texel, `None` outside the texture.
    pub fn cell_of_texel(&self, texel: UVec2) -> Option<UVec3> {
        if texel.x >= self.texture_resolution.x || texel.y >= self.texture_resolution.y {
            return None;
        }
        let tile = texel / self.tile_resolution;
        let slice = tile.y * self.tile_count.x + tile.x;
        if slice >= self.tile_count.z {
            return None;
        }
        Some((texel % self.tile_resolution).extend(slice))
    }

    /// True for cells outside the 1-cell halo of their tile and off the first
    /// and last slice.
    #[inline]
    pub fn is_interior(&self, cell: UVec3) -> bool {
        let res = self.simulation_resolution;
        cell.cmpge(UVec3::ONE).all() && (cell + UVec3::ONE).cmplt(res).all()
    }

    // ========== Domain <-> grid ==========

    /// Cells per domain unit along each axis.
    pub fn cells_per_unit(&self) -> Vec3 {
        self.simulation_resolution.as_vec3() / self.domain
    }

    /// Domain position (origin at the domain corner) to continuous cell
    /// coordinates, where cell `i` is centred at `i`.
    pub fn domain_to_grid(&self, position: Vec3) -> Vec3 {
        position * self.cells_per_unit() - 0.5
    }

    /// Domain position of a cell centre.
    pub fn cell_center(&self, cell: UVec3) -> Vec3 {
        (cell.as_vec3() + 0.5) / self.cells_per_unit()
    }
}

impl fmt::Display for TiledLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "texture {}x{}, tile {}x{}, {} slices",
            self.texture_resolution.x,
            self.texture_resolution.y,
            self.tile_resolution.x,
            self.tile_resolution.y,
            self.tile_count.z
        )
    }
}

/// Largest rectangle with aspect `width / height == aspect` that fits in `max`.
///
/// Candidates are the rectangle spanning the full texture height and the one
/// spanning the full width; the larger of those that fit is used.
fn fitted_rectangle(max: UVec2, aspect: f64) -> UVec2 {
    let (max_w, max_h) = (max.x as f64, max.y as f64);
    let slack = 1e-9 * max_w.max(max_h);

    let candidates = [(aspect * max_h, max_h), (max_w, max_w / aspect)];
    let (width, height) = candidates
        .into_iter()
        .filter(|&(w, h)| w <= max_w + slack && h <= max_h + slack)
        .fold((0.0f64, 0.0f64), |best, c| {
            if c.0 * c.1 > best.0 * best.1 {
                c
            } else {
                best
            }
        });

    UVec2::new(
        (width.min(max_w).floor()) as u32,
        (height.min(max_h).floor()) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_domain_exact_layout() {
        let layout = TiledLayout::compute(UVec2::new(512, 512), Vec3::splat(20.0)).unwrap();

        assert_eq!(layout.tile_resolution(), UVec2::new(64, 64));
        assert_eq!(layout.tile_count(), UVec3::new(8, 8, 64));
        assert_eq!(layout.texture_resolution(), UVec2::new(512, 512));
        assert_eq!(layout.simulation_resolution(), UVec3::new(64, 64, 64));
        assert!(layout.search().exact);
        assert_eq!(layout.search().iterations, 3);
        assert_eq!(layout.search().max_iterations, 23);
    }

    #[test]
    fn test_nearest_layout_when_no_exact_match() {
        // 256 never factors exactly for a cube; the closest candidate is a
        // 37x37 tile repeated 6x6 times (36 slices against a target of 37).
        let layout = TiledLayout::compute(UVec2::new(256, 256), Vec3::splat(20.0)).unwrap();

        assert!(!layout.search().exact);
        assert_eq!(layout.tile_resolution(), UVec2::new(37, 37));
        assert_eq!(layout.tile_count(), UVec3::new(6, 6, 36));
        assert_eq!(layout.texture_resolution(), UVec2::new(222, 222));
        assert_eq!(layout.search().iterations, layout.search().max_iterations);
    }

    #[test]
    fn test_elongated_domain_layout() {
        let layout =
            TiledLayout::compute(UVec2::new(256, 256), Vec3::new(40.0, 20.0, 20.0)).unwrap();

        assert_eq!(layout.tile_resolution(), UVec2::new(64, 32));
        assert_eq!(layout.tile_count(), UVec3::new(4, 8, 32));
        assert!(layout.search().exact);
    }

    #[test]
    fn test_infeasible_layout() {
        // Aspect 100:1 leaves a 128x1 rectangle, so the first midpoint is 0 tall.
        let result = TiledLayout::compute(UVec2::new(128, 128), Vec3::new(100.0, 1.0, 1.0));
        assert!(matches!(result, Err(FluidError::InfeasibleLayout { .. })));

        let result = TiledLayout::compute(UVec2::new(1, 1), Vec3::splat(20.0));
        assert!(matches!(result, Err(FluidError::InfeasibleLayout { .. })));
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let result = TiledLayout::compute(UVec2::new(256, 256), Vec3::new(20.0, 0.0, 20.0));
        assert!(matches!(result, Err(FluidError::DegenerateDomain { .. })));

        let result = TiledLayout::compute(UVec2::new(256, 256), Vec3::new(20.0, f32::NAN, 1.0));
        assert!(matches!(result, Err(FluidError::DegenerateDomain { .. })));

        let result = TiledLayout::compute(UVec2::new(0, 256), Vec3::splat(20.0));
        assert!(matches!(
            result,
            Err(FluidError::InvalidTextureResolution { .. })
        ));
    }

    #[test]
    fn test_texel_addressing() {
        let layout = TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap();
        assert_eq!(layout.simulation_resolution(), UVec3::splat(16));
        assert_eq!(layout.tile_count(), UVec3::new(4, 4, 16));

        assert_eq!(layout.tile_origin(0), UVec2::ZERO);
        assert_eq!(layout.tile_origin(3), UVec2::new(48, 0));
        assert_eq!(layout.tile_origin(5), UVec2::new(16, 16));
        assert_eq!(layout.texel(UVec3::new(2, 3, 5)), UVec2::new(18, 19));
        assert_eq!(layout.texel_index(UVec3::new(2, 3, 5)), 19 * 64 + 18);

        for cell in [UVec3::new(0, 0, 0), UVec3::new(15, 1, 7), UVec3::new(4, 15, 15)] {
            assert_eq!(layout.cell_of_texel(layout.texel(cell)), Some(cell));
        }
        assert_eq!(layout.cell_of_texel(UVec2::new(64, 0)), None);
    }

    #[test]
    fn test_interior_excludes_halo() {
        let layout = TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap();

        assert!(layout.is_interior(UVec3::new(1, 1, 1)));
        assert!(layout.is_interior(UVec3::new(14, 14, 14)));
        assert!(!layout.is_interior(UVec3::new(0, 5, 5)));
        assert!(!layout.is_interior(UVec3::new(5, 15, 5)));
        assert!(!layout.is_interior(UVec3::new(5, 5, 0)));
        assert!(!layout.is_interior(UVec3::new(5, 5, 15)));
    }

    #[test]
    fn test_domain_to_grid_centres() {
        let layout = TiledLayout::compute(UVec2::new(512, 512), Vec3::splat(20.0)).unwrap();

        let centre = layout.domain_to_grid(Vec3::splat(10.0));
        assert!((centre - Vec3::splat(31.5)).abs().max_element() < 1e-5);

        let cell = UVec3::new(32, 10, 5);
        let back = layout.domain_to_grid(layout.cell_center(cell));
        assert!((back - cell.as_vec3()).abs().max_element() < 1e-4);
    }

    #[test]
    fn test_display_summary() {
        let layout = TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap();
        assert_eq!(layout.to_string(), "texture 64x64, tile 16x16, 16 slices");
    }
}
