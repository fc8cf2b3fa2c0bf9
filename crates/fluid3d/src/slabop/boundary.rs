//! Boundary conditions on the halo cells.
//!
//! Every halo cell copies the nearest interior cell multiplied by a scale:
//! `-1` reflects velocity (no flow through the walls), `+1` gives pressure a
//! zero normal derivative. The halo is described by primitives per slice:
//! the first and last slice get an interior quad, four edge lines and four
//! corner points; every other slice gets the four edge lines and corners.

use glam::{IVec3, UVec2, UVec3};

use super::StencilOperator;
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Quad,
    Line,
    Point,
}

/// A rectangle of halo cells in one slice sharing an inward offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryPrimitive {
    pub kind: PrimitiveKind,
    pub slice: u32,
    /// First cell, in tile-local coordinates.
    pub min: UVec2,
    /// Last cell (inclusive).
    pub max: UVec2,
    /// Step from each cell to the interior cell it copies.
    pub offset: IVec3,
}

impl BoundaryPrimitive {
    fn cells(&self) -> impl Iterator<Item = UVec3> + '_ {
        (self.min.y..=self.max.y).flat_map(move |y| {
            (self.min.x..=self.max.x).map(move |x| UVec3::new(x, y, self.slice))
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct HaloTexel {
    target: usize,
    source: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct BoundaryParams {
    pub input: FieldId,
    pub output: FieldId,
    pub scale: f32,
}

#[derive(Clone, Debug)]
pub struct Boundary {
    primitives: Vec<BoundaryPrimitive>,
    texels: Vec<HaloTexel>,
}

impl Boundary {
    pub fn new(layout: &TiledLayout) -> Self {
        let primitives = build_primitives(layout);

        let res = layout.simulation_resolution().as_ivec3();
        let upper = res - IVec3::ONE;
        let texels = primitives
            .iter()
            .flat_map(|primitive| {
                primitive.cells().map(move |cell| {
                    let source = (cell.as_ivec3() + primitive.offset)
                        .clamp(IVec3::ZERO, upper)
                        .as_uvec3();
                    HaloTexel {
                        target: layout.texel_index(cell),
                        source: layout.texel_index(source),
                    }
                })
            })
            .collect();

        Self { primitives, texels }
    }

    pub fn primitives(&self) -> &[BoundaryPrimitive] {
        &self.primitives
    }

    /// Number of halo cells written per pass.
    pub fn texel_count(&self) -> usize {
        self.texels.len()
    }
}

impl StencilOperator for Boundary {
    type Params<'p> = BoundaryParams;

    fn compute(&self, fields: &mut Fields, params: BoundaryParams) {
        fields.render(params.output, |view, target| {
            // Sources are interior cells, targets are halo cells.
            let input = view.read(params.input);
            for texel in &self.texels {
                target.set_texel(texel.target, input.texel(texel.source) * params.scale);
            }
        });
    }
}

fn build_primitives(layout: &TiledLayout) -> Vec<BoundaryPrimitive> {
    let tile = layout.tile_resolution();
    let slices = layout.tile_count().z;
    if tile.min_element() < 2 || slices == 0 {
        return Vec::new();
    }

    let last = tile - UVec2::ONE;
    let mut primitives = Vec::new();

    for slice in 0..slices {
        let dz = if slice == 0 {
            1
        } else if slice + 1 == slices {
            -1
        } else {
            0
        };
        let mut push = |kind, min: UVec2, max: UVec2, dx: i32, dy: i32| {
            primitives.push(BoundaryPrimitive {
                kind,
                slice,
                min,
                max,
                offset: IVec3::new(dx, dy, dz),
            });
        };

        if dz != 0 {
            push(PrimitiveKind::Quad, UVec2::ONE, last - UVec2::ONE, 0, 0);
        }

        // Edges without their corners.
        push(PrimitiveKind::Line, UVec2::new(0, 1), UVec2::new(0, last.y - 1), 1, 0);
        push(PrimitiveKind::Line, UVec2::new(last.x, 1), UVec2::new(last.x, last.y - 1), -1, 0);
        push(PrimitiveKind::Line, UVec2::new(1, 0), UVec2::new(last.x - 1, 0), 0, 1);
        push(PrimitiveKind::Line, UVec2::new(1, last.y), UVec2::new(last.x - 1, last.y), 0, -1);

        push(PrimitiveKind::Point, UVec2::ZERO, UVec2::ZERO, 1, 1);
        push(PrimitiveKind::Point, UVec2::new(last.x, 0), UVec2::new(last.x, 0), -1, 1);
        push(PrimitiveKind::Point, UVec2::new(0, last.y), UVec2::new(0, last.y), 1, -1);
        push(PrimitiveKind::Point, last, last, -1, -1);
    }

    primitives
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};
    use std::collections::HashSet;

    fn layout() -> TiledLayout {
        TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap()
    }

    #[test]
    fn test_primitive_counts() {
        let boundary = Boundary::new(&layout());
        let primitives = boundary.primitives();

        let quads = primitives.iter().filter(|p| p.kind == PrimitiveKind::Quad).count();
        let lines = primitives.iter().filter(|p| p.kind == PrimitiveKind::Line).count();
        let points = primitives.iter().filter(|p| p.kind == PrimitiveKind::Point).count();
        assert_eq!(quads, 2);
        assert_eq!(lines, 16 * 4);
        assert_eq!(points, 16 * 4);
    }

    #[test]
    fn test_halo_covered_exactly_once() {
        let layout = layout();
        let boundary = Boundary::new(&layout);

        let targets: HashSet<_> = boundary.texels.iter().map(|t| t.target).collect();
        assert_eq!(targets.len(), boundary.texel_count(), "halo cell written twice");

        let res = layout.simulation_resolution();
        let total = (res.x * res.y * res.z) as usize;
        let interior = ((res.x - 2) * (res.y - 2) * (res.z - 2)) as usize;
        assert_eq!(boundary.texel_count(), total - interior);

        for texel in &boundary.texels {
            let source = layout.cell_of_texel(source_texel(&layout, texel.source)).unwrap();
            assert!(layout.is_interior(source), "halo copies from halo cell {source}");
        }
    }

    fn source_texel(layout: &TiledLayout, index: usize) -> UVec2 {
        let width = layout.texture_resolution().x as usize;
        UVec2::new((index % width) as u32, (index / width) as u32)
    }

    #[test]
    fn test_scale_applied_to_neighbour() {
        let layout = layout();
        let boundary = Boundary::new(&layout);
        let mut fields = Fields::new(&layout).unwrap();

        let inner = UVec3::new(1, 5, 5);
        let wall = UVec3::new(0, 5, 5);
        let value = Vec4::new(2.0, -1.0, 0.5, 0.0);
        fields
            .slab_mut(FieldId::Velocity)
            .read
            .set_texel(layout.texel_index(inner), value);

        boundary.compute(
            &mut fields,
            BoundaryParams {
                input: FieldId::Velocity,
                output: FieldId::Velocity,
                scale: -1.0,
            },
        );
        let velocity = fields.read(FieldId::Velocity);
        assert_eq!(velocity.texel(layout.texel_index(wall)), -value);
        assert_eq!(velocity.texel(layout.texel_index(inner)), value);
    }

    #[test]
    fn test_separate_output_only_changes_the_halo() {
        let layout = layout();
        let boundary = Boundary::new(&layout);
        let mut fields = Fields::new(&layout).unwrap();

        let inner = layout.texel_index(UVec3::new(1, 5, 5));
        let wall = layout.texel_index(UVec3::new(0, 5, 5));
        let value = Vec4::new(1.0, 2.0, 3.0, 4.0);
        fields.slab_mut(FieldId::Velocity).read.set_texel(inner, value);
        let scratch = &mut fields.slab_mut(FieldId::Scratch).read;
        scratch.set_texel(inner, Vec4::splat(9.0));
        scratch.set_texel(wall, Vec4::splat(7.0));

        boundary.compute(
            &mut fields,
            BoundaryParams {
                input: FieldId::Velocity,
                output: FieldId::Scratch,
                scale: 0.5,
            },
        );

        let scratch = fields.read(FieldId::Scratch);
        assert_eq!(scratch.texel(wall), value * 0.5);
        assert_eq!(scratch.texel(inner), Vec4::splat(9.0));
        let velocity = fields.read(FieldId::Velocity);
        assert_eq!(velocity.texel(inner), value);
        assert_eq!(velocity.texel(wall), Vec4::ZERO);
    }
}
