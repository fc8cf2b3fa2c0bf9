use glam::Vec3;

use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct BuoyancyParams {
    pub velocity: FieldId,
    pub density: FieldId,
    pub output: FieldId,
    pub dt: f32,
    pub gravity: Vec3,
}

/// Density-weighted body force: `u += dt * gravity * density`.
#[derive(Clone, Debug)]
pub struct Buoyancy {
    op: Slabop,
}

impl Buoyancy {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Buoyancy {
    type Params<'p> = BuoyancyParams;

    fn compute(&self, fields: &mut Fields, params: BuoyancyParams) {
        fields.render(params.output, |view, target| {
            let velocity = view.sampler(params.velocity);
            let density = view.sampler(params.density);
            let impulse = (params.dt * params.gravity).extend(0.0);

            self.op.dispatch(target, |cell| {
                velocity.fetch_cell(cell) + impulse * density.fetch_cell(cell).x
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{UVec2, UVec3, Vec4};

    #[test]
    fn test_only_dense_cells_accelerate() {
        let layout = TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap();
        let mut fields = Fields::new(&layout).unwrap();
        let dense = UVec3::new(4, 4, 4);
        fields
            .slab_mut(FieldId::Density)
            .read
            .set_texel(layout.texel_index(dense), Vec4::X * 2.0);

        Buoyancy::new(&layout).compute(
            &mut fields,
            BuoyancyParams {
                velocity: FieldId::Velocity,
                density: FieldId::Density,
                output: FieldId::Velocity,
                dt: 0.5,
                gravity: Vec3::new(0.0, -0.98, 0.0),
            },
        );

        let velocity = fields.read(FieldId::Velocity);
        let v = velocity.texel(layout.texel_index(dense));
        assert!((v - Vec4::new(0.0, -0.98, 0.0, 0.0)).abs().max_element() < 1e-6);
        assert_eq!(velocity.texel(layout.texel_index(UVec3::new(5, 4, 4))), Vec4::ZERO);
    }
}
