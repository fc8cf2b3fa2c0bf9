use glam::{UVec3, Vec3};

use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct GradientParams {
    pub velocity: FieldId,
    pub pressure: FieldId,
    pub output: FieldId,
    pub half_inverse_cell_size: f32,
}

impl GradientParams {
    pub fn new(velocity: FieldId, pressure: FieldId, output: FieldId) -> Self {
        Self {
            velocity,
            pressure,
            output,
            half_inverse_cell_size: 0.5,
        }
    }
}

/// Subtracts the central-difference pressure gradient from the velocity.
#[derive(Clone, Debug)]
pub struct Gradient {
    op: Slabop,
}

impl Gradient {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Gradient {
    type Params<'p> = GradientParams;

    fn compute(&self, fields: &mut Fields, params: GradientParams) {
        fields.render(params.output, |view, target| {
            let velocity = view.sampler(params.velocity);
            let pressure = view.sampler(params.pressure);

            self.op.dispatch(target, |cell| {
                let p = |offset: UVec3, forward: bool| {
                    let neighbour = if forward { cell + offset } else { cell - offset };
                    pressure.fetch_cell(neighbour).x
                };
                let gradient = Vec3::new(
                    p(UVec3::X, true) - p(UVec3::X, false),
                    p(UVec3::Y, true) - p(UVec3::Y, false),
                    p(UVec3::Z, true) - p(UVec3::Z, false),
                ) * params.half_inverse_cell_size;

                let v = velocity.fetch_cell(cell);
                (v.truncate() - gradient).extend(v.w)
            });
        });
    }
}
