use glam::{UVec3, Vec4};

use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct DivergenceParams {
    pub velocity: FieldId,
    pub output: FieldId,
    /// `0.5 / cell size` in grid units.
    pub half_inverse_cell_size: f32,
}

impl DivergenceParams {
    pub fn new(velocity: FieldId, output: FieldId) -> Self {
        Self {
            velocity,
            output,
            half_inverse_cell_size: 0.5,
        }
    }
}

/// Central-difference divergence of a vector field.
#[derive(Clone, Debug)]
pub struct Divergence {
    op: Slabop,
}

impl Divergence {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Divergence {
    type Params<'p> = DivergenceParams;

    fn compute(&self, fields: &mut Fields, params: DivergenceParams) {
        fields.render(params.output, |view, target| {
            let velocity = view.sampler(params.velocity);

            self.op.dispatch(target, |cell| {
                let left = velocity.fetch_cell(cell - UVec3::X).x;
                let right = velocity.fetch_cell(cell + UVec3::X).x;
                let bottom = velocity.fetch_cell(cell - UVec3::Y).y;
                let top = velocity.fetch_cell(cell + UVec3::Y).y;
                let back = velocity.fetch_cell(cell - UVec3::Z).z;
                let front = velocity.fetch_cell(cell + UVec3::Z).z;

                let divergence = params.half_inverse_cell_size
                    * ((right - left) + (top - bottom) + (front - back));
                Vec4::new(divergence, 0.0, 0.0, 0.0)
            });
        });
    }
}
