use glam::{UVec3, Vec3};

use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct CurlParams {
    pub velocity: FieldId,
    pub output: FieldId,
    pub half_inverse_cell_size: f32,
}

impl CurlParams {
    pub fn new(velocity: FieldId, output: FieldId) -> Self {
        Self {
            velocity,
            output,
            half_inverse_cell_size: 0.5,
        }
    }
}

/// Vorticity `curl(u)` in xyz and its magnitude in w.
#[derive(Clone, Debug)]
pub struct Curl {
    op: Slabop,
}

impl Curl {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Curl {
    type Params<'p> = CurlParams;

    fn compute(&self, fields: &mut Fields, params: CurlParams) {
        fields.render(params.output, |view, target| {
            let velocity = view.sampler(params.velocity);

            self.op.dispatch(target, |cell| {
                let v = |n: UVec3| velocity.fetch_cell(n).truncate();
                let left = v(cell - UVec3::X);
                let right = v(cell + UVec3::X);
                let bottom = v(cell - UVec3::Y);
                let top = v(cell + UVec3::Y);
                let back = v(cell - UVec3::Z);
                let front = v(cell + UVec3::Z);

                let curl = Vec3::new(
                    (top.z - bottom.z) - (front.y - back.y),
                    (front.x - back.x) - (right.z - left.z),
                    (right.y - left.y) - (top.x - bottom.x),
                ) * params.half_inverse_cell_size;
                curl.extend(curl.length())
            });
        });
    }
}
