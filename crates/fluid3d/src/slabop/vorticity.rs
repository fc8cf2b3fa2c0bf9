use glam::{UVec3, Vec3};

use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

/// `|grad |w||^2` below which the confinement direction is taken as zero.
const MIN_GRADIENT_SQUARED: f32 = 1e-10;

#[derive(Clone, Copy, Debug)]
pub struct VorticityParams {
    pub velocity: FieldId,
    /// Output of [`super::Curl`]: vorticity in xyz, magnitude in w.
    pub curl: FieldId,
    pub output: FieldId,
    pub dt: f32,
    pub strength: f32,
    pub half_inverse_cell_size: f32,
}

/// Vorticity confinement: `u += strength * dt * normalize(grad |w|) x w`.
#[derive(Clone, Debug)]
pub struct Vorticity {
    op: Slabop,
}

impl Vorticity {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Vorticity {
    type Params<'p> = VorticityParams;

    fn compute(&self, fields: &mut Fields, params: VorticityParams) {
        fields.render(params.output, |view, target| {
            let velocity = view.sampler(params.velocity);
            let curl = view.sampler(params.curl);

            self.op.dispatch(target, |cell| {
                let magnitude = |n: UVec3| curl.fetch_cell(n).w;
                let eta = Vec3::new(
                    magnitude(cell + UVec3::X) - magnitude(cell - UVec3::X),
                    magnitude(cell + UVec3::Y) - magnitude(cell - UVec3::Y),
                    magnitude(cell + UVec3::Z) - magnitude(cell - UVec3::Z),
                ) * params.half_inverse_cell_size;

                let v = velocity.fetch_cell(cell);
                if eta.length_squared() <= MIN_GRADIENT_SQUARED {
                    return v;
                }

                let omega = curl.fetch_cell(cell).truncate();
                let force = params.strength * params.dt * eta.normalize().cross(omega);
                v + force.extend(0.0)
            });
        });
    }
}
