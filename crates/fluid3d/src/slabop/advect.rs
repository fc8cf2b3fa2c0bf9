use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct AdvectParams {
    pub advected: FieldId,
    pub velocity: FieldId,
    pub output: FieldId,
    pub dt: f32,
    pub dissipation: f32,
}

/// Semi-Lagrangian advection: each cell samples `advected` where its velocity
/// traces back to after `dt`.
#[derive(Clone, Debug)]
pub struct Advect {
    op: Slabop,
}

impl Advect {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Advect {
    type Params<'p> = AdvectParams;

    fn compute(&self, fields: &mut Fields, params: AdvectParams) {
        fields.render(params.output, |view, target| {
            let velocity = view.sampler(params.velocity);
            let advected = view.sampler(params.advected);

            self.op.dispatch(target, |cell| {
                let origin = cell.as_vec3() - params.dt * velocity.fetch_cell(cell).truncate();
                advected.sample(origin) * params.dissipation
            });
        });
    }
}
