use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields, TextureRef};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct MacCormackParams {
    /// Field before advection.
    pub advected: FieldId,
    pub velocity: FieldId,
    /// `advected` traced forward by `dt`.
    pub forward: TextureRef,
    /// The forward trace traced back by `-dt`.
    pub backward: TextureRef,
    pub output: FieldId,
    pub dt: f32,
    pub dissipation: f32,
}

/// MacCormack correction of a forward semi-Lagrangian trace.
///
/// `forward + 0.5 * (advected - backward)`, limited to the range of the eight
/// cells of `advected` around the backtraced position so the correction
/// cannot overshoot.
#[derive(Clone, Debug)]
pub struct MacCormack {
    op: Slabop,
}

impl MacCormack {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for MacCormack {
    type Params<'p> = MacCormackParams;

    fn compute(&self, fields: &mut Fields, params: MacCormackParams) {
        fields.render(params.output, |view, target| {
            let advected = view.sampler(params.advected);
            let velocity = view.sampler(params.velocity);
            let forward = view.sampler(params.forward);
            let backward = view.sampler(params.backward);

            self.op.dispatch(target, |cell| {
                let phi = advected.fetch_cell(cell);
                let corrected =
                    forward.fetch_cell(cell) + 0.5 * (phi - backward.fetch_cell(cell));

                let origin = cell.as_vec3() - params.dt * velocity.fetch_cell(cell).truncate();
                let (lo, hi) = advected.neighborhood_bounds(origin);
                corrected.clamp(lo, hi) * params.dissipation
            });
        });
    }
}
