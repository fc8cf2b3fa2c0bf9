use glam::{IVec3, UVec3, Vec4};

use super::{Boundary, BoundaryParams, Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

/// Boundary condition re-applied to the iterate after every sweep.
#[derive(Clone, Copy, Debug)]
pub struct JacobiBoundary<'p> {
    pub boundary: &'p Boundary,
    pub scale: f32,
}

/// Which discrete Laplacian a sweep relaxes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JacobiStencil {
    /// Neighbours one cell away. Halo cells are read as they are.
    #[default]
    Compact,
    /// Neighbours two cells away, mirrored about the walls. This is the
    /// composition of the central-difference divergence and gradient, so a
    /// converged pressure leaves no divergence behind.
    Wide,
}

#[derive(Clone, Copy, Debug)]
pub struct JacobiParams<'p> {
    /// Initial guess, read by the first sweep only.
    pub x: FieldId,
    /// Right-hand side. Must not be the output field.
    pub b: FieldId,
    pub output: FieldId,
    pub iterations: u32,
    pub alpha: f32,
    pub beta: f32,
    /// Relaxation factor: `x' = (1 - omega) * x + omega * jacobi(x)`.
    pub omega: f32,
    pub stencil: JacobiStencil,
    pub boundary: Option<JacobiBoundary<'p>>,
}

/// Jacobi relaxation of `(sum of 6 neighbours) + alpha * b = beta * x`.
///
/// Pressure uses the wide stencil with `alpha = -4, beta = 6` and a little
/// under-relaxation, which damps the period-4 modes plain Jacobi leaves
/// oscillating. Implicit viscosity uses the compact stencil with
/// `alpha = 1 / (nu * dt), beta = 6 + alpha`.
#[derive(Clone, Debug)]
pub struct Jacobi {
    op: Slabop,
    /// Last interior cell on each axis.
    last: IVec3,
}

const AXES: [IVec3; 3] = [IVec3::X, IVec3::Y, IVec3::Z];

impl Jacobi {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
            last: layout.simulation_resolution().as_ivec3() - IVec3::splat(2),
        }
    }

    /// The six neighbours of `cell` for `stencil`.
    fn neighbours(&self, cell: UVec3, stencil: JacobiStencil) -> [UVec3; 6] {
        let at = |offset: IVec3| match stencil {
            JacobiStencil::Compact => (cell.as_ivec3() + offset).as_uvec3(),
            JacobiStencil::Wide => self.mirror(cell.as_ivec3() + offset * 2),
        };
        let mut cells = [cell; 6];
        for (pair, axis) in cells.chunks_exact_mut(2).zip(AXES) {
            pair[0] = at(-axis);
            pair[1] = at(axis);
        }
        cells
    }

    /// Reflect a cell that left the interior about the wall it crossed.
    /// Walls sit halfway between the halo and the first interior cell.
    fn mirror(&self, cell: IVec3) -> UVec3 {
        let last = self.last;
        let cell = IVec3::select(cell.cmplt(IVec3::ONE), IVec3::ONE - cell, cell);
        let cell = IVec3::select(cell.cmpgt(last), last * 2 + IVec3::ONE - cell, cell);
        cell.clamp(IVec3::ONE, last.max(IVec3::ONE)).as_uvec3()
    }
}

impl StencilOperator for Jacobi {
    type Params<'p> = JacobiParams<'p>;

    fn compute(&self, fields: &mut Fields, params: JacobiParams<'_>) {
        assert_ne!(
            params.b, params.output,
            "jacobi right-hand side must differ from its output"
        );
        let reciprocal_beta = 1.0 / params.beta;
        let omega = params.omega;

        for iteration in 0..params.iterations {
            let source = if iteration == 0 { params.x } else { params.output };

            fields.render(params.output, |view, target| {
                let x = view.sampler(source);
                let b = view.sampler(params.b);

                self.op.dispatch(target, |cell| {
                    let neighbours: Vec4 = self
                        .neighbours(cell, params.stencil)
                        .into_iter()
                        .map(|n| x.fetch_cell(n))
                        .sum();
                    let relaxed =
                        (neighbours + params.alpha * b.fetch_cell(cell)) * reciprocal_beta;
                    if omega == 1.0 {
                        relaxed
                    } else {
                        x.fetch_cell(cell) * (1.0 - omega) + relaxed * omega
                    }
                });
            });

            if let Some(condition) = params.boundary {
                condition.boundary.compute(
                    fields,
                    BoundaryParams {
                        input: params.output,
                        output: params.output,
                        scale: condition.scale,
                    },
                );
            }
        }
    }
}
