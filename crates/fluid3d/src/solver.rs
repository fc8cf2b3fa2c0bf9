//! The per-frame solver pipeline.
//!
//! One [`Solver::step`] runs, in order:
//! 1. advection of velocity and density, then the velocity boundary
//! 2. buoyancy (when gravity is on), then the velocity boundary
//! 3. pointer forces
//! 4. vorticity confinement (when enabled), then the velocity boundary
//! 5. implicit viscosity (when enabled)
//! 6. projection: divergence, pressure solve, gradient subtraction, boundary
//!
//! Fields and operators are rebuilt together on [`Solver::reset`]; a failed
//! reset leaves the previous state untouched.

use glam::{Vec3, Vec4};

use crate::error::FluidError;
use crate::fields::{FieldId, Fields, TextureRef};
use crate::interaction::Interaction;
use crate::layout::TiledLayout;
use crate::settings::{AdvectionScheme, SolverSettings};
use crate::slab::Slab;
use crate::slabop::{
    Advect, AdvectParams, Boundary, BoundaryParams, Buoyancy, BuoyancyParams, Curl, CurlParams,
    Divergence, DivergenceParams, Force, ForceParams, Gradient, GradientParams, Jacobi,
    JacobiBoundary, JacobiParams, JacobiStencil, MacCormack, MacCormackParams, StencilOperator,
    Vorticity, VorticityParams,
};
use crate::texture::Texture;

/// Free-slip walls: the normal velocity is reflected.
const VELOCITY_BOUNDARY_SCALE: f32 = -1.0;
/// Zero normal pressure derivative.
const PRESSURE_BOUNDARY_SCALE: f32 = 1.0;
/// Under-relaxation of the pressure sweeps.
const PRESSURE_OMEGA: f32 = 0.9;

/// A field listed for visualisation, with the bias a viewer adds to signed data.
#[derive(Clone, Copy, Debug)]
pub struct DebugSlab<'a> {
    pub name: &'static str,
    pub slab: &'a Slab,
    pub bias: f32,
}

#[derive(Clone, Debug)]
struct Operators {
    advect: Advect,
    maccormack: MacCormack,
    force: Force,
    divergence: Divergence,
    gradient: Gradient,
    boundary: Boundary,
    buoyancy: Buoyancy,
    jacobi: Jacobi,
    curl: Curl,
    vorticity: Vorticity,
}

impl Operators {
    fn new(layout: &TiledLayout) -> Self {
        Self {
            advect: Advect::new(layout),
            maccormack: MacCormack::new(layout),
            force: Force::new(layout),
            divergence: Divergence::new(layout),
            gradient: Gradient::new(layout),
            boundary: Boundary::new(layout),
            buoyancy: Buoyancy::new(layout),
            jacobi: Jacobi::new(layout),
            curl: Curl::new(layout),
            vorticity: Vorticity::new(layout),
        }
    }
}

pub struct Solver {
    /// Mutable between steps.
    pub settings: SolverSettings,
    layout: TiledLayout,
    fields: Fields,
    operators: Operators,
    steps: u64,
    /// (gravity, vorticity, viscosity) as of the last step.
    stages: Option<(bool, bool, bool)>,
}

impl Solver {
    pub fn new(layout: TiledLayout, settings: SolverSettings) -> Result<Self, FluidError> {
        let (fields, operators) = Self::build(&layout)?;
        log::info!("solver ready: {layout}");
        log::debug!("solver settings: {settings:?}");
        Ok(Self {
            settings,
            layout,
            fields,
            operators,
            steps: 0,
            stages: None,
        })
    }

    /// Allocate fresh fields and operators for `layout`.
    fn build(layout: &TiledLayout) -> Result<(Fields, Operators), FluidError> {
        if !layout.has_interior() {
            return Err(FluidError::NoInterior {
                simulation_resolution: layout.simulation_resolution(),
            });
        }
        let fields = Fields::new(layout)?;
        Ok((fields, Operators::new(layout)))
    }

    /// Rebuild every field and operator for a new layout. All fields start at
    /// zero. On error nothing is changed.
    pub fn reset(&mut self, layout: TiledLayout) -> Result<(), FluidError> {
        let (fields, operators) = Self::build(&layout)?;
        self.layout = layout;
        self.fields = fields;
        self.operators = operators;
        self.steps = 0;
        log::info!("solver reset: {layout}");
        Ok(())
    }

    /// Advance the simulation by `dt` seconds (scaled by `settings.speed`).
    pub fn step(&mut self, dt: f32, interaction: &Interaction) {
        let dt = dt * self.settings.speed;
        let settings = self.settings.clone();
        log::trace!("step {} dt={dt}", self.steps);

        let stages = (
            settings.has_gravity,
            settings.has_vorticity,
            settings.has_viscosity,
        );
        if self.stages != Some(stages) {
            log::debug!(
                "stages: gravity={} vorticity={} viscosity={}",
                stages.0,
                stages.1,
                stages.2
            );
            self.stages = Some(stages);
        }

        // Advection
        self.advect(FieldId::Velocity, dt);
        self.advect(FieldId::Density, dt);
        self.enforce_velocity_boundary();

        // Body forces
        if settings.has_gravity {
            self.operators.buoyancy.compute(
                &mut self.fields,
                BuoyancyParams {
                    velocity: FieldId::Velocity,
                    density: FieldId::Density,
                    output: FieldId::Velocity,
                    dt,
                    gravity: settings.gravity,
                },
            );
            self.enforce_velocity_boundary();
        }
        self.apply_interaction(interaction);

        // Vorticity confinement
        if settings.has_vorticity && settings.vorticity_strength > 0.0 {
            self.operators
                .curl
                .compute(&mut self.fields, CurlParams::new(FieldId::Velocity, FieldId::Curl));
            self.operators.vorticity.compute(
                &mut self.fields,
                VorticityParams {
                    velocity: FieldId::Velocity,
                    curl: FieldId::Curl,
                    output: FieldId::Velocity,
                    dt,
                    strength: settings.vorticity_strength,
                    half_inverse_cell_size: 0.5,
                },
            );
            self.enforce_velocity_boundary();
        }

        // Viscous diffusion
        if settings.has_viscosity && settings.viscosity > 0.0 && dt > 0.0 {
            self.diffuse(settings.viscosity, settings.viscosity_iterations, dt);
        }

        self.project();
        self.steps += 1;
    }

    /// Carry `field` along the velocity using the configured scheme.
    fn advect(&mut self, field: FieldId, dt: f32) {
        let dissipation = self.settings.dissipation;
        match self.settings.advection {
            AdvectionScheme::SemiLagrangian => self.operators.advect.compute(
                &mut self.fields,
                AdvectParams {
                    advected: field,
                    velocity: FieldId::Velocity,
                    output: field,
                    dt,
                    dissipation,
                },
            ),
            AdvectionScheme::MacCormack => {
                // Seed the scratch halo with the field's own.
                self.fields.copy(field, FieldId::Scratch);

                let trace = |advected, dt| AdvectParams {
                    advected,
                    velocity: FieldId::Velocity,
                    output: FieldId::Scratch,
                    dt,
                    dissipation: 1.0,
                };
                self.operators
                    .advect
                    .compute(&mut self.fields, trace(field, dt));
                self.operators
                    .advect
                    .compute(&mut self.fields, trace(FieldId::Scratch, -dt));

                // Scratch now holds the backward trace in `read` and the
                // forward trace in `write`.
                self.operators.maccormack.compute(
                    &mut self.fields,
                    MacCormackParams {
                        advected: field,
                        velocity: FieldId::Velocity,
                        forward: TextureRef::write(FieldId::Scratch),
                        backward: TextureRef::read(FieldId::Scratch),
                        output: field,
                        dt,
                        dissipation,
                    },
                );
            }
        }
    }

    fn apply_interaction(&mut self, interaction: &Interaction) {
        let Some(pointer) = interaction.active_pointer() else {
            return;
        };
        let (position, direction) = pointer.to_domain(self.layout.domain());
        let radius = self.settings.force_radius;

        if interaction.buttons.primary {
            let (amount, _) = self.settings.density_splat();
            self.splat_density(position, Vec3::ONE, radius, amount);
        }
        if interaction.buttons.secondary {
            self.splat_velocity(position, direction, radius, self.settings.force_velocity);
        }
    }

    /// Add a Gaussian density splat. `position` and `radius` are in domain
    /// units with the origin at the domain corner. A negative amount erases
    /// and the result is floored at zero.
    pub fn splat_density(&mut self, position: Vec3, color: Vec3, radius: f32, amount: f32) {
        let floor = (amount < 0.0).then_some(0.0);
        let params = self.force_params(FieldId::Density, position, color.extend(0.0), radius, amount, floor);
        self.operators.force.compute(&mut self.fields, params);
    }

    /// Add a Gaussian velocity splat along `direction`, then re-enforce the
    /// walls.
    pub fn splat_velocity(&mut self, position: Vec3, direction: Vec3, radius: f32, amount: f32) {
        let params =
            self.force_params(FieldId::Velocity, position, direction.extend(0.0), radius, amount, None);
        self.operators.force.compute(&mut self.fields, params);
        self.enforce_velocity_boundary();
    }

    fn force_params(
        &self,
        field: FieldId,
        position: Vec3,
        value: Vec4,
        radius: f32,
        amount: f32,
        floor: Option<f32>,
    ) -> ForceParams {
        ForceParams {
            input: field,
            output: field,
            position: self.layout.domain_to_grid(position),
            value,
            radius: radius * self.layout.cells_per_unit().x,
            amount,
            floor,
        }
    }

    /// Implicit diffusion: Jacobi on `x - nu*dt*lap(x) = b`, with `b` a
    /// snapshot of the velocity before the sweeps.
    fn diffuse(&mut self, viscosity: f32, iterations: u32, dt: f32) {
        self.fields.copy(FieldId::Velocity, FieldId::Scratch);

        let alpha = 1.0 / (viscosity * dt);
        self.operators.jacobi.compute(
            &mut self.fields,
            JacobiParams {
                x: FieldId::Velocity,
                b: FieldId::Scratch,
                output: FieldId::Velocity,
                iterations,
                alpha,
                beta: 6.0 + alpha,
                omega: 1.0,
                stencil: JacobiStencil::Compact,
                boundary: Some(JacobiBoundary {
                    boundary: &self.operators.boundary,
                    scale: VELOCITY_BOUNDARY_SCALE,
                }),
            },
        );
    }

    /// Make the velocity divergence-free.
    ///
    /// The pressure equation is `div(grad p) = div u` with the same
    /// half-cell central differences on both sides, i.e. the wide Laplacian.
    pub fn project(&mut self) {
        self.enforce_velocity_boundary();
        self.operators.divergence.compute(
            &mut self.fields,
            DivergenceParams::new(FieldId::Velocity, FieldId::Divergence),
        );

        // Warm-started from last step's pressure. The wide stencil never
        // reads the halo, so the wall condition is applied once at the end.
        self.operators.jacobi.compute(
            &mut self.fields,
            JacobiParams {
                x: FieldId::Pressure,
                b: FieldId::Divergence,
                output: FieldId::Pressure,
                iterations: self.settings.pressure_iterations,
                alpha: -4.0,
                beta: 6.0,
                omega: PRESSURE_OMEGA,
                stencil: JacobiStencil::Wide,
                boundary: None,
            },
        );
        self.operators.boundary.compute(
            &mut self.fields,
            BoundaryParams {
                input: FieldId::Pressure,
                output: FieldId::Pressure,
                scale: PRESSURE_BOUNDARY_SCALE,
            },
        );

        self.operators.gradient.compute(
            &mut self.fields,
            GradientParams::new(FieldId::Velocity, FieldId::Pressure, FieldId::Velocity),
        );
        self.enforce_velocity_boundary();
    }

    fn enforce_velocity_boundary(&mut self) {
        self.operators.boundary.compute(
            &mut self.fields,
            BoundaryParams {
                input: FieldId::Velocity,
                output: FieldId::Velocity,
                scale: VELOCITY_BOUNDARY_SCALE,
            },
        );
    }

    /// Recompute the divergence field from the current velocity and return it.
    pub fn divergence_of_velocity(&mut self) -> &Texture {
        self.operators.divergence.compute(
            &mut self.fields,
            DivergenceParams::new(FieldId::Velocity, FieldId::Divergence),
        );
        self.fields.read(FieldId::Divergence)
    }

    // ========== Renderer interface ==========

    pub fn density(&self) -> &Texture {
        self.fields.read(FieldId::Density)
    }

    pub fn velocity(&self) -> &Texture {
        self.fields.read(FieldId::Velocity)
    }

    pub fn pressure(&self) -> &Texture {
        self.fields.read(FieldId::Pressure)
    }

    /// Every field a debug viewer may want to show.
    pub fn debug_slabs(&self) -> Vec<DebugSlab<'_>> {
        [
            (FieldId::Density, 0.0),
            (FieldId::Velocity, 0.5),
            (FieldId::Pressure, 0.5),
            (FieldId::Divergence, 0.5),
            (FieldId::Curl, 0.5),
        ]
        .into_iter()
        .map(|(id, bias)| DebugSlab {
            name: id.name(),
            slab: self.fields.slab(id),
            bias,
        })
        .collect()
    }

    pub fn layout(&self) -> &TiledLayout {
        &self.layout
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Direct field access for seeding initial conditions.
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Steps taken since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
