//! End-to-end solver tests
//!
//! Full `step()` runs on the default 20^3 domain at a 512x512 texture
//! (64^3 cells), plus boundary and advection checks through the public API.

use fluid3d::slabop::{Boundary, BoundaryParams};
use fluid3d::{
    AdvectionScheme, FieldId, Interaction, Solver, SolverSettings, StencilOperator, Texture,
    TiledLayout, UVec2, UVec3, Vec3, Vec4,
};

const DT: f32 = 1.0 / 60.0;

fn solver(settings: SolverSettings) -> Solver {
    let layout = TiledLayout::compute(UVec2::new(512, 512), Vec3::splat(20.0)).unwrap();
    assert_eq!(layout.simulation_resolution(), UVec3::splat(64));
    Solver::new(layout, settings).unwrap()
}

fn max_interior_divergence(layout: &TiledLayout, divergence: &Texture) -> f32 {
    let res = layout.simulation_resolution();
    let mut max = 0.0f32;
    for z in 1..res.z - 1 {
        for y in 1..res.y - 1 {
            for x in 1..res.x - 1 {
                let d = divergence.texel(layout.texel_index(UVec3::new(x, y, z))).x;
                max = max.max(d.abs());
            }
        }
    }
    max
}

/// Density splat in still air: mass stays, nothing moves
#[test]
fn test_density_splat_in_still_air() {
    let mut solver = solver(SolverSettings::default());
    solver.splat_density(Vec3::splat(10.0), Vec3::ONE, 2.0, 1.0);
    let before = solver.density().channel_sums().x;
    assert!(before > 0.0);

    solver.step(DT, &Interaction::none());

    let after = solver.density().channel_sums().x;
    assert!(
        ((after - before) / before).abs() < 1e-6,
        "density not conserved: {before} -> {after}"
    );
    assert!(
        solver.velocity().data().iter().all(|&v| v == 0.0),
        "velocity must stay exactly zero"
    );
    assert!(
        solver.pressure().data().iter().all(|&p| p == 0.0),
        "pressure must stay exactly zero"
    );
}

/// Rightward impulse at one cell with gravity and walls: projection removes
/// the compressibility it introduced
#[test]
fn test_velocity_impulse_is_projected() {
    let mut solver = solver(SolverSettings {
        has_gravity: true,
        ..Default::default()
    });
    let layout = *solver.layout();
    let cell = UVec3::splat(32);
    // Half a cell wide
    let radius = 0.5 / layout.cells_per_unit().x;
    solver.splat_velocity(layout.cell_center(cell), Vec3::X, radius, 1.0);

    let max_before = max_interior_divergence(&layout, solver.divergence_of_velocity());
    assert!(max_before > 0.4, "impulse should be compressible");

    solver.step(DT, &Interaction::none());

    let divergence = solver.divergence_of_velocity();
    let max_after = max_interior_divergence(&layout, divergence);
    assert!(
        max_after < 0.01 * max_before,
        "divergence not removed: {max_before} -> {max_after}"
    );

    let mut net = 0.0f64;
    for z in 31..=33 {
        for y in 31..=33 {
            for x in 31..=33 {
                net += divergence.texel(layout.texel_index(UVec3::new(x, y, z))).x as f64;
            }
        }
    }
    assert!(net.abs() < 0.01, "net divergence near impulse: {net}");

    let velocity = solver.velocity();
    assert!(velocity.data().iter().all(|v| v.is_finite()));
    assert!(velocity.texel(layout.texel_index(cell)).x > 0.0);
}

#[test]
fn test_boundary_signs() {
    let mut solver = solver(SolverSettings::default());
    let layout = *solver.layout();
    let boundary = Boundary::new(&layout);

    let wall = UVec3::new(10, 0, 20);
    let inner = UVec3::new(10, 1, 20);
    let fields = solver.fields_mut();
    fields
        .slab_mut(FieldId::Velocity)
        .read
        .set_texel(layout.texel_index(inner), Vec4::new(0.0, 2.0, 0.0, 0.0));
    fields
        .slab_mut(FieldId::Pressure)
        .read
        .set_texel(layout.texel_index(inner), Vec4::new(3.0, 0.0, 0.0, 0.0));

    boundary.compute(
        fields,
        BoundaryParams {
            input: FieldId::Velocity,
            output: FieldId::Velocity,
            scale: -1.0,
        },
    );
    boundary.compute(
        fields,
        BoundaryParams {
            input: FieldId::Pressure,
            output: FieldId::Pressure,
            scale: 1.0,
        },
    );

    let velocity = fields.read(FieldId::Velocity).texel(layout.texel_index(wall));
    let pressure = fields.read(FieldId::Pressure).texel(layout.texel_index(wall));
    assert_eq!(velocity.y, -2.0, "normal velocity should be reflected");
    assert_eq!(pressure.x, 3.0, "pressure should copy its neighbour");

    // Front and back slices copy from the adjacent interior slice.
    let back_wall = UVec3::new(5, 5, 63);
    let back_inner = UVec3::new(5, 5, 62);
    fields
        .slab_mut(FieldId::Pressure)
        .read
        .set_texel(layout.texel_index(back_inner), Vec4::X * 7.0);
    boundary.compute(
        fields,
        BoundaryParams {
            input: FieldId::Pressure,
            output: FieldId::Pressure,
            scale: 1.0,
        },
    );
    assert_eq!(fields.read(FieldId::Pressure).texel(layout.texel_index(back_wall)).x, 7.0);
}

#[test]
fn test_swap_twice_restores_buffers() {
    let mut solver = solver(SolverSettings::default());
    let slab = solver.fields_mut().slab_mut(FieldId::Velocity);
    let read = slab.read.data().as_ptr();
    let write = slab.write.data().as_ptr();

    slab.swap();
    slab.swap();
    assert_eq!(slab.read.data().as_ptr(), read);
    assert_eq!(slab.write.data().as_ptr(), write);
}

/// Every advection scheme leaves a field alone in still air
#[test]
fn test_still_air_advection_is_noop() {
    for advection in [AdvectionScheme::MacCormack, AdvectionScheme::SemiLagrangian] {
        let mut solver = solver(SolverSettings {
            advection,
            ..Default::default()
        });
        solver.splat_density(Vec3::new(6.0, 12.0, 9.0), Vec3::ONE, 3.0, 0.7);
        let before = solver.density().clone();

        solver.step(0.5, &Interaction::none());
        assert_eq!(solver.density(), &before, "{advection:?} changed density");
    }
}

/// All optional stages on: the state stays finite and smoke rises
#[test]
fn test_all_stages_enabled() {
    let mut solver = solver(SolverSettings {
        has_gravity: true,
        gravity: Vec3::new(0.0, 2.0, 0.0),
        has_viscosity: true,
        has_vorticity: true,
        vorticity_strength: 0.3,
        pressure_iterations: 20,
        ..Default::default()
    });
    solver.splat_density(Vec3::new(10.0, 5.0, 10.0), Vec3::ONE, 2.0, 1.0);

    for _ in 0..3 {
        solver.step(DT, &Interaction::velocity(Vec3::ZERO, Vec3::new(0.3, 0.0, 1.0)));
    }

    assert_eq!(solver.steps(), 3);
    assert!(solver.velocity().data().iter().all(|v| v.is_finite()));
    assert!(solver.density().data().iter().all(|d| d.is_finite()));

    let layout = *solver.layout();
    let centre = layout.domain_to_grid(Vec3::new(10.0, 5.0, 10.0)).round().as_uvec3();
    assert!(solver.velocity().texel(layout.texel_index(centre)).y > 0.0);
}

/// Speed scales dt: zero speed freezes advection and forces
#[test]
fn test_zero_speed_freezes_motion() {
    let mut solver = solver(SolverSettings {
        speed: 0.0,
        has_gravity: true,
        ..Default::default()
    });
    solver.splat_density(Vec3::splat(10.0), Vec3::ONE, 2.0, 1.0);
    solver.step(DT, &Interaction::none());
    assert!(solver.velocity().data().iter().all(|&v| v == 0.0));
}
