//! Headless smoke plume
//!
//! Emits jittered puffs of smoke near the floor of the box with gravity
//! pointing up, so buoyancy carries them through the vorticity-confined flow.
//! Prints per-frame field statistics and optionally dumps the final density
//! texture as raw little-endian f32.
//!
//! Usage: cargo run --example smoke_plume -- [frames] [settings.json] [density.raw]

use std::path::Path;

use fluid3d::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

const DT: f32 = 1.0 / 60.0;

fn main() -> Result<(), FluidError> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let frames: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(120);

    let settings = match args.get(2) {
        Some(path) => SolverSettings::load_json(Path::new(path))?,
        None => SolverSettings {
            has_gravity: true,
            gravity: Vec3::new(0.0, 1.5, 0.0),
            has_vorticity: true,
            vorticity_strength: 0.1,
            force_density: 1.0,
            ..Default::default()
        },
    };

    let mut sim = Simulation::new(SimulationConfig::default(), settings)?;
    println!("Layout: {}", sim.layout());
    println!(
        "Simulating {} cells for {} frames",
        sim.layout().simulation_resolution(),
        frames
    );

    let domain = sim.layout().domain();
    let mut rng = StdRng::seed_from_u64(7);

    for frame in 0..frames {
        // World space has the domain centred on the origin; emit near the floor.
        let jitter = Vec3::new(rng.gen_range(-1.0..1.0), 0.0, rng.gen_range(-1.0..1.0));
        let emitter = Vec3::new(0.0, -domain.y * 0.35, 0.0) + jitter;
        let interaction = Interaction {
            pointer: Some(Pointer {
                position: emitter,
                direction: Vec3::new(rng.gen_range(-0.2..0.2), 1.0, 0.0),
            }),
            buttons: Buttons {
                primary: true,
                secondary: frame % 4 == 0,
            },
        };

        sim.frame(DT, &interaction);

        if frame % 10 == 0 || frame + 1 == frames {
            let solver = sim.solver_mut();
            let density = solver.density().channel_sums().x;
            let max_speed = solver
                .velocity()
                .data()
                .chunks_exact(4)
                .map(|v| Vec3::new(v[0], v[1], v[2]).length())
                .fold(0.0f32, f32::max);
            let max_divergence = solver
                .divergence_of_velocity()
                .data()
                .iter()
                .fold(0.0f32, |m, d| m.max(d.abs()));
            println!(
                "frame {frame:4}: density {density:10.2}  max |u| {max_speed:7.3}  max |div u| {max_divergence:.2e}"
            );
        }
    }

    if let Some(path) = args.get(3) {
        let density = sim.solver().density();
        std::fs::write(path, density.as_bytes())?;
        println!(
            "Wrote {}x{} density texture to {}",
            density.width(),
            density.height(),
            path
        );
    }

    Ok(())
}
