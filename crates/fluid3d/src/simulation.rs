//! Run/pause/reset controller around the solver.
//!
//! Domain and texture bound changes go through [`Simulation::reset`], which
//! only swaps in new state once the layout and every field are built. When it
//! refuses, the previous solver keeps its state, the simulation stays paused
//! and [`Simulation::domain_valid`] reports the problem to the UI.

use std::path::Path;

use glam::{UVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::FluidError;
use crate::interaction::Interaction;
use crate::layout::TiledLayout;
use crate::serde_utils::{UVec2Def, Vec3Def};
use crate::settings::SolverSettings;
use crate::solver::Solver;

/// User-facing sizing inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physical size of the box.
    #[serde(with = "Vec3Def")]
    pub domain: Vec3,
    /// Maximum texture resolution the layout may use.
    #[serde(with = "UVec2Def")]
    pub resolution: UVec2,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            domain: Vec3::splat(20.0),
            resolution: UVec2::new(256, 256),
        }
    }
}

impl SimulationConfig {
    pub fn layout(&self) -> Result<TiledLayout, FluidError> {
        TiledLayout::compute(self.resolution, self.domain)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), FluidError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self, FluidError> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

pub struct Simulation {
    config: SimulationConfig,
    solver: Solver,
    running: bool,
    domain_valid: bool,
}

impl Simulation {
    /// Build the first layout and solver and start running.
    pub fn new(config: SimulationConfig, settings: SolverSettings) -> Result<Self, FluidError> {
        let layout = config.layout()?;
        let solver = Solver::new(layout, settings)?;
        Ok(Self {
            config,
            solver,
            running: true,
            domain_valid: true,
        })
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// False after a reset was refused for the current config.
    pub fn domain_valid(&self) -> bool {
        self.domain_valid
    }

    /// Rebuild the solver from the config.
    ///
    /// On failure the previous solver and layout are kept, the simulation
    /// stays stopped and the error is returned.
    pub fn reset(&mut self) -> Result<(), FluidError> {
        self.stop();

        let rebuilt = self
            .config
            .layout()
            .and_then(|layout| self.solver.reset(layout));
        if let Err(err) = rebuilt {
            self.domain_valid = false;
            log::warn!(
                "reset refused for domain {} at {}: {err}",
                self.config.domain,
                self.config.resolution
            );
            return Err(err);
        }

        self.domain_valid = true;
        self.start();
        Ok(())
    }

    pub fn set_domain(&mut self, domain: Vec3) -> Result<(), FluidError> {
        self.config.domain = domain;
        self.reset()
    }

    pub fn set_resolution(&mut self, resolution: UVec2) -> Result<(), FluidError> {
        self.config.resolution = resolution;
        self.reset()
    }

    /// Step the solver if running. Returns whether a step was taken.
    pub fn frame(&mut self, dt: f32, interaction: &Interaction) -> bool {
        if !self.running {
            return false;
        }
        self.solver.step(dt, interaction);
        true
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Layout of the live solver (the last one that reset successfully).
    pub fn layout(&self) -> &TiledLayout {
        self.solver.layout()
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }
}
