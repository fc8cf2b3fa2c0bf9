//! Solver settings.
//!
//! Settings are owned by the solver and only changed between steps. They
//! round-trip through JSON so a tuned setup can be saved and reloaded.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::FluidError;
use crate::serde_utils::Vec3Def;

/// Density amount used when the density force is negative (erase mode).
pub const ERASE_DENSITY_AMOUNT: f32 = -100.0;

/// How fields are carried along the velocity each step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvectionScheme {
    /// Forward and backward trace with a limited error correction.
    #[default]
    MacCormack,
    /// A single backtrace.
    SemiLagrangian,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Multiplier on the frame `dt`.
    pub speed: f32,
    /// Per-step multiplier on advected quantities (1.0 = no decay).
    pub dissipation: f32,
    pub advection: AdvectionScheme,

    pub has_viscosity: bool,
    pub viscosity_iterations: u32,
    pub viscosity: f32,

    pub has_vorticity: bool,
    pub vorticity_strength: f32,

    pub pressure_iterations: u32,

    pub has_gravity: bool,
    #[serde(with = "Vec3Def")]
    pub gravity: Vec3,

    /// Splat radius in domain units.
    pub force_radius: f32,
    /// Density splat amount; negative erases.
    pub force_density: f32,
    pub force_velocity: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            dissipation: 1.0,
            advection: AdvectionScheme::MacCormack,
            has_viscosity: false,
            viscosity_iterations: 30,
            viscosity: 0.3,
            has_vorticity: false,
            vorticity_strength: 0.03,
            pressure_iterations: 80,
            has_gravity: false,
            gravity: Vec3::new(0.0, -0.98, 0.0),
            force_radius: 2.0,
            force_density: 0.5,
            force_velocity: 0.5,
        }
    }
}

impl SolverSettings {
    /// Amount and lower clamp for a pointer density splat.
    pub fn density_splat(&self) -> (f32, Option<f32>) {
        if self.force_density < 0.0 {
            (ERASE_DENSITY_AMOUNT, Some(0.0))
        } else {
            (self.force_density, None)
        }
    }

    /// Save settings to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), FluidError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::debug!("saved solver settings to {}", path.display());
        Ok(())
    }

    /// Load settings from JSON file
    pub fn load_json(path: &Path) -> Result<Self, FluidError> {
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        log::debug!("loaded solver settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SolverSettings::default();
        assert_eq!(settings.pressure_iterations, 80);
        assert_eq!(settings.advection, AdvectionScheme::MacCormack);
        assert!(!settings.has_gravity && !settings.has_viscosity && !settings.has_vorticity);
        assert_eq!(settings.density_splat(), (0.5, None));
    }

    #[test]
    fn test_negative_density_force_erases() {
        let settings = SolverSettings {
            force_density: -0.1,
            ..Default::default()
        };
        assert_eq!(settings.density_splat(), (ERASE_DENSITY_AMOUNT, Some(0.0)));
    }

    #[test]
    fn test_json_roundtrip_and_partial_documents() {
        let settings = SolverSettings {
            has_gravity: true,
            gravity: Vec3::new(0.0, -2.0, 0.5),
            advection: AdvectionScheme::SemiLagrangian,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: SolverSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);

        let partial: SolverSettings =
            serde_json::from_str(r#"{ "pressure_iterations": 12, "gravity": { "x": 1.0, "y": 0.0, "z": 0.0 } }"#)
                .unwrap();
        assert_eq!(partial.pressure_iterations, 12);
        assert_eq!(partial.gravity, Vec3::X);
        assert_eq!(partial.speed, 1.0);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("fluid3d-settings-{}.json", std::process::id()));
        let settings = SolverSettings {
            vorticity_strength: 0.2,
            ..Default::default()
        };
        settings.save_json(&path).unwrap();
        let loaded = SolverSettings::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }
}
