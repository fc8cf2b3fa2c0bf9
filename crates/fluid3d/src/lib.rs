//! 3D Eulerian Smoke Simulation on a Flat 3D Texture
//!
//! Density, velocity and pressure live on a 3D grid whose Z-slices are tiled
//! into a single 2D texture. Each step runs semi-Lagrangian advection with
//! MacCormack correction, buoyancy, pointer forces, vorticity confinement,
//! implicit viscosity and a Jacobi pressure projection, every stage as one
//! data-parallel pass over double-buffered fields.
//!
//! # Example
//!
//! ```
//! use fluid3d::{Interaction, Solver, SolverSettings, TiledLayout};
//! use glam::{UVec2, Vec3};
//!
//! let layout = TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap();
//! let mut solver = Solver::new(layout, SolverSettings::default()).unwrap();
//!
//! // Puff of smoke in the middle of the box
//! solver.splat_density(Vec3::splat(10.0), Vec3::ONE, 2.0, 1.0);
//!
//! solver.step(1.0 / 60.0, &Interaction::none());
//! assert!(solver.density().channel_sums().x > 0.0);
//! ```

pub mod error;
pub mod fields;
pub mod interaction;
pub mod layout;
pub mod sampler;
pub mod serde_utils;
pub mod settings;
pub mod simulation;
pub mod slab;
pub mod slabop;
pub mod solver;
pub mod texture;

pub use error::FluidError;
pub use fields::{BufferSide, FieldId, FieldView, Fields, TextureRef};
pub use glam::{IVec3, UVec2, UVec3, Vec3, Vec4};
pub use interaction::{Buttons, Interaction, Pointer};
pub use layout::{LayoutSearch, TiledLayout};
pub use sampler::TiledSampler;
pub use settings::{AdvectionScheme, SolverSettings, ERASE_DENSITY_AMOUNT};
pub use simulation::{Simulation, SimulationConfig};
pub use slab::Slab;
pub use slabop::{Slabop, StencilOperator, TileQuad};
pub use solver::{DebugSlab, Solver};
pub use texture::{Texture, TextureFormat};
