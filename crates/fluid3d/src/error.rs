//! Error types for layout computation, field allocation and persistence.

use glam::{UVec2, UVec3, Vec3};
use thiserror::Error;

/// Errors surfaced synchronously by layout computation, solver reset and
/// settings persistence. Stepping a successfully reset solver never fails.
#[derive(Debug, Error)]
pub enum FluidError {
    /// A domain component is zero, negative or not finite.
    #[error("degenerate domain {domain}: every dimension must be positive and finite")]
    DegenerateDomain { domain: Vec3 },

    /// A maximum texture side is zero.
    #[error("invalid max texture resolution {resolution}")]
    InvalidTextureResolution { resolution: UVec2 },

    /// The tile search produced no tiles for this texture bound and domain.
    #[error("no tiled layout fits domain {domain} into a {max_texture} texture")]
    InfeasibleLayout { max_texture: UVec2, domain: Vec3 },

    /// The layout leaves no interior cells once the 1-cell halo is removed.
    #[error("simulation resolution {simulation_resolution} has no interior cells")]
    NoInterior { simulation_resolution: UVec3 },

    /// Texture storage could not be reserved.
    #[error("failed to allocate {width}x{height} texture with {channels} channel(s)")]
    Allocation {
        width: u32,
        height: u32,
        channels: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
