//! Serde shapes for the glam vectors stored in config files.
//!
//! Vectors are written as `{ "x": .., "y": .. }` objects. Fields opt in with
//! `#[serde(with = "Vec3Def")]`.

use glam::{UVec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(remote = "Vec3")]
pub struct Vec3Def {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Texture resolutions.
#[derive(Serialize, Deserialize)]
#[serde(remote = "UVec2")]
pub struct UVec2Def {
    pub x: u32,
    pub y: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Box3 {
        #[serde(with = "Vec3Def")]
        size: Vec3,
        #[serde(with = "UVec2Def")]
        texture: UVec2,
    }

    #[test]
    fn test_vectors_are_written_as_objects() {
        let value = Box3 {
            size: Vec3::new(1.5, -2.0, 0.25),
            texture: UVec2::new(512, 256),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            r#"{"size":{"x":1.5,"y":-2.0,"z":0.25},"texture":{"x":512,"y":256}}"#
        );
        assert_eq!(serde_json::from_str::<Box3>(&json).unwrap(), value);
    }
}
