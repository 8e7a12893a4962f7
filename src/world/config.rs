//! Tunables for world generation

use serde::{Deserialize, Serialize};

/// How many times a decoration position is redrawn before falling back
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

/// One class of scattered decoration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterCategory {
    pub count: usize,
    /// Candidates are drawn from `[-half_extent, half_extent]` on both X and Z
    pub half_extent: f32,
    /// Minimum distance from the world origin
    pub clearance: f32,
    pub max_attempts: u32,
}

impl ScatterCategory {
    pub const fn new(count: usize, half_extent: f32, clearance: f32) -> Self {
        Self {
            count,
            half_extent,
            clearance,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Default for ScatterCategory {
    fn default() -> Self {
        Self::new(0, 20.0, 0.0)
    }
}

/// Everything the world builder reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Fixed seed for reproducible layouts; `None` draws from entropy
    pub seed: Option<u64>,
    pub trees: ScatterCategory,
    pub bushes: ScatterCategory,
    pub vines: ScatterCategory,
    pub rocks: ScatterCategory,
    pub flowers: ScatterCategory,
    pub butterflies: ScatterCategory,
    pub spot_lights: usize,
    pub fog_density: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            trees: ScatterCategory::new(50, 25.0, 8.0),
            bushes: ScatterCategory::new(100, 20.0, 6.0),
            vines: ScatterCategory::new(30, 20.0, 0.0),
            rocks: ScatterCategory::new(20, 20.0, 7.0),
            flowers: ScatterCategory::new(50, 20.0, 6.0),
            butterflies: ScatterCategory::new(30, 20.0, 0.0),
            spot_lights: 10,
            fog_density: 0.02,
        }
    }
}

impl WorldConfig {
    /// A world with no scattered decorations; only the ground, stage and hollow remain
    pub fn bare() -> Self {
        let empty = |c: ScatterCategory| ScatterCategory { count: 0, ..c };
        let defaults = Self::default();
        Self {
            trees: empty(defaults.trees),
            bushes: empty(defaults.bushes),
            vines: empty(defaults.vines),
            rocks: empty(defaults.rocks),
            flowers: empty(defaults.flowers),
            butterflies: empty(defaults.butterflies),
            spot_lights: 0,
            ..defaults
        }
    }
}
