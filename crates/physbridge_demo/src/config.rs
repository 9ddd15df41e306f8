//! Demo configuration
//!
//! Loaded from a `.toml` or `.ron` file given with `--config`; every field has
//! a default so a partial file is enough.

use physbridge::config::Config;
use physbridge::debug::DebugDrawConfig;
use physbridge::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Complete demo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulation settings
    pub physics: PhysicsConfig,

    /// Scene layout
    pub scene: SceneConfig,

    /// Frame loop settings
    pub run: RunConfig,

    /// Debug line drawing
    pub debug_draw: DebugDrawConfig,

    /// Log filter in `RUST_LOG` syntax (the environment variable wins)
    pub log_filter: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            scene: SceneConfig::default(),
            run: RunConfig::default(),
            debug_draw: DebugDrawConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config for DemoConfig {}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration
    pub gravity: Vec3,

    /// Length of one fixed sub-step in seconds
    pub fixed_time_step: f32,

    /// Sub-steps allowed per frame before simulated time is dropped
    pub max_sub_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            fixed_time_step: 1.0 / 60.0,
            max_sub_steps: 4,
        }
    }
}

/// Scene layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Where the player body starts
    pub player_start: Vec3,

    /// Player body mass
    pub player_mass: f32,

    /// Half extents of the player's box mesh
    pub player_half_extents: Vec3,

    /// Edge length of the square ground grid
    pub ground_size: f32,

    /// Grid cells along each ground edge (rounded up to an even count)
    pub ground_divisions: u32,

    /// Where the skinned limb stands
    pub limb_position: Vec3,

    /// Bend of the limb's upper bone, in radians
    pub limb_bend: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            player_start: Vec3::new(0.0, 10.0, 0.0),
            player_mass: 5.0,
            player_half_extents: Vec3::new(0.5, 1.0, 0.5),
            ground_size: 20.0,
            ground_divisions: 8,
            limb_position: Vec3::new(5.0, 0.0, 0.0),
            limb_bend: 0.6,
        }
    }
}

/// Frame loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Frames to run
    pub frames: u32,

    /// Simulated seconds per frame
    pub frame_delta: f32,

    /// Log the scene every this many frames (0 disables)
    pub log_every: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            frame_delta: 1.0 / 60.0,
            log_every: 60,
        }
    }
}
