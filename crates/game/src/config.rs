//! Game configuration (tuning, layout, autoplay). Loaded from config.ron at startup.

use engine_core::Vec3;
use physics::ShapeDesc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// All tuning for one play session. Every field has a default, so a partial
/// `config.ron` only overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub charge: ChargeConfig,
    #[serde(default)]
    pub throw: ThrowConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub creature: CreatureConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub autoplay: AutoplayConfig,
}

/// Charge meter rates and thresholds, in charge units (0..100) and seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    /// Value a new session starts from.
    pub start: f32,
    /// Below this the meter turns around and rises.
    pub lower_threshold: f32,
    /// Above this the meter turns around and falls.
    pub upper_threshold: f32,
    /// Falling rate in units per second.
    pub rate: f32,
    /// Rising runs this much faster than falling.
    pub rising_multiplier: f32,
    /// Meter is drawn in the warning colour above this.
    pub urgent_level: f32,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            start: 1.0,
            lower_threshold: 1.0,
            upper_threshold: 99.0,
            rate: 150.0,
            rising_multiplier: 1.1,
            urgent_level: 80.0,
        }
    }
}

impl ChargeConfig {
    pub fn rising_rate(&self) -> f32 {
        self.rate * self.rising_multiplier
    }
}

/// Throwable body, throw and smash tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowConfig {
    pub strength_multiplier: f32,
    /// Impact force above which any non-mouth contact smashes the throwable.
    pub smash_threshold: f32,
    /// Charge is clamped to `0..=max_force` before it becomes an impulse.
    pub max_force: f32,
    pub radius: f32,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Offset from the view anchor while held, in view space (forward is -Z).
    pub held_offset: [f32; 3],
    /// Per-axis speed under which a settling throwable starts glowing.
    pub rest_speed_tolerance: f32,
    pub park_delay_ms: u64,
    /// Out-of-play spot for smashed bodies.
    pub park_position: [f32; 3],
    /// Delay from the first pickup to the creature opening its mouth.
    pub game_start_delay_ms: u64,
    /// How close the player must be to pick something up.
    pub pickup_distance: f32,
}

impl Default for ThrowConfig {
    fn default() -> Self {
        Self {
            strength_multiplier: 0.8,
            smash_threshold: 80.0,
            max_force: 100.0,
            radius: 0.475,
            mass: 3.0,
            linear_damping: 0.4,
            angular_damping: 0.4,
            friction: 0.25,
            restitution: 0.33,
            held_offset: [0.0, -0.65, -1.0],
            rest_speed_tolerance: 2.0,
            park_delay_ms: 500,
            park_position: [16.0, 24.0, 38.0],
            game_start_delay_ms: 3000,
            pickup_distance: 4.0,
        }
    }
}

impl ThrowConfig {
    pub fn park_delay(&self) -> Duration {
        Duration::from_millis(self.park_delay_ms)
    }

    pub fn game_start_delay(&self) -> Duration {
        Duration::from_millis(self.game_start_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub fixed_step: f32,
    pub max_substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            fixed_step: 1.0 / 60.0,
            max_substeps: 3,
        }
    }
}

/// Collider shape as written in config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ShapeConfig {
    Ball { radius: f32 },
    Cuboid { half_extents: [f32; 3] },
}

impl From<ShapeConfig> for ShapeDesc {
    fn from(shape: ShapeConfig) -> Self {
        match shape {
            ShapeConfig::Ball { radius } => ShapeDesc::Ball { radius },
            ShapeConfig::Cuboid { half_extents } => ShapeDesc::Cuboid {
                half_extents: Vec3::from_array(half_extents),
            },
        }
    }
}

/// One collider, placed relative to the creature's origin (world axes).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColliderConfig {
    pub offset: [f32; 3],
    pub shape: ShapeConfig,
}

/// Creature placement, stage timings, health rules and body sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    pub position: [f32; 3],
    pub yaw_degrees: f32,
    pub audio_position: [f32; 3],
    pub mouth_open_physics_delay_ms: u64,
    pub close_to_chew_delay_ms: u64,
    pub chew_min_ms: u64,
    pub chew_max_ms: u64,
    pub max_health: f32,
    pub bite_damage: f32,
    pub recovery_amount: f32,
    pub recovery_interval_ms: u64,
    /// Recovery stops at or above this.
    pub recovery_ceiling: f32,
    pub closed_body: ColliderConfig,
    pub open_body: ColliderConfig,
    /// Sensor volume inside the open mouth.
    pub interior_body: ColliderConfig,
    pub dying_body: ColliderConfig,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            position: [16.0, 0.0, 41.0],
            yaw_degrees: 180.0,
            audio_position: [16.0, 1.0, 30.0],
            mouth_open_physics_delay_ms: 830,
            close_to_chew_delay_ms: 233,
            chew_min_ms: 4000,
            chew_max_ms: 7500,
            max_health: 100.0,
            bite_damage: 10.0,
            recovery_amount: 0.2,
            recovery_interval_ms: 1000,
            recovery_ceiling: 98.0,
            closed_body: ColliderConfig {
                offset: [0.0, 2.5, 0.0],
                shape: ShapeConfig::Cuboid {
                    half_extents: [2.2, 2.5, 1.6],
                },
            },
            open_body: ColliderConfig {
                offset: [0.0, 1.0, 0.3],
                shape: ShapeConfig::Cuboid {
                    half_extents: [2.2, 1.0, 1.3],
                },
            },
            interior_body: ColliderConfig {
                offset: [0.0, 2.4, -0.4],
                shape: ShapeConfig::Ball { radius: 1.0 },
            },
            dying_body: ColliderConfig {
                offset: [0.0, 0.9, 0.0],
                shape: ShapeConfig::Cuboid {
                    half_extents: [2.6, 0.9, 2.2],
                },
            },
        }
    }
}

impl CreatureConfig {
    pub fn origin(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn mouth_open_physics_delay(&self) -> Duration {
        Duration::from_millis(self.mouth_open_physics_delay_ms)
    }

    pub fn close_to_chew_delay(&self) -> Duration {
        Duration::from_millis(self.close_to_chew_delay_ms)
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_interval_ms)
    }
}

/// Axis-aligned spawn rectangle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnZone {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl SpawnZone {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self { min_x, max_x, min_z, max_z }
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub zones: Vec<SpawnZone>,
    /// Height placeholders sit at inside their zone.
    pub y_offset: f32,
    /// Height placeholders are parked at while waiting to respawn.
    pub hidden_y: f32,
    pub respawn_min_ms: u64,
    pub respawn_max_ms: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            zones: vec![
                SpawnZone::new(3.5, 10.5, 6.5, 16.0),
                SpawnZone::new(3.5, 10.5, 16.5, 26.5),
                SpawnZone::new(21.5, 28.5, 6.5, 16.0),
                SpawnZone::new(21.5, 28.5, 16.5, 26.5),
            ],
            y_offset: 0.6,
            hidden_y: -5.0,
            respawn_min_ms: 8000,
            respawn_max_ms: 24000,
        }
    }
}

/// Static obstacle registered as terrain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub position: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default)]
    pub rotation_y_degrees: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub music_position: [f32; 3],
    pub obstacles: Vec<ObstacleConfig>,
    /// Directory sounds are loaded from.
    pub assets_dir: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            music_position: [16.0, 16.0, 24.0],
            obstacles: vec![
                // Scarecrow post between the plots.
                ObstacleConfig {
                    position: [16.0, 1.5, 16.0],
                    half_extents: [0.15, 1.5, 0.15],
                    rotation_y_degrees: 0.0,
                },
                // Fence along the back of the field.
                ObstacleConfig {
                    position: [16.0, 0.6, 44.5],
                    half_extents: [14.0, 0.6, 0.2],
                    rotation_y_degrees: 0.0,
                },
            ],
            assets_dir: "assets".to_string(),
        }
    }
}

/// Headless demo driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub frame_ms: u64,
    /// Every this many frames, one frame takes `hitch_ms` instead.
    pub hitch_every: u32,
    pub hitch_ms: u64,
    pub max_seconds: f32,
    /// Where the scripted player throws from.
    pub throw_spot: [f32; 3],
    pub eye_height: f32,
    /// Pace frames against the wall clock instead of running flat out.
    pub realtime: bool,
    /// Mouse sensitivity multiplier (1.0 = default).
    pub sensitivity: f32,
    /// Launch elevation of every scripted throw.
    pub pitch_degrees: f32,
    /// Uniform spread added to the solved charge, in meter units.
    pub charge_jitter: f32,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            seed: None,
            frame_ms: 16,
            hitch_every: 240,
            hitch_ms: 120,
            max_seconds: 900.0,
            throw_spot: [16.0, 0.0, 28.0],
            eye_height: 1.6,
            realtime: false,
            sensitivity: 1.0,
            pitch_degrees: 35.0,
            charge_jitter: 3.0,
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => {
                log::info!("No config at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}
