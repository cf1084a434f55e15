use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::api::error::ConfigError;
use crate::board::config::{positive, BoardConfig};
use crate::core::physics::Material;

/// Solver and clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity in the absolute frame. Y up, so gravity points down.
    pub gravity: Vec3,
    /// Fixed tick in seconds (default: 1/120).
    pub fixed_dt: f64,
    /// Largest frame delta the clock accepts, in seconds.
    pub max_frame_delta: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_dt: 1.0 / 120.0,
            max_frame_delta: 0.1,
        }
    }
}

/// Ball spawning and lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    /// Maximum number of live balls. The oldest is evicted past this.
    pub cap: usize,
    /// Horizontal spawn range as a fraction of `board_width`.
    pub spawn_spread: f32,
    /// Seed for the spawn-position RNG.
    pub seed: u64,
    /// Default pacing between spawns of a batch, in milliseconds.
    pub batch_delay_ms: f64,
    pub material: Material,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            cap: 250,
            spawn_spread: 0.2,
            seed: 0x5EED,
            batch_delay_ms: 80.0,
            material: Material {
                restitution: 0.35,
                friction: 0.15,
                density: 2.0,
                linear_damping: 0.05,
                angular_damping: 0.2,
            },
        }
    }
}

/// Materials for the static board, kept apart from the ball material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardMaterials {
    pub peg: Material,
    pub wall: Material,
}

impl Default for BoardMaterials {
    fn default() -> Self {
        Self {
            peg: Material {
                restitution: 0.5,
                friction: 0.1,
                ..Material::default()
            },
            wall: Material {
                restitution: 0.2,
                friction: 0.3,
                ..Material::default()
            },
        }
    }
}

/// Everything the simulation needs, fixed at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlinkoConfig {
    pub board: BoardConfig,
    pub physics: PhysicsConfig,
    pub balls: BallConfig,
    pub materials: BoardMaterials,
    /// Absolute position of the rig origin.
    pub origin: Vec3,
}

fn material_ok(field: &'static str, m: &Material) -> Result<(), ConfigError> {
    positive(field, m.density)?;
    let all = [m.restitution, m.friction, m.linear_damping, m.angular_damping];
    if let Some(bad) = all.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(ConfigError::OutOfRange {
            field,
            value: f64::from(*bad),
        });
    }
    Ok(())
}

impl PlinkoConfig {
    /// Parse from JSON (missing fields take defaults) and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;

        let p = &self.physics;
        if !p.fixed_dt.is_finite() || p.fixed_dt <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "physics.fixed_dt",
                value: p.fixed_dt,
            });
        }
        if !p.max_frame_delta.is_finite() || p.max_frame_delta < p.fixed_dt {
            return Err(ConfigError::OutOfRange {
                field: "physics.max_frame_delta",
                value: p.max_frame_delta,
            });
        }
        if !p.gravity.is_finite() {
            return Err(ConfigError::Constraint("gravity must be finite"));
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::Constraint("origin must be finite"));
        }

        let b = &self.balls;
        if b.cap == 0 {
            return Err(ConfigError::OutOfRange {
                field: "balls.cap",
                value: 0.0,
            });
        }
        if !(0.0..=1.0).contains(&b.spawn_spread) {
            return Err(ConfigError::OutOfRange {
                field: "balls.spawn_spread",
                value: f64::from(b.spawn_spread),
            });
        }
        if !b.batch_delay_ms.is_finite() || b.batch_delay_ms < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "balls.batch_delay_ms",
                value: b.batch_delay_ms,
            });
        }
        material_ok("balls.material", &b.material)?;
        material_ok("materials.peg", &self.materials.peg)?;
        material_ok("materials.wall", &self.materials.wall)?;
        Ok(())
    }
}
