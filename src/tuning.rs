//! Data-driven movement and combat constants
//!
//! Every number that shapes how the game feels lives here so it can be tuned
//! from a JSON file without touching the simulation code.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(String),
}

/// Movement, physics and combat tuning (units per tick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Movement ===
    /// Horizontal acceleration on the ground and on walls
    pub ground_acc: f64,
    /// Horizontal acceleration in free fall / first jump
    pub air_acc: f64,
    /// Horizontal control while a jump boost window is open
    pub jump_control_acc: f64,
    /// Vertical impulse of a ground jump
    pub ground_jump_vel: f64,
    /// Vertical impulse of a double jump
    pub air_jump_vel: f64,
    /// Per-tick boost while the ground jump is held
    pub ground_jump_boost: f64,
    /// Per-tick boost while the double jump is held
    pub air_jump_boost: f64,
    /// Ticks during which a held jump keeps boosting
    pub jump_boost_ticks: u32,
    /// Extra downward acceleration when holding down in the air
    pub fast_fall_acc: f64,
    /// Horizontal damping while crouching on the ground
    pub crouch_damping: f64,
    /// Vertical damping while pushing into a wall
    pub wall_stick_damping: f64,
    /// Wall jump impulse (x away from the wall, y upward)
    pub wall_jump_vel: [f64; 2],
    /// Max |vertical velocity| at which an airborne player grabs a wall
    pub wall_grab_max_speed: f64,

    // === Physics ===
    /// Downward acceleration per tick
    pub gravity: f64,
    /// Horizontal velocity multiplier while standing on something
    pub ground_friction: f64,
    /// Nonlinear air drag coefficient: v / (1 + k|v|)
    pub air_drag: f64,
    /// Vertical velocity multiplier while touching a wall
    pub wall_friction: f64,
    /// Normal velocity at or above which a collision slides instead of bouncing
    pub bounce_threshold: f64,
    /// Bounce multiplier applied to the normal velocity
    pub bounce_multiplier: f64,

    // === Combat ===
    /// Fireball speed (units per tick)
    pub fireball_speed: f64,
    /// Fireball lifetime in ticks
    pub fireball_lifetime: u32,
    /// Fireball damage on hit
    pub fireball_damage: i32,
    /// Ticks between player shots
    pub fire_cooldown: u32,
    /// Fireball hits needed to break a tile
    pub tile_durability: u8,

    // === AI ===
    /// Firefly random wander strength
    pub firefly_wander: f64,
    /// Firefly pull back toward its home point
    pub firefly_leash: f64,

    // === Rollback ===
    /// Number of frames kept for rollback
    pub rollback_depth: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Movement
            ground_acc: 0.04,
            air_acc: 0.01,
            jump_control_acc: 0.02,
            ground_jump_vel: 0.15,
            air_jump_vel: 0.2,
            ground_jump_boost: 0.03,
            air_jump_boost: 0.04,
            jump_boost_ticks: 10,
            fast_fall_acc: 0.02,
            crouch_damping: 0.6,
            wall_stick_damping: 0.5,
            wall_jump_vel: [0.25, 0.2],
            wall_grab_max_speed: 0.04,

            // Physics
            gravity: 0.02,
            ground_friction: 0.8,
            air_drag: 0.14,
            wall_friction: 0.9,
            bounce_threshold: -0.3,
            bounce_multiplier: 1.4,

            // Combat
            fireball_speed: 0.35,
            fireball_lifetime: 100,
            fireball_damage: 10,
            fire_cooldown: 15,
            tile_durability: 1,

            // AI
            firefly_wander: 0.01,
            firefly_leash: 0.02,

            // Rollback
            rollback_depth: 8,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load tuning from a file, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path)
            .map_err(TuningError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reject values that would make the simulation unstable
    pub fn validate(&self) -> Result<(), TuningError> {
        let unit_factors = [
            ("ground_friction", self.ground_friction),
            ("wall_friction", self.wall_friction),
            ("crouch_damping", self.crouch_damping),
            ("wall_stick_damping", self.wall_stick_damping),
        ];
        for (name, value) in unit_factors {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.air_drag < 0.0 || !self.air_drag.is_finite() {
            return Err(TuningError::Invalid(format!(
                "air_drag must be non-negative, got {}",
                self.air_drag
            )));
        }
        if self.bounce_threshold > 0.0 {
            return Err(TuningError::Invalid(format!(
                "bounce_threshold must be <= 0, got {}",
                self.bounce_threshold
            )));
        }
        if self.tile_durability == 0 {
            return Err(TuningError::Invalid("tile_durability must be >= 1".into()));
        }
        if self.rollback_depth == 0 {
            return Err(TuningError::Invalid("rollback_depth must be >= 1".into()));
        }
        Ok(())
    }
}
