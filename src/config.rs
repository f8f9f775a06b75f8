//! Tunable gameplay parameters, loadable from a TOML file.
//!
//! Every section is `#[serde(default)]`, so a config file only needs to name
//! the values it overrides.

use std::{fs, io, path::Path};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayfieldConfig {
    pub width: f32,
    pub height: f32,
}
impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub lives: u32,
    /// Horizontal speed, units per second.
    pub speed: f32,
    /// Seconds between shots without power-ups.
    pub fire_rate: f32,
    pub bullet_speed: f32,
    /// Seconds of invulnerability after taking a hit.
    pub hit_invulnerability: f32,
}
impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            lives: 3,
            speed: 360.0,
            fire_rate: 0.18,
            bullet_speed: 700.0,
            hit_invulnerability: 2.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WaveConfig {
    /// Every level that is a multiple of this is a boss level.
    pub boss_interval: u32,
    /// How far the formation drops when it hits a side wall.
    pub drop_amount: f32,
    /// Multiplier on the formation's per-second fire probability.
    pub enemy_fire_scale: f32,
    /// Base power-up spawn probability per second.
    pub powerup_rate: f32,
    pub powerup_fall_speed: f32,
}
impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            boss_interval: 5,
            drop_amount: 30.0,
            enemy_fire_scale: 1.0,
            powerup_rate: 0.008,
            powerup_fall_speed: 80.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub fps: u32,
    /// Upper bound on a single tick's `dt`, so a stall cannot teleport
    /// entities through each other.
    pub max_dt: f32,
}
impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_dt: 0.05,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub playfield: PlayfieldConfig,
    pub player: PlayerConfig,
    pub waves: WaveConfig,
    pub timing: TimingConfig,
}

impl GameConfig {
    /// Read a config file. A missing file yields the defaults; a file that
    /// exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("playfield.width", self.playfield.width),
            ("playfield.height", self.playfield.height),
            ("player.speed", self.player.speed),
            ("player.fire_rate", self.player.fire_rate),
            ("player.bullet_speed", self.player.bullet_speed),
            ("player.hit_invulnerability", self.player.hit_invulnerability),
            ("waves.drop_amount", self.waves.drop_amount),
            ("waves.enemy_fire_scale", self.waves.enemy_fire_scale),
            ("waves.powerup_rate", self.waves.powerup_rate),
            ("waves.powerup_fall_speed", self.waves.powerup_fall_speed),
            ("timing.max_dt", self.timing.max_dt),
        ];
        for (name, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
            if value < 0.0 {
                return Err(ConfigError::Negative(name));
            }
        }

        if self.waves.boss_interval == 0 {
            return Err(ConfigError::Invalid("waves.boss_interval must be at least 1"));
        }
        if self.playfield.width < 200.0 || self.playfield.height < 300.0 {
            return Err(ConfigError::Invalid("playfield must be at least 200x300"));
        }
        if self.timing.fps == 0 {
            return Err(ConfigError::Invalid("timing.fps must be at least 1"));
        }
        if self.timing.max_dt == 0.0 {
            return Err(ConfigError::Invalid("timing.max_dt must be positive"));
        }
        Ok(())
    }
}
