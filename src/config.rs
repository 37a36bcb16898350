//! Engine configuration
//!
//! Plain data with defaults, optionally loaded from a TOML file. Missing
//! fields fall back to their defaults so partial config files stay valid.

use std::path::Path;

use glam::Vec2;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target frames per second for the game loop.
    pub frame_rate: u32,
    /// Worker threads for per-layer physics stepping. 0 = derive from the
    /// machine's core count.
    pub worker_threads: usize,
    /// Default gravity for newly created scenes, in m/s².
    pub gravity: [f32; 2],
    /// Enables the debug overlay during the render handoff.
    pub debug: bool,
    /// How long the loop waits for in-flight worker tasks when shutting down.
    pub shutdown_grace_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            worker_threads: 0,
            gravity: [0.0, -9.81],
            debug: false,
            shutdown_grace_seconds: 3.0,
        }
    }
}

impl EngineConfig {
    /// Loads a config from a TOML file, falling back to defaults for any
    /// field the file does not set.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn desired_frame_duration(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    pub fn gravity_vec(&self) -> Vec2 {
        Vec2::new(self.gravity[0], self.gravity[1])
    }
}
