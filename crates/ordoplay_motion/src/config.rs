// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback and editing tunables.
//!
//! Stored as RON. Missing fields fall back to their defaults, so a config
//! file only needs the values it changes.

use crate::error::{MotionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hard ceiling on blend slots per object
pub const MAX_BLEND_SLOTS: usize = 4;

/// Default iteration ceiling for chain traversals
pub const DEFAULT_CHAIN_LIMIT: usize = 1000;

/// Motion system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Number of cut slots per camera
    pub max_cuts: usize,
    /// Number of blend slots per object (at most [`MAX_BLEND_SLOTS`])
    pub blend_slots: usize,
    /// Step used when searching for a free key or event time, in seconds
    pub insert_epsilon: f32,
    /// Number of steps tried before the free-time search gives up
    pub max_insert_retries: usize,
    /// Iteration ceiling for path-point chain traversal
    pub chain_iteration_limit: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_cuts: 16,
            blend_slots: MAX_BLEND_SLOTS,
            insert_epsilon: 0.001,
            max_insert_retries: 1000,
            chain_iteration_limit: DEFAULT_CHAIN_LIMIT,
        }
    }
}

impl MotionConfig {
    /// Parse and validate a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: MotionConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded motion config from {:?}", path);
        Ok(config)
    }

    /// Save a config file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Reject values the drivers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_cuts == 0 {
            return Err(MotionError::Config("max_cuts must be at least 1".to_string()));
        }
        if self.blend_slots == 0 || self.blend_slots > MAX_BLEND_SLOTS {
            return Err(MotionError::Config(format!(
                "blend_slots must be between 1 and {MAX_BLEND_SLOTS}, got {}",
                self.blend_slots
            )));
        }
        if !(self.insert_epsilon.is_finite() && self.insert_epsilon > 0.0) {
            return Err(MotionError::Config(format!(
                "insert_epsilon must be positive, got {}",
                self.insert_epsilon
            )));
        }
        if self.chain_iteration_limit == 0 {
            return Err(MotionError::Config("chain_iteration_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}
