//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::MaskError;

/// Tunables for the mask services. Missing JSON fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of decoded external masks kept in memory.
    pub external_cache_capacity: usize,
    /// Half-size of the square window averaged by
    /// [`get_delta_e_color`](crate::masks::get_delta_e_color). 1 = 3×3.
    pub delta_e_sample_radius: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            external_cache_capacity: 8,
            delta_e_sample_radius: 1,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, MaskError> {
        Ok(serde_json::from_str(json)?)
    }
}
