use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlowGraphError, Result};

/// Force constants. All lengths are simulation units; time is measured in
/// 60 Hz frames so a `dt` of 1.0 is one nominal frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub repulsion_k: f32,
    pub min_dist_sq: f32,
    pub center_strength: f32,
    pub spring_k: f32,
    pub rest_length: f32,
    pub blocked_rest_bonus: f32,
    pub escalated_rest_bonus: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub mass_divisor: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion_k: 120.0,
            min_dist_sq: 400.0,
            center_strength: 0.002,
            spring_k: 0.02,
            rest_length: 170.0,
            blocked_rest_bonus: 10.0,
            escalated_rest_bonus: 40.0,
            damping: 0.8,
            max_speed: 24.0,
            mass_divisor: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub base_width: f32,
    pub base_height: f32,
    /// Inset kept between node footprints and the simulation bounds.
    pub margin: f32,
    /// Padding added around the live node extent when fitting the view.
    pub view_margin: f32,
    pub jitter: f32,
    pub max_dt_ms: f32,
    pub min_container: f32,
    pub physics: PhysicsConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_width: 1000.0,
            base_height: 520.0,
            margin: 12.0,
            view_margin: 24.0,
            jitter: 14.0,
            max_dt_ms: 32.0,
            min_container: 64.0,
            physics: PhysicsConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| FlowGraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| FlowGraphError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_width > 0.0 && self.base_height > 0.0) {
            return Err(FlowGraphError::InvalidConfig(format!(
                "base size must be positive, got {}x{}",
                self.base_width, self.base_height
            )));
        }
        if self.margin < 0.0 || self.margin * 2.0 >= self.base_width.min(self.base_height) {
            return Err(FlowGraphError::InvalidConfig(format!(
                "margin {} does not fit the {}x{} bounds",
                self.margin, self.base_width, self.base_height
            )));
        }
        let damping = self.physics.damping;
        if !(damping > 0.0 && damping < 1.0) {
            return Err(FlowGraphError::InvalidConfig(format!(
                "damping must lie in (0, 1), got {damping}"
            )));
        }
        if self.physics.mass_divisor <= 0.0 || self.physics.min_dist_sq <= 0.0 {
            return Err(FlowGraphError::InvalidConfig(
                "mass_divisor and min_dist_sq must be positive".to_owned(),
            ));
        }
        if self.max_dt_ms <= 0.0 {
            return Err(FlowGraphError::InvalidConfig(
                "max_dt_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
