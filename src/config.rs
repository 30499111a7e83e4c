// src/config.rs
use serde::{Deserialize, Serialize};
use crate::colour::ACTIVITY_SCALE;
use crate::drivers::{GridViewerError, DEFAULT_TARGET_RATE_HZ};
use crate::grid::{GridDimension, MAX_DIMENSION};
use crate::types::StreamInfo;

/// Environment variable holding inline JSON overrides, e.g. `{"update_interval": 25}`.
pub const CONFIG_ENV_VAR: &str = "GRIDVIEWER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    // time steps per settled window (after downsampling)
    pub update_interval: usize,
    pub target_sample_rate_hz: f32,
    pub refresh_rate_hz: u32,
    pub grid_x: u16,
    pub grid_y: u16,
    pub activity_scale: f32,
    // time steps per simulated acquisition block
    pub block_size: usize,
    pub streams: Vec<StreamInfo>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            update_interval: 10,
            target_sample_rate_hz: DEFAULT_TARGET_RATE_HZ,
            refresh_rate_hz: 30,
            grid_x: MAX_DIMENSION,
            grid_y: MAX_DIMENSION,
            activity_scale: ACTIVITY_SCALE,
            block_size: 64,
            streams: vec![
                StreamInfo::new(0, "Headstage A (16 ch)", 1_000.0, 16),
                StreamInfo::new(1, "Probe (384 ch)", 30_000.0, 384),
                StreamInfo::new(2, "High-density array (5000 ch)", 2_000.0, 5_000),
            ],
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, GridViewerError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overridden by `GRIDVIEWER_CONFIG` when set.
    pub fn from_env() -> Result<Self, GridViewerError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(json) => Self::from_json(&json),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), GridViewerError> {
        if self.update_interval == 0 {
            return Err(GridViewerError::InvalidUpdateInterval);
        }
        if self.target_sample_rate_hz <= 0.0 || self.streams.iter().any(|s| s.sample_rate_hz <= 0.0) {
            return Err(GridViewerError::InvalidSampleRate);
        }
        if self.refresh_rate_hz == 0 {
            return Err(GridViewerError::InvalidConfig("refresh rate must be at least 1 Hz".into()));
        }
        if self.activity_scale <= 0.0 {
            return Err(GridViewerError::InvalidConfig("activity scale must be positive".into()));
        }
        if self.block_size == 0 {
            return Err(GridViewerError::InvalidConfig("block size must be at least one sample".into()));
        }
        self.grid_dimensions()?;
        Ok(())
    }

    pub fn grid_dimensions(&self) -> Result<(GridDimension, GridDimension), GridViewerError> {
        Ok((
            GridDimension::new(self.grid_x as i64)?,
            GridDimension::new(self.grid_y as i64)?,
        ))
    }
}
