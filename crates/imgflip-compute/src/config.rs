//! File and environment configuration.
//!
//! ```yaml
//! flip_x_axis: true
//! flip_y_axis: false
//! flip_diag: true
//! backend: cpu
//! pool_budget_mb: 64
//! ```
//!
//! `IMGFLIP_BACKEND` overrides `backend` and `IMGFLIP_POOL_MB` overrides
//! `pool_budget_mb`.

use std::path::Path;

use imgflip_core::FlipToggles;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, memory};
use crate::dispatcher::DispatcherConfig;
use crate::{ComputeError, ComputeResult};

/// Flip configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipConfig {
    /// Which flips to apply.
    #[serde(flatten)]
    pub toggles: FlipToggles,
    /// Backend name (`auto`, `cpu`, `wgpu`).
    pub backend: Option<String>,
    /// Budget for idle pooled buffers, in megabytes.
    pub pool_budget_mb: Option<u64>,
}

impl FlipConfig {
    /// Parse YAML.
    pub fn from_yaml(text: &str) -> ComputeResult<Self> {
        serde_yaml::from_str(text).map_err(|e| ComputeError::Config(e.to_string()))
    }

    /// Load a YAML file.
    pub fn load(path: &Path) -> ComputeResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ComputeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    /// Backend to use, honoring `IMGFLIP_BACKEND`.
    pub fn backend(&self) -> ComputeResult<Backend> {
        match memory::backend_override().or_else(|| self.backend.clone()) {
            Some(name) => name.parse(),
            None => Ok(Backend::Auto),
        }
    }

    /// Dispatcher settings derived from this config, honoring `IMGFLIP_POOL_MB`.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        match memory::pool_mb_override().or(self.pool_budget_mb) {
            Some(mb) => DispatcherConfig { pool_budget: mb.saturating_mul(1024 * 1024) },
            None => DispatcherConfig::default(),
        }
    }
}
