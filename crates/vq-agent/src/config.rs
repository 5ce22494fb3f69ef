//! Agent configuration, loadable from TOML.

use std::time::Duration;

use anyhow::{bail, ensure};
use serde::Deserialize;
use vq_canbus::AcquisitionConfig;

/// Top-level configuration for the VIN agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// SocketCAN interface names (e.g., "can0"). Bus `n` is the `n`th entry.
    pub interfaces: Vec<String>,
    /// Bus the active VIN query runs on.
    #[serde(default)]
    pub bus: u8,
    /// Acquisition budget in seconds.
    #[serde(default = "default_budget_secs")]
    pub budget_secs: f64,
    /// Longest a single poll waits for frames, in milliseconds.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

fn default_budget_secs() -> f64 {
    1.0
}

fn default_step_interval_ms() -> u64 {
    10
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.interfaces.is_empty(), "at least one CAN interface is required");
        ensure!(
            usize::from(self.bus) < self.interfaces.len(),
            "bus {} has no interface ({} configured)",
            self.bus,
            self.interfaces.len()
        );
        if !self.budget_secs.is_finite() || self.budget_secs < 0.0 {
            bail!("budget_secs must be a non-negative number, got {}", self.budget_secs);
        }
        ensure!(self.step_interval_ms > 0, "step_interval_ms must be positive");
        Ok(())
    }

    /// Acquisition parameters for the configured bus.
    pub fn acquisition(&self) -> AcquisitionConfig {
        AcquisitionConfig::new(self.bus)
            .with_budget_secs(self.budget_secs)
            .with_step_interval(Duration::from_millis(self.step_interval_ms))
    }
}
