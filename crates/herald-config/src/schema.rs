use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use herald_telemetry::TelemetryConfig as TelemetrySettings;

/// Main Herald configuration
///
/// Configuration is loaded from (in priority order):
/// 1. `herald.jsonc` - JSON with comments
/// 2. `herald.json` - Standard JSON
/// 3. `herald.yml` / `herald.yaml` - YAML format
///
/// Also checks hidden variants (`.herald.*`) and `~/.config/herald/` for global config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub dispatch: DispatchSettings,

    #[serde(default)]
    pub runner: RunnerSettings,

    /// Logging settings. `level` accepts any `EnvFilter` directive and
    /// `RUST_LOG` overrides it when set.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl HeraldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runner.shutdown_grace_ms == 0 {
            bail!("runner.shutdown_grace_ms must be greater than zero");
        }
        if self.telemetry.level.trim().is_empty() {
            bail!("telemetry.level must not be empty");
        }
        Ok(())
    }
}

// ============================================================================
// Dispatch Configuration
// ============================================================================

/// Dispatch settings
///
/// # Example
///
/// ```yaml
/// dispatch:
///   default_delay_ms: 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Delay applied to dispatches that do not pass one (default: 0)
    #[serde(default)]
    pub default_delay_ms: u64,
}

impl DispatchSettings {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }
}

// ============================================================================
// Runner Configuration
// ============================================================================

/// Runner settings
///
/// # Example
///
/// ```yaml
/// runner:
///   drain_on_shutdown: true
///   shutdown_grace_ms: 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Run delayed calls still pending at shutdown (default: true)
    #[serde(default = "default_drain_on_shutdown")]
    pub drain_on_shutdown: bool,

    /// How long shutdown waits for the runner (default: 5000)
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl RunnerSettings {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            drain_on_shutdown: default_drain_on_shutdown(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

fn default_drain_on_shutdown() -> bool {
    true
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}
