//! Orchestrator configuration with sane defaults.

use fault_engine::EngineConfig;

/// Tunables for the orchestration shell, wrapping the cascade thresholds.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
  /// Decision cascade and state-mapping thresholds.
  pub engine: EngineConfig,
  /// Deferral applied when an operator snoozes a decision, in minutes.
  pub snooze_minutes: i64,
  /// Reconciliation tick interval, in seconds.
  pub reconcile_interval_secs: u64,
  /// Conditional turbine writes are retried this many times on conflict
  /// before the caller sees a transient failure.
  pub max_write_retries: u32,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      engine: EngineConfig::default(),
      snooze_minutes: 20,
      reconcile_interval_secs: 60,
      max_write_retries: 3,
    }
  }
}
