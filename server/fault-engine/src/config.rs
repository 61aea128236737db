//! Engine configuration with sane defaults.

/// Tunable thresholds for the decision cascade and state mapping.
///
/// Injected into `decide` / `next_state` so tests can vary thresholds
/// without touching rule logic.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Trailing window for oscillation detection, in minutes.
  pub oscillation_window_minutes: i64,
  /// Same-code occurrences in 24h that force escalation.
  pub freq_24h_threshold: usize,
  /// Same-code occurrences in 7 days that force escalation.
  pub freq_7d_threshold: usize,
  /// Cool-down trigger: readings strictly above this escalate to WaitCoolDown.
  pub temp_threshold_c: f64,
  /// Codes for which the temperature rule applies at all.
  pub temp_critical_codes: Vec<String>,
  /// Codes that leave the turbine operable at reduced output: a Reset on
  /// one of these maps to `Impacted` instead of `Online`.
  pub derated_codes: Vec<String>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      oscillation_window_minutes: 10,
      freq_24h_threshold: 4,
      freq_7d_threshold: 8,
      temp_threshold_c: 75.0,
      temp_critical_codes: vec![
        "EM_83".into(),
        "TEMP_HIGH".into(),
        "GEARBOX_OVERHEAT".into(),
        "GEARBOX_TEMP_HIGH".into(),
      ],
      derated_codes: vec!["YAW_ERROR".into(), "LOW_WIND_SPEED".into()],
    }
  }
}

impl EngineConfig {
  pub fn is_temp_critical(&self, code: &str) -> bool {
    self.temp_critical_codes.iter().any(|c| c == code)
  }

  pub fn is_derated(&self, code: &str) -> bool {
    self.derated_codes.iter().any(|c| c == code)
  }
}
