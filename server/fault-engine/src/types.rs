//! Core types for the fault engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// One inbound alarm from a turbine. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundAlarm {
  pub turbine_id: String,
  pub code: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub severity: Option<String>,
  /// RFC3339; defaults to ingestion time when absent.
  #[serde(default)]
  pub occurred_at: Option<String>,
  #[serde(default = "default_resettable")]
  pub resettable: bool,
  #[serde(default)]
  pub temperature_c: Option<f64>,
  #[serde(default)]
  pub note: Option<String>,
}

fn default_resettable() -> bool {
  true
}

// ---------------------------------------------------------------------------
// Severity enum (normalized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
      Self::Critical => "critical",
    }
  }

  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "low" => Some(Self::Low),
      "medium" | "med" => Some(Self::Medium),
      "high" => Some(Self::High),
      "critical" | "crit" => Some(Self::Critical),
      _ => None,
    }
  }
}

// ---------------------------------------------------------------------------
// Fault event (canonical, append-only)
// ---------------------------------------------------------------------------

/// Lifecycle of a recorded fault event. Only `Active` events are
/// re-evaluated by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  Active,
  Acknowledged,
  Resolved,
}

/// Canonical fault event after normalization + validation.
///
/// `id` is assigned by the store on append; 0 means "not yet stored".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultEvent {
  pub id: u64,
  pub turbine_id: String,
  pub code: String,
  pub description: String,
  pub severity: Severity,
  pub status: EventStatus,
  pub occurred_at: DateTime<Utc>,
  pub resettable: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature_c: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Actions and turbine states
// ---------------------------------------------------------------------------

/// Operational recommendation produced by the decision cascade (or by an
/// operator for Snooze / ManualInspection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  Reset,
  Escalate,
  WaitCoolDown,
  Snooze,
  ManualInspection,
}

/// Operational turbine state. `Netcom` is only entered through the
/// communication-loss override, never through the action mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurbineState {
  Online,
  Impacted,
  Available,
  Stopped,
  Repair,
  Netcom,
}

// ---------------------------------------------------------------------------
// Turbine (asset record)
// ---------------------------------------------------------------------------

/// Wind turbine asset. The engine owns `state`, `prior_state` and
/// `last_state_change`; the remaining attributes belong to the registry and
/// are read-only here. `version` backs conditional writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turbine {
  pub turbine_id: String,
  pub name: String,
  pub location: String,
  pub model: String,
  pub capacity_kw: f64,
  pub is_active: bool,
  pub state: TurbineState,
  /// State held before communication loss; set while in `Netcom`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub prior_state: Option<TurbineState>,
  pub last_state_change: Option<DateTime<Utc>>,
  #[serde(default)]
  pub version: u64,
}

impl Turbine {
  /// A registry entry with engine-owned fields at their initial values.
  pub fn new(turbine_id: &str, name: &str, location: &str, model: &str, capacity_kw: f64) -> Self {
    Self {
      turbine_id: turbine_id.to_string(),
      name: name.to_string(),
      location: location.to_string(),
      model: model.to_string(),
      capacity_kw,
      is_active: true,
      state: TurbineState::Online,
      prior_state: None,
      last_state_change: None,
      version: 0,
    }
  }
}

// ---------------------------------------------------------------------------
// Decision (cascade output)
// ---------------------------------------------------------------------------

/// What the cascade decided for one event and why. The rationale is a
/// generated string: identical inputs reproduce it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
  pub action: Action,
  pub rationale: String,
}

// ---------------------------------------------------------------------------
// Recommendation (persisted decision record)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  Medium,
  High,
  Urgent,
}

/// One decision record for a fault event. Reconciliation appends a new
/// record instead of mutating an old one, so the decision history of a
/// turbine can be reconstructed without re-running the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
  pub id: Uuid,
  /// The triggering fault event.
  pub event_id: u64,
  pub title: String,
  pub description: String,
  pub priority: Priority,
  pub action: Action,
  pub rationale: String,
  /// Present iff `action == Snooze`; strictly after `created_at`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub snooze_until: Option<DateTime<Utc>>,
  pub action_items: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub estimated_downtime_hours: Option<f64>,
  pub is_automated: bool,
  pub created_at: DateTime<Utc>,
  /// Set once the reconciliation loop has consumed a snoozed record.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reconciled_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input lines.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
