//! Per-code recommendation content: titles, action items, downtime estimates.

use crate::types::{Action, FaultEvent, Priority, Severity};

/// Catalog output used to fill a persisted recommendation.
#[derive(Debug, Clone)]
pub struct RecommendationDraft {
  pub title: String,
  pub description: String,
  pub priority: Priority,
  pub action_items: Vec<String>,
  pub estimated_downtime_hours: Option<f64>,
}

struct CodeRule {
  title: &'static str,
  description: &'static str,
  priority: Priority,
  action_items: &'static [&'static str],
  estimated_downtime_hours: f64,
}

fn code_rule(code: &str) -> Option<CodeRule> {
  let rule = match code {
    "GEARBOX_TEMP_HIGH" => CodeRule {
      title: "Gearbox Temperature Critical",
      description: "Gearbox temperature exceeds safe operating limits. Immediate inspection required.",
      priority: Priority::Urgent,
      action_items: &[
        "Reduce turbine load immediately",
        "Schedule emergency maintenance inspection",
        "Check lubrication system",
        "Monitor temperature every 15 minutes",
      ],
      estimated_downtime_hours: 4.0,
    },
    "GENERATOR_VIBRATION" => CodeRule {
      title: "Generator Vibration Detected",
      description: "Abnormal vibration patterns detected in generator. May indicate bearing issues.",
      priority: Priority::High,
      action_items: &[
        "Schedule vibration analysis",
        "Inspect generator bearings",
        "Check alignment",
        "Review maintenance logs",
      ],
      estimated_downtime_hours: 8.0,
    },
    "PITCH_SYSTEM_FAULT" => CodeRule {
      title: "Pitch System Malfunction",
      description: "Blade pitch control system is not responding correctly.",
      priority: Priority::High,
      action_items: &[
        "Stop turbine operation",
        "Inspect pitch motors and drives",
        "Check hydraulic system pressure",
        "Test backup pitch system",
      ],
      estimated_downtime_hours: 12.0,
    },
    "YAW_ERROR" => CodeRule {
      title: "Yaw System Error",
      description: "Yaw system unable to align turbine with wind direction.",
      priority: Priority::Medium,
      action_items: &[
        "Inspect yaw motors",
        "Check yaw brake system",
        "Calibrate wind direction sensors",
        "Verify control system signals",
      ],
      estimated_downtime_hours: 6.0,
    },
    "GRID_DISCONNECT" => CodeRule {
      title: "Grid Connection Lost",
      description: "Turbine disconnected from power grid.",
      priority: Priority::Urgent,
      action_items: &[
        "Check grid voltage and frequency",
        "Inspect circuit breakers",
        "Verify protection relay settings",
        "Contact grid operator",
      ],
      estimated_downtime_hours: 2.0,
    },
    "LOW_WIND_SPEED" => CodeRule {
      title: "Low Wind Speed",
      description: "Wind speed below cut-in threshold.",
      priority: Priority::Low,
      action_items: &[
        "Monitor wind conditions",
        "Verify anemometer readings",
        "Check for ice buildup on blades",
      ],
      estimated_downtime_hours: 0.0,
    },
    "EM_83" => CodeRule {
      title: "EM-83 Fault Code",
      description: "Critical system fault detected.",
      priority: Priority::Urgent,
      action_items: &[
        "Immediate system inspection required",
        "Check system diagnostics",
        "Review fault logs",
      ],
      estimated_downtime_hours: 4.0,
    },
    _ => return None,
  };
  Some(rule)
}

/// Raise the catalog priority to match the severity of the chosen action.
fn priority_for_action(action: Action, default: Priority) -> Priority {
  match action {
    Action::Escalate => Priority::Urgent,
    Action::WaitCoolDown => Priority::High,
    Action::Snooze => Priority::Medium,
    _ => default,
  }
}

/// Build recommendation content for an event and its decided action: the
/// per-code catalog entry when one exists, otherwise a generic draft keyed
/// by event severity.
pub fn draft_for(event: &FaultEvent, action: Action) -> RecommendationDraft {
  match code_rule(&event.code) {
    Some(rule) => RecommendationDraft {
      title: rule.title.to_string(),
      description: rule.description.to_string(),
      priority: priority_for_action(action, rule.priority),
      action_items: rule.action_items.iter().map(|s| s.to_string()).collect(),
      estimated_downtime_hours: Some(rule.estimated_downtime_hours),
    },
    None => generic_draft(event, action),
  }
}

fn generic_draft(event: &FaultEvent, action: Action) -> RecommendationDraft {
  let (priority, action_items, downtime): (Priority, &[&str], f64) = match event.severity {
    Severity::Critical => (
      Priority::Urgent,
      &[
        "Stop turbine operation immediately",
        "Dispatch emergency maintenance team",
        "Perform safety inspection",
        "Contact manufacturer support",
      ],
      24.0,
    ),
    Severity::High => (
      Priority::High,
      &[
        "Schedule urgent maintenance inspection",
        "Review recent operational data",
        "Check related system components",
        "Reduce turbine load if safe",
      ],
      12.0,
    ),
    Severity::Medium => (
      Priority::Medium,
      &[
        "Schedule routine maintenance inspection",
        "Monitor alarm frequency",
        "Review maintenance history",
        "Check sensor calibration",
      ],
      4.0,
    ),
    Severity::Low => (
      Priority::Low,
      &[
        "Log alarm for trending analysis",
        "Monitor during next scheduled maintenance",
        "Verify sensor readings",
      ],
      0.0,
    ),
  };

  RecommendationDraft {
    title: format!("Generic Recommendation for {}", event.code),
    description: format!(
      "Standard response for {} severity alarm: {}",
      event.severity.as_str(),
      event.description
    ),
    priority: priority_for_action(action, priority),
    action_items: action_items.iter().map(|s| s.to_string()).collect(),
    estimated_downtime_hours: Some(downtime),
  }
}
