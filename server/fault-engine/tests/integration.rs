//! Integration tests for the fault engine: inbound JSON through the cascade
//! and the state mapper, end to end.

use chrono::{DateTime, TimeZone, Utc};

use fault_engine::normalize::normalize;
use fault_engine::types::TurbineState;
use fault_engine::{decide, next_state, Action, EngineConfig, HistoryWindow, InboundAlarm};

fn ingestion_time() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

/// Parse, normalize and store one alarm line, then classify it — the same
/// order the orchestrator uses.
fn ingest(
  history: &mut HistoryWindow,
  next_id: &mut u64,
  json: &str,
) -> (fault_engine::FaultEvent, fault_engine::Decision) {
  let raw: InboundAlarm = serde_json::from_str(json).unwrap();
  let mut event = normalize(&raw, ingestion_time()).unwrap();
  event.id = *next_id;
  *next_id += 1;
  history.push(event.clone());
  let decision = decide(&event, history, &EngineConfig::default());
  (event, decision)
}

#[test]
fn hot_em83_with_no_history_waits_for_cool_down() {
  let mut history = HistoryWindow::default();
  let mut id = 1;
  let json = r#"{
    "turbine_id": "WT-001",
    "code": "EM_83",
    "description": "EM-83 fault",
    "severity": "high",
    "occurred_at": "2025-03-10T08:00:00Z",
    "resettable": true,
    "temperature_c": 82.5
  }"#;

  let (event, decision) = ingest(&mut history, &mut id, json);
  assert_eq!(decision.action, Action::WaitCoolDown);
  assert!(decision.rationale.contains("82.5°C"));

  let state = next_state(
    TurbineState::Online,
    decision.action,
    &event.code,
    &EngineConfig::default(),
  );
  assert_eq!(state, TurbineState::Available);
}

#[test]
fn vibration_repeat_five_minutes_later_escalates_to_repair() {
  let mut history = HistoryWindow::default();
  let mut id = 1;
  let first = r#"{
    "turbine_id": "WT-002",
    "code": "GENERATOR_VIBRATION",
    "occurred_at": "2025-03-10T08:00:00Z"
  }"#;
  let second = r#"{
    "turbine_id": "WT-002",
    "code": "GENERATOR_VIBRATION",
    "occurred_at": "2025-03-10T08:05:00Z"
  }"#;

  let (_, d1) = ingest(&mut history, &mut id, first);
  assert_eq!(d1.action, Action::Reset);

  let (event, d2) = ingest(&mut history, &mut id, second);
  assert_eq!(d2.action, Action::Escalate);
  assert!(d2.rationale.contains("Oscillation detected"));

  let state = next_state(
    TurbineState::Online,
    d2.action,
    &event.code,
    &EngineConfig::default(),
  );
  assert_eq!(state, TurbineState::Repair);
}

#[test]
fn fourth_pitch_fault_within_24h_escalates() {
  let mut history = HistoryWindow::default();
  let mut id = 1;
  let times = ["00:00", "04:00", "08:00", "12:00"];

  let mut last = None;
  for t in times {
    let json = format!(
      r#"{{"turbine_id":"WT-003","code":"PITCH_SYSTEM_FAULT","occurred_at":"2025-03-10T{}:00Z"}}"#,
      t
    );
    last = Some(ingest(&mut history, &mut id, &json));
  }

  let (_, decision) = last.unwrap();
  assert_eq!(decision.action, Action::Escalate);
  assert!(decision.rationale.contains("4 occurrences in last 24 hours"));
}

#[test]
fn quiet_yaw_error_resets_but_lands_impacted() {
  let mut history = HistoryWindow::default();
  let mut id = 1;
  let json = r#"{
    "turbine_id": "WT-004",
    "code": "YAW_ERROR",
    "occurred_at": "2025-03-10T08:00:00Z"
  }"#;

  let (event, decision) = ingest(&mut history, &mut id, json);
  assert_eq!(decision.action, Action::Reset);

  // Derated code: operable, but at reduced output.
  let state = next_state(
    TurbineState::Online,
    decision.action,
    &event.code,
    &EngineConfig::default(),
  );
  assert_eq!(state, TurbineState::Impacted);
}

#[test]
fn deterministic_output_across_runs() {
  let json = r#"{
    "turbine_id": "WT-005",
    "code": "GEARBOX_TEMP_HIGH",
    "occurred_at": "2025-03-10T08:00:00Z",
    "temperature_c": 91.0
  }"#;

  let run = || {
    let mut history = HistoryWindow::default();
    let mut id = 1;
    let (_, decision) = ingest(&mut history, &mut id, json);
    serde_json::to_string(&decision).unwrap()
  };

  assert_eq!(run(), run(), "same inputs must produce identical output");
}

#[test]
fn unknown_fields_are_ignored() {
  let json = r#"{
    "turbine_id": "WT-006",
    "code": "EM_83",
    "some_unknown_field": "should be ignored",
    "another": 42
  }"#;

  let raw: InboundAlarm = serde_json::from_str(json).unwrap();
  assert!(normalize(&raw, ingestion_time()).is_ok());
}

#[test]
fn missing_required_field_gives_clear_error() {
  let json = r#"{"turbine_id": "", "code": "EM_83"}"#;
  let raw: InboundAlarm = serde_json::from_str(json).unwrap();
  let err = normalize(&raw, ingestion_time()).unwrap_err();
  assert!(
    err.to_string().contains("turbine_id"),
    "error should mention the field: {}",
    err
  );
}
