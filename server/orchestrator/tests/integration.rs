//! Integration tests: JSON in, classified recommendation and turbine state
//! out, including the timer-driven reconciliation path.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use fault_engine::types::{Action, EventStatus, FaultEvent, Priority, Recommendation, Severity, TurbineState};
use fault_engine::{InboundAlarm, Turbine};
use orchestrator::{
  FaultStore, MemoryStore, Orchestrator, OrchestratorConfig, ReconcileWorker,
  RecommendationStore, TurbineStore,
};

async fn fleet(turbines: &[&str]) -> (Arc<MemoryStore>, Arc<Orchestrator>) {
  let store = Arc::new(MemoryStore::new());
  for id in turbines {
    store
      .register_turbine(Turbine::new(id, id, "North Ridge", "V90-2.0", 2000.0))
      .await
      .unwrap();
  }
  let core = Arc::new(Orchestrator::new(
    store.clone(),
    OrchestratorConfig::default(),
  ));
  (store, core)
}

fn parse_alarm(json: &str) -> InboundAlarm {
  serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn hot_em83_event_waits_for_cool_down() {
  let (store, core) = fleet(&["WT-001"]).await;

  let rec = core
    .ingest(&parse_alarm(
      r#"{
        "turbine_id": "WT-001",
        "code": "EM_83",
        "description": "EM-83 fault",
        "severity": "high",
        "resettable": true,
        "temperature_c": 82.5
      }"#,
    ))
    .await
    .unwrap();

  assert_eq!(rec.action, Action::WaitCoolDown);
  assert!(rec.rationale.contains("82.5°C"));
  assert_eq!(rec.priority, Priority::High);
  assert_eq!(rec.title, "EM-83 Fault Code");

  let turbine = store.get_turbine("WT-001").await.unwrap().unwrap();
  assert_eq!(turbine.state, TurbineState::Available);
}

#[tokio::test]
async fn repeated_vibration_escalates_to_repair() {
  let (store, core) = fleet(&["WT-002"]).await;

  let first = core
    .ingest(&parse_alarm(
      r#"{"turbine_id":"WT-002","code":"GENERATOR_VIBRATION"}"#,
    ))
    .await
    .unwrap();
  assert_eq!(first.action, Action::Reset);

  // Same code again within the oscillation window.
  let second = core
    .ingest(&parse_alarm(
      r#"{"turbine_id":"WT-002","code":"GENERATOR_VIBRATION"}"#,
    ))
    .await
    .unwrap();
  assert_eq!(second.action, Action::Escalate);
  assert!(second.rationale.contains("Oscillation detected"));

  let turbine = store.get_turbine("WT-002").await.unwrap().unwrap();
  assert_eq!(turbine.state, TurbineState::Repair);
}

#[tokio::test]
async fn yaw_error_resets_into_derated_state() {
  let (store, core) = fleet(&["WT-003"]).await;

  let rec = core
    .ingest(&parse_alarm(r#"{"turbine_id":"WT-003","code":"YAW_ERROR"}"#))
    .await
    .unwrap();
  assert_eq!(rec.action, Action::Reset);

  let turbine = store.get_turbine("WT-003").await.unwrap().unwrap();
  assert_eq!(
    turbine.state,
    TurbineState::Impacted,
    "derated code must not return to Online"
  );
}

#[tokio::test]
async fn snooze_then_reconcile_produces_a_fresh_decision() {
  let (store, core) = fleet(&["WT-004"]).await;

  let rec = core
    .ingest(&parse_alarm(
      r#"{"turbine_id":"WT-004","code":"GRID_DISCONNECT"}"#,
    ))
    .await
    .unwrap();

  let snoozed = core.snooze(rec.event_id).await.unwrap();
  assert_eq!(snoozed.action, Action::Snooze);
  assert!(snoozed.snooze_until.unwrap() > snoozed.created_at);
  assert_eq!(
    store.get_turbine("WT-004").await.unwrap().unwrap().state,
    TurbineState::Stopped
  );

  // Deferral elapses; the turbine has been quiet, so the fresh decision is
  // a plain reset back to Online.
  let later = snoozed.snooze_until.unwrap() + Duration::minutes(1);
  assert_eq!(core.reconcile_due(later).await.unwrap(), 1);
  assert_eq!(
    store.get_turbine("WT-004").await.unwrap().unwrap().state,
    TurbineState::Online
  );

  // Full decision history retained for the event: reset, snooze, reset.
  let recs = store.recommendations_for_event(rec.event_id).await.unwrap();
  let actions: Vec<Action> = recs.iter().map(|r| r.action).collect();
  assert_eq!(actions, vec![Action::Reset, Action::Snooze, Action::Reset]);
}

#[tokio::test]
async fn reconcile_worker_consumes_overdue_entries() {
  let (store, _) = fleet(&["WT-005"]).await;

  // A snoozed recommendation already past its deadline, as if the process
  // had restarted after a long pause.
  let occurred = Utc::now() - Duration::minutes(45);
  let event = store
    .append_event(FaultEvent {
      id: 0,
      turbine_id: "WT-005".into(),
      code: "YAW_ERROR".into(),
      description: "stale".into(),
      severity: Severity::Medium,
      status: EventStatus::Active,
      occurred_at: occurred,
      resettable: true,
      temperature_c: None,
      note: None,
    })
    .await
    .unwrap();
  store
    .insert_recommendation(Recommendation {
      id: Uuid::new_v4(),
      event_id: event.id,
      title: "Yaw System Error".into(),
      description: "deferred".into(),
      priority: Priority::Medium,
      action: Action::Snooze,
      rationale: "Decision deferred by operator; re-evaluate after 20 minutes.".into(),
      snooze_until: Some(occurred + Duration::minutes(20)),
      action_items: vec![],
      estimated_downtime_hours: None,
      is_automated: false,
      created_at: occurred,
      reconciled_at: None,
    })
    .await
    .unwrap();

  let config = OrchestratorConfig {
    reconcile_interval_secs: 1,
    ..OrchestratorConfig::default()
  };
  let core = Arc::new(Orchestrator::new(store.clone(), config));

  let token = CancellationToken::new();
  let handle = tokio::spawn(ReconcileWorker::new(core.clone(), token.clone()).run());

  // Wait for the worker to pick the entry up.
  let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(10);
  loop {
    let recs = store.recommendations_for_event(event.id).await.unwrap();
    if recs.len() == 2 {
      let newest = recs.last().unwrap();
      assert_eq!(newest.action, Action::Reset);
      break;
    }
    assert!(
      tokio::time::Instant::now() < deadline,
      "worker did not reconcile in time"
    );
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
  }

  token.cancel();
  handle.await.unwrap();

  // Derated reset: the turbine parks in Impacted.
  assert_eq!(
    store.get_turbine("WT-005").await.unwrap().unwrap().state,
    TurbineState::Impacted
  );
}

#[tokio::test]
async fn three_pitch_faults_reset_but_the_fourth_escalates() {
  let (_, core) = fleet(&["WT-006"]).await;

  // Spread beyond the oscillation window by back-dating occurred_at.
  let base = Utc::now() - Duration::hours(13);
  let mut last = None;
  for i in 0..4 {
    let ts = (base + Duration::hours(4 * i)).to_rfc3339();
    let json = format!(
      r#"{{"turbine_id":"WT-006","code":"PITCH_SYSTEM_FAULT","occurred_at":"{}"}}"#,
      ts
    );
    last = Some(core.ingest(&parse_alarm(&json)).await.unwrap());
  }

  let fourth = last.unwrap();
  assert_eq!(fourth.action, Action::Escalate);
  assert!(fourth.rationale.contains("4 occurrences in last 24 hours"));
}

#[tokio::test]
async fn unknown_turbine_is_rejected() {
  let (_, core) = fleet(&[]).await;
  let err = core
    .ingest(&parse_alarm(r#"{"turbine_id":"WT-404","code":"EM_83"}"#))
    .await
    .unwrap_err();
  assert!(err.to_string().contains("turbine not found"));
}
