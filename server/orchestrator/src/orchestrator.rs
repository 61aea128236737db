//! Orchestration core: classify fault events under per-turbine exclusion.
//!
//! Composes the decision cascade and the state mapper, then persists the
//! turbine state and a new recommendation. Two invocations for the same
//! turbine never interleave: a per-turbine async lock (created on demand)
//! serializes ingestion, reconciliation and operator operations, while
//! distinct turbines proceed in parallel. Turbine writes are additionally
//! version-conditional with bounded retry, covering out-of-band writers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use fault_engine::types::EventStatus;
use fault_engine::{catalog, decide, next_state, normalize};
use fault_engine::{
  Action, Decision, FaultEvent, HistoryWindow, InboundAlarm, Recommendation, Turbine, TurbineState,
};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::store::{Store, StoreError};

pub struct Orchestrator {
  store: Arc<dyn Store>,
  config: OrchestratorConfig,
  locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Orchestrator {
  pub fn new(store: Arc<dyn Store>, config: OrchestratorConfig) -> Self {
    Self {
      store,
      config,
      locks: StdMutex::new(HashMap::new()),
    }
  }

  pub fn config(&self) -> &OrchestratorConfig {
    &self.config
  }

  pub fn store(&self) -> &Arc<dyn Store> {
    &self.store
  }

  /// Validate and record an inbound alarm, then classify it.
  ///
  /// The event is appended to the store before classification, so the
  /// frequency windows naturally include it. Nothing is recorded for an
  /// unknown turbine.
  pub async fn ingest(&self, raw: &InboundAlarm) -> Result<Recommendation, OrchestratorError> {
    let event = normalize::normalize(raw, Utc::now())?;
    let _guard = self.lock_turbine(&event.turbine_id).await;
    self.require_turbine(&event.turbine_id).await?;
    let event = self.store.append_event(event).await?;
    self.classify_locked(&event).await
  }

  /// Classify an already-recorded fault event.
  pub async fn classify(&self, event: &FaultEvent) -> Result<Recommendation, OrchestratorError> {
    let _guard = self.lock_turbine(&event.turbine_id).await;
    self.classify_locked(event).await
  }

  /// Cascade + state mapping + persistence. Caller holds the turbine lock.
  pub(crate) async fn classify_locked(
    &self,
    event: &FaultEvent,
  ) -> Result<Recommendation, OrchestratorError> {
    self.require_turbine(&event.turbine_id).await?;

    // Widest window any cascade rule needs.
    let since = event.occurred_at - Duration::days(7);
    let window = HistoryWindow::new(self.store.events_since(&event.turbine_id, since).await?);
    let decision = decide(event, &window, &self.config.engine);

    let rec = self.apply_decision(event, decision, true).await?;
    tracing::info!(
      turbine_id = %event.turbine_id,
      code = %event.code,
      action = ?rec.action,
      "classified fault event"
    );
    Ok(rec)
  }

  /// Operator deferral: postpone the decision for a configured interval.
  /// The turbine is mapped through the Snooze row (→ Stopped) and the
  /// recommendation becomes eligible for reconciliation once the deferral
  /// elapses.
  pub async fn snooze(&self, event_id: u64) -> Result<Recommendation, OrchestratorError> {
    let event = self.load_event(event_id).await?;
    let _guard = self.lock_turbine(&event.turbine_id).await;
    let decision = Decision {
      action: Action::Snooze,
      rationale: format!(
        "Decision deferred by operator; re-evaluate after {} minutes.",
        self.config.snooze_minutes
      ),
    };
    self.apply_decision(&event, decision, false).await
  }

  /// Operator escalation to a human: no automation, turbine goes Impacted.
  pub async fn request_inspection(
    &self,
    event_id: u64,
  ) -> Result<Recommendation, OrchestratorError> {
    let event = self.load_event(event_id).await?;
    let _guard = self.lock_turbine(&event.turbine_id).await;
    let decision = Decision {
      action: Action::ManualInspection,
      rationale: "Manual inspection required.".to_string(),
    };
    self.apply_decision(&event, decision, false).await
  }

  /// Manual state write. Bypasses the mapper entirely but still updates
  /// `last_state_change` when the value actually changes.
  pub async fn override_state(
    &self,
    turbine_id: &str,
    state: TurbineState,
  ) -> Result<(), OrchestratorError> {
    let _guard = self.lock_turbine(turbine_id).await;
    let now = Utc::now();
    self
      .update_turbine(turbine_id, |turbine| {
        if turbine.state == state {
          return None;
        }
        let mut updated = turbine.clone();
        updated.state = state;
        updated.last_state_change = Some(now);
        Some(updated)
      })
      .await
  }

  /// Communication loss (external detection): park the turbine in `Netcom`,
  /// remembering the state it held so `restore_comms` can bring it back.
  pub async fn mark_comms_lost(&self, turbine_id: &str) -> Result<(), OrchestratorError> {
    let _guard = self.lock_turbine(turbine_id).await;
    let now = Utc::now();
    self
      .update_turbine(turbine_id, |turbine| {
        if turbine.state == TurbineState::Netcom {
          return None;
        }
        let mut updated = turbine.clone();
        updated.prior_state = Some(turbine.state);
        updated.state = TurbineState::Netcom;
        updated.last_state_change = Some(now);
        Some(updated)
      })
      .await
  }

  /// Communication restored (external trigger): leave `Netcom` for the
  /// remembered state, falling back to `Online` when none was recorded.
  pub async fn restore_comms(&self, turbine_id: &str) -> Result<(), OrchestratorError> {
    let _guard = self.lock_turbine(turbine_id).await;
    let now = Utc::now();
    self
      .update_turbine(turbine_id, |turbine| {
        if turbine.state != TurbineState::Netcom {
          return None;
        }
        let mut updated = turbine.clone();
        updated.state = turbine.prior_state.unwrap_or(TurbineState::Online);
        updated.prior_state = None;
        updated.last_state_change = Some(now);
        Some(updated)
      })
      .await
  }

  /// Event lifecycle: acknowledged events are no longer reconciled.
  pub async fn acknowledge(&self, event_id: u64) -> Result<(), OrchestratorError> {
    let event = self.load_event(event_id).await?;
    let _guard = self.lock_turbine(&event.turbine_id).await;
    self
      .store
      .set_event_status(event_id, EventStatus::Acknowledged)
      .await?;
    Ok(())
  }

  /// Event lifecycle: resolved events are no longer reconciled.
  pub async fn resolve(&self, event_id: u64) -> Result<(), OrchestratorError> {
    let event = self.load_event(event_id).await?;
    let _guard = self.lock_turbine(&event.turbine_id).await;
    self
      .store
      .set_event_status(event_id, EventStatus::Resolved)
      .await?;
    Ok(())
  }

  /// Apply a decision to the turbine and persist the recommendation.
  /// Caller holds the turbine lock.
  async fn apply_decision(
    &self,
    event: &FaultEvent,
    decision: Decision,
    is_automated: bool,
  ) -> Result<Recommendation, OrchestratorError> {
    let now = Utc::now();
    let engine = &self.config.engine;
    let action = decision.action;
    self
      .update_turbine(&event.turbine_id, |turbine| {
        let next = next_state(turbine.state, action, &event.code, engine);
        if next == turbine.state {
          return None;
        }
        let mut updated = turbine.clone();
        updated.state = next;
        updated.last_state_change = Some(now);
        Some(updated)
      })
      .await?;

    let rec = self.build_recommendation(event, decision, now, is_automated);
    self.store.insert_recommendation(rec.clone()).await?;
    Ok(rec)
  }

  /// Read-modify-write a turbine with version-conditional retry. `mutate`
  /// returns `None` when no write is needed.
  async fn update_turbine<F>(&self, turbine_id: &str, mutate: F) -> Result<(), OrchestratorError>
  where
    F: Fn(&Turbine) -> Option<Turbine>,
  {
    let mut attempt: u32 = 0;
    loop {
      let turbine = self.require_turbine(turbine_id).await?;
      let Some(updated) = mutate(&turbine) else {
        return Ok(());
      };
      match self.store.put_turbine(updated, turbine.version).await {
        Ok(()) => return Ok(()),
        Err(StoreError::Conflict(_)) if attempt < self.config.max_write_retries => {
          attempt += 1;
          tracing::debug!(turbine_id, attempt, "turbine write conflict; retrying");
        }
        Err(StoreError::Conflict(_)) => {
          return Err(OrchestratorError::WriteConflict {
            turbine_id: turbine_id.to_string(),
            attempts: attempt + 1,
          });
        }
        Err(e) => return Err(e.into()),
      }
    }
  }

  fn build_recommendation(
    &self,
    event: &FaultEvent,
    decision: Decision,
    now: DateTime<Utc>,
    is_automated: bool,
  ) -> Recommendation {
    let draft = catalog::draft_for(event, decision.action);
    let snooze_until = (decision.action == Action::Snooze)
      .then(|| now + Duration::minutes(self.config.snooze_minutes));
    Recommendation {
      id: Uuid::new_v4(),
      event_id: event.id,
      title: draft.title,
      description: draft.description,
      priority: draft.priority,
      action: decision.action,
      rationale: decision.rationale,
      snooze_until,
      action_items: draft.action_items,
      estimated_downtime_hours: draft.estimated_downtime_hours,
      is_automated,
      created_at: now,
      reconciled_at: None,
    }
  }

  async fn require_turbine(&self, turbine_id: &str) -> Result<Turbine, OrchestratorError> {
    self
      .store
      .get_turbine(turbine_id)
      .await?
      .ok_or_else(|| OrchestratorError::TurbineNotFound(turbine_id.to_string()))
  }

  async fn load_event(&self, event_id: u64) -> Result<FaultEvent, OrchestratorError> {
    self
      .store
      .get_event(event_id)
      .await?
      .ok_or(OrchestratorError::EventNotFound(event_id))
  }

  /// Per-turbine mutual exclusion. Locks are created on demand and shared
  /// across ingestion, reconciliation and operator operations.
  pub(crate) async fn lock_turbine(&self, turbine_id: &str) -> OwnedMutexGuard<()> {
    let lock = {
      let mut locks = self
        .locks
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
      locks
        .entry(turbine_id.to_string())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
    };
    lock.lock_owned().await
  }
}
