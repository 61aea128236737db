//! Reconciliation: re-evaluate snoozed recommendations once they fall due.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use fault_engine::types::{EventStatus, FaultEvent, Recommendation};

use crate::error::OrchestratorError;
use crate::orchestrator::Orchestrator;

impl Orchestrator {
  /// Re-evaluate every snoozed recommendation whose deferral has elapsed.
  ///
  /// Each entry is re-classified with a synthesized event that carries the
  /// original turbine/code but `occurred_at = now`, so the cascade sees
  /// history that arrived during the deferral. Entries are consumed at most
  /// once; a failing entry is logged and left eligible for the next tick.
  /// Returns the number of entries actually reconciled.
  pub async fn reconcile_due(&self, now: DateTime<Utc>) -> Result<usize, OrchestratorError> {
    let due = self.store().due_snoozed(now).await?;
    if due.is_empty() {
      tracing::debug!("no snoozed recommendations due");
      return Ok(0);
    }

    tracing::info!(count = due.len(), "found due snoozed recommendations");
    let mut reconciled = 0;
    for entry in due {
      match self.reconcile_one(&entry, now).await {
        Ok(true) => reconciled += 1,
        Ok(false) => {}
        Err(e) => {
          tracing::warn!(
            recommendation_id = %entry.id,
            error = %e,
            "failed to reconcile; entry stays eligible for the next tick"
          );
        }
      }
    }
    Ok(reconciled)
  }

  /// Returns Ok(true) when the entry was re-classified, Ok(false) when it
  /// was skipped (already consumed, or its event left the Active state).
  async fn reconcile_one(
    &self,
    entry: &Recommendation,
    now: DateTime<Utc>,
  ) -> Result<bool, OrchestratorError> {
    let event = self
      .store()
      .get_event(entry.event_id)
      .await?
      .ok_or(OrchestratorError::EventNotFound(entry.event_id))?;

    let _guard = self.lock_turbine(&event.turbine_id).await;

    // Re-read event and entry under the lock; a concurrent caller may have
    // resolved the event or consumed the entry in the meantime.
    let event = self
      .store()
      .get_event(entry.event_id)
      .await?
      .ok_or(OrchestratorError::EventNotFound(entry.event_id))?;
    let current = self.store().get_recommendation(entry.id).await?;
    match current {
      Some(rec) if rec.reconciled_at.is_none() => {}
      _ => return Ok(false),
    }

    if event.status != EventStatus::Active {
      tracing::info!(
        event_id = event.id,
        status = ?event.status,
        "event no longer active; consuming snoozed recommendation without re-evaluation"
      );
      self.store().mark_reconciled(entry.id, now).await?;
      return Ok(false);
    }

    tracing::info!(
      event_id = event.id,
      code = %event.code,
      "re-evaluating snoozed fault event"
    );

    // Same turbine, code and readings; current-time context. Never stored,
    // so it adds no occurrence to the frequency windows.
    let synthesized = FaultEvent {
      occurred_at: now,
      ..event.clone()
    };
    let new_rec = self.classify_locked(&synthesized).await?;
    self.store().mark_reconciled(entry.id, now).await?;

    tracing::info!(
      recommendation_id = %new_rec.id,
      action = ?new_rec.action,
      "snoozed recommendation reconciled"
    );
    Ok(true)
  }
}

/// Timer-driven wrapper around [`Orchestrator::reconcile_due`].
///
/// Runs until the cancellation token fires; an in-flight tick completes
/// before the worker exits, and no further tick is scheduled.
pub struct ReconcileWorker {
  orchestrator: Arc<Orchestrator>,
  token: CancellationToken,
}

impl ReconcileWorker {
  pub fn new(orchestrator: Arc<Orchestrator>, token: CancellationToken) -> Self {
    Self {
      orchestrator,
      token,
    }
  }

  pub async fn run(self) {
    let period =
      std::time::Duration::from_secs(self.orchestrator.config().reconcile_interval_secs);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(period_secs = period.as_secs(), "reconcile worker started");
    loop {
      tokio::select! {
        _ = self.token.cancelled() => {
          tracing::info!("reconcile worker stopped");
          break;
        }
        _ = ticker.tick() => {
          match self.orchestrator.reconcile_due(Utc::now()).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "reconciled snoozed recommendations"),
            Err(e) => tracing::error!(error = %e, "reconcile tick failed"),
          }
        }
      }
    }
  }
}
