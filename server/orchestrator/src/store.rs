//! Store traits the orchestrator consumes, plus an in-memory implementation.
//!
//! The durable store is an external collaborator; the core only depends on
//! these seams. `MemoryStore` backs the driver binary and the tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use fault_engine::types::{EventStatus, FaultEvent, Recommendation, Turbine};

#[derive(Debug, Error)]
pub enum StoreError {
  /// Conditional write lost against a concurrent writer; safe to retry.
  #[error("version conflict on turbine {0}")]
  Conflict(String),

  #[error("store backend: {0}")]
  Backend(String),
}

/// Turbine records: registry reads plus engine-owned state writes.
#[async_trait]
pub trait TurbineStore: Send + Sync {
  async fn register_turbine(&self, turbine: Turbine) -> Result<(), StoreError>;

  async fn get_turbine(&self, turbine_id: &str) -> Result<Option<Turbine>, StoreError>;

  /// Conditional write: succeeds only if the stored version still equals
  /// `expected_version`, then bumps the version.
  async fn put_turbine(&self, turbine: Turbine, expected_version: u64) -> Result<(), StoreError>;
}

/// Append-only fault event log with time-windowed reads.
#[async_trait]
pub trait FaultStore: Send + Sync {
  /// Append an event, assigning its id. Returns the stored event.
  async fn append_event(&self, event: FaultEvent) -> Result<FaultEvent, StoreError>;

  async fn get_event(&self, id: u64) -> Result<Option<FaultEvent>, StoreError>;

  /// All events for a turbine since `since` (inclusive), ascending by
  /// occurrence time.
  async fn events_since(
    &self,
    turbine_id: &str,
    since: DateTime<Utc>,
  ) -> Result<Vec<FaultEvent>, StoreError>;

  async fn set_event_status(&self, id: u64, status: EventStatus) -> Result<(), StoreError>;
}

/// Recommendation records, append-only per decision.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
  async fn insert_recommendation(&self, rec: Recommendation) -> Result<(), StoreError>;

  async fn get_recommendation(&self, id: Uuid) -> Result<Option<Recommendation>, StoreError>;

  /// All recommendations for one event, oldest first.
  async fn recommendations_for_event(
    &self,
    event_id: u64,
  ) -> Result<Vec<Recommendation>, StoreError>;

  /// Snoozed recommendations whose deferral has elapsed and that have not
  /// been consumed by reconciliation yet.
  async fn due_snoozed(&self, now: DateTime<Utc>) -> Result<Vec<Recommendation>, StoreError>;

  /// Stamp a recommendation as consumed by reconciliation.
  async fn mark_reconciled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Everything the orchestrator needs from a backing store.
pub trait Store: TurbineStore + FaultStore + RecommendationStore {}

impl<T: TurbineStore + FaultStore + RecommendationStore> Store for T {}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
  turbines: HashMap<String, Turbine>,
  events: BTreeMap<u64, FaultEvent>,
  next_event_id: u64,
  recommendations: Vec<Recommendation>,
}

/// Thread-safe in-memory store for the driver binary and tests.
#[derive(Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
    self
      .inner
      .read()
      .map_err(|_| StoreError::Backend("store lock poisoned".into()))
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
    self
      .inner
      .write()
      .map_err(|_| StoreError::Backend("store lock poisoned".into()))
  }
}

#[async_trait]
impl TurbineStore for MemoryStore {
  async fn register_turbine(&self, turbine: Turbine) -> Result<(), StoreError> {
    let mut inner = self.write()?;
    inner.turbines.insert(turbine.turbine_id.clone(), turbine);
    Ok(())
  }

  async fn get_turbine(&self, turbine_id: &str) -> Result<Option<Turbine>, StoreError> {
    Ok(self.read()?.turbines.get(turbine_id).cloned())
  }

  async fn put_turbine(&self, turbine: Turbine, expected_version: u64) -> Result<(), StoreError> {
    let mut inner = self.write()?;
    let existing = inner
      .turbines
      .get_mut(&turbine.turbine_id)
      .ok_or_else(|| StoreError::Backend(format!("unknown turbine {}", turbine.turbine_id)))?;
    if existing.version != expected_version {
      return Err(StoreError::Conflict(turbine.turbine_id.clone()));
    }
    let mut updated = turbine;
    updated.version = expected_version + 1;
    *existing = updated;
    Ok(())
  }
}

#[async_trait]
impl FaultStore for MemoryStore {
  async fn append_event(&self, event: FaultEvent) -> Result<FaultEvent, StoreError> {
    let mut inner = self.write()?;
    inner.next_event_id += 1;
    let mut stored = event;
    stored.id = inner.next_event_id;
    inner.events.insert(stored.id, stored.clone());
    Ok(stored)
  }

  async fn get_event(&self, id: u64) -> Result<Option<FaultEvent>, StoreError> {
    Ok(self.read()?.events.get(&id).cloned())
  }

  async fn events_since(
    &self,
    turbine_id: &str,
    since: DateTime<Utc>,
  ) -> Result<Vec<FaultEvent>, StoreError> {
    let inner = self.read()?;
    let mut events: Vec<FaultEvent> = inner
      .events
      .values()
      .filter(|e| e.turbine_id == turbine_id && e.occurred_at >= since)
      .cloned()
      .collect();
    events.sort_by_key(|e| e.occurred_at);
    Ok(events)
  }

  async fn set_event_status(&self, id: u64, status: EventStatus) -> Result<(), StoreError> {
    let mut inner = self.write()?;
    let event = inner
      .events
      .get_mut(&id)
      .ok_or_else(|| StoreError::Backend(format!("unknown event {}", id)))?;
    event.status = status;
    Ok(())
  }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
  async fn insert_recommendation(&self, rec: Recommendation) -> Result<(), StoreError> {
    self.write()?.recommendations.push(rec);
    Ok(())
  }

  async fn get_recommendation(&self, id: Uuid) -> Result<Option<Recommendation>, StoreError> {
    Ok(
      self
        .read()?
        .recommendations
        .iter()
        .find(|r| r.id == id)
        .cloned(),
    )
  }

  async fn recommendations_for_event(
    &self,
    event_id: u64,
  ) -> Result<Vec<Recommendation>, StoreError> {
    Ok(
      self
        .read()?
        .recommendations
        .iter()
        .filter(|r| r.event_id == event_id)
        .cloned()
        .collect(),
    )
  }

  async fn due_snoozed(&self, now: DateTime<Utc>) -> Result<Vec<Recommendation>, StoreError> {
    Ok(
      self
        .read()?
        .recommendations
        .iter()
        .filter(|r| {
          r.action == fault_engine::Action::Snooze
            && r.reconciled_at.is_none()
            && r.snooze_until.is_some_and(|until| until <= now)
        })
        .cloned()
        .collect(),
    )
  }

  async fn mark_reconciled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
    let mut inner = self.write()?;
    let rec = inner
      .recommendations
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or_else(|| StoreError::Backend(format!("unknown recommendation {}", id)))?;
    rec.reconciled_at = Some(at);
    Ok(())
  }
}

/// A registered turbine in its initial `Online` state, for seeding.
pub fn seed_turbine(turbine_id: &str, name: &str) -> Turbine {
  Turbine::new(turbine_id, name, "unknown", "unknown", 0.0)
}
