//! Read-only access to prior fault events for one turbine.

use chrono::{DateTime, Utc};

use crate::types::FaultEvent;

/// What the decision cascade is allowed to see: prior events for a turbine,
/// ascending by occurrence time, window boundaries inclusive.
///
/// Implementations must be cheap, synchronous reads; callers backed by a
/// remote store prefetch into a [`HistoryWindow`] first.
pub trait EventHistory {
  /// Events with the given fault code since `since` (inclusive), ascending.
  fn same_code_since(&self, turbine_id: &str, code: &str, since: DateTime<Utc>)
    -> Vec<FaultEvent>;

  /// Events of any code since `since` (inclusive), ascending.
  fn since(&self, turbine_id: &str, since: DateTime<Utc>) -> Vec<FaultEvent>;
}

/// A prefetched slice of history, typically everything for one turbine in
/// the widest window any cascade rule needs (7 days).
#[derive(Debug, Clone, Default)]
pub struct HistoryWindow {
  events: Vec<FaultEvent>,
}

impl HistoryWindow {
  /// Build from events sorted ascending by `occurred_at`. Unsorted input is
  /// sorted here so store implementations don't have to guarantee order.
  pub fn new(mut events: Vec<FaultEvent>) -> Self {
    events.sort_by_key(|e| e.occurred_at);
    Self { events }
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  pub fn push(&mut self, event: FaultEvent) {
    self.events.push(event);
    self.events.sort_by_key(|e| e.occurred_at);
  }
}

impl EventHistory for HistoryWindow {
  fn same_code_since(
    &self,
    turbine_id: &str,
    code: &str,
    since: DateTime<Utc>,
  ) -> Vec<FaultEvent> {
    self
      .events
      .iter()
      .filter(|e| e.turbine_id == turbine_id && e.code == code && e.occurred_at >= since)
      .cloned()
      .collect()
  }

  fn since(&self, turbine_id: &str, since: DateTime<Utc>) -> Vec<FaultEvent> {
    self
      .events
      .iter()
      .filter(|e| e.turbine_id == turbine_id && e.occurred_at >= since)
      .cloned()
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{EventStatus, Severity};
  use chrono::TimeZone;

  fn event(id: u64, code: &str, minute: u32) -> FaultEvent {
    FaultEvent {
      id,
      turbine_id: "WT-001".into(),
      code: code.into(),
      description: String::new(),
      severity: Severity::Medium,
      status: EventStatus::Active,
      occurred_at: Utc.with_ymd_and_hms(2025, 3, 10, 8, minute, 0).unwrap(),
      resettable: true,
      temperature_c: None,
      note: None,
    }
  }

  #[test]
  fn filters_by_code_and_window() {
    let window = HistoryWindow::new(vec![
      event(1, "YAW_ERROR", 0),
      event(2, "EM_83", 5),
      event(3, "YAW_ERROR", 20),
    ]);

    let since = Utc.with_ymd_and_hms(2025, 3, 10, 8, 5, 0).unwrap();
    let hits = window.same_code_since("WT-001", "YAW_ERROR", since);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 3);

    let all = window.since("WT-001", since);
    assert_eq!(all.len(), 2);
  }

  #[test]
  fn since_boundary_is_inclusive() {
    let window = HistoryWindow::new(vec![event(1, "EM_83", 5)]);
    let since = Utc.with_ymd_and_hms(2025, 3, 10, 8, 5, 0).unwrap();
    assert_eq!(window.same_code_since("WT-001", "EM_83", since).len(), 1);
  }

  #[test]
  fn sorts_unsorted_input() {
    let window = HistoryWindow::new(vec![event(2, "EM_83", 30), event(1, "EM_83", 10)]);
    let since = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
    let hits = window.same_code_since("WT-001", "EM_83", since);
    assert_eq!(hits[0].id, 1);
    assert_eq!(hits[1].id, 2);
  }

  #[test]
  fn other_turbines_are_invisible() {
    let mut foreign = event(1, "EM_83", 5);
    foreign.turbine_id = "WT-002".into();
    let window = HistoryWindow::new(vec![foreign]);
    let since = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
    assert!(window.same_code_since("WT-001", "EM_83", since).is_empty());
  }
}
