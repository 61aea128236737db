//! Normalize inbound alarms into canonical FaultEvent models.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::types::*;

/// Parse and validate an InboundAlarm into a canonical FaultEvent.
///
/// `now` fills `occurred_at` when the caller did not provide one. The
/// returned event carries id 0 until the store assigns one on append.
pub fn normalize(raw: &InboundAlarm, now: DateTime<Utc>) -> Result<FaultEvent, EngineError> {
  if raw.turbine_id.is_empty() {
    return Err(EngineError::validation("turbine_id", "must not be empty"));
  }
  if raw.code.is_empty() {
    return Err(EngineError::validation("code", "must not be empty"));
  }

  let occurred_at: DateTime<Utc> = match &raw.occurred_at {
    Some(s) => DateTime::parse_from_rfc3339(s)
      .map_err(|e| EngineError::validation("occurred_at", &format!("invalid RFC3339: {}", e)))?
      .with_timezone(&Utc),
    None => now,
  };

  let severity = match &raw.severity {
    Some(s) => Severity::from_str_loose(s)
      .ok_or_else(|| EngineError::validation("severity", "expected low|medium|high|critical"))?,
    None => Severity::Medium,
  };

  if let Some(t) = raw.temperature_c {
    if !t.is_finite() {
      return Err(EngineError::validation("temperature_c", "must be finite"));
    }
  }

  Ok(FaultEvent {
    id: 0,
    turbine_id: raw.turbine_id.clone(),
    code: raw.code.clone(),
    description: raw.description.clone(),
    severity,
    status: EventStatus::Active,
    occurred_at,
    resettable: raw.resettable,
    temperature_c: raw.temperature_c,
    note: raw.note.clone(),
  })
}
