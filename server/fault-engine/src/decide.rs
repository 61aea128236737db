//! The decision cascade: classify one fault event against recent history.

use chrono::Duration;

use crate::config::EngineConfig;
use crate::history::EventHistory;
use crate::types::{Action, Decision, FaultEvent};

/// Classify `event` against prior history for the same turbine.
///
/// Strict priority cascade; the first matching rule wins:
///
/// 1. Not resettable            → Escalate
/// 2. Oscillation (same code within the trailing window) → Escalate
/// 3. High frequency (24h threshold, then 7d threshold)  → Escalate
/// 4. Over-temperature on a temp-critical code           → WaitCoolDown
/// 5. Default                   → Reset
///
/// Pure: no mutation, no I/O beyond the history reads. The same event and
/// history always produce the same action and rationale string.
pub fn decide(event: &FaultEvent, history: &dyn EventHistory, config: &EngineConfig) -> Decision {
  // Rule 1: non-resettable faults always escalate.
  if !event.resettable {
    return Decision {
      action: Action::Escalate,
      rationale: "Alarm is not resettable and requires manual intervention.".to_string(),
    };
  }

  // Rule 2: oscillation. Lower bound exclusive, upper bound inclusive; the
  // event itself is excluded by id.
  let cutoff = event.occurred_at - Duration::minutes(config.oscillation_window_minutes);
  let prior = history
    .same_code_since(&event.turbine_id, &event.code, cutoff)
    .into_iter()
    .filter(|e| e.id != event.id && e.occurred_at > cutoff && e.occurred_at <= event.occurred_at)
    .next_back();
  if let Some(prev) = prior {
    return Decision {
      action: Action::Escalate,
      rationale: format!(
        "Oscillation detected: {} occurred at {} and again at {} within a {}-minute window.",
        event.code,
        prev.occurred_at.to_rfc3339(),
        event.occurred_at.to_rfc3339(),
        config.oscillation_window_minutes
      ),
    };
  }

  // Rule 3: frequency, 24h window first; checks short-circuit.
  let count_24h = count_same_code(event, history, Duration::hours(24));
  if count_24h >= config.freq_24h_threshold {
    return Decision {
      action: Action::Escalate,
      rationale: format!(
        "High frequency: {} occurrences in last 24 hours (threshold: {}).",
        count_24h, config.freq_24h_threshold
      ),
    };
  }
  let count_7d = count_same_code(event, history, Duration::days(7));
  if count_7d >= config.freq_7d_threshold {
    return Decision {
      action: Action::Escalate,
      rationale: format!(
        "High frequency: {} occurrences in last 7 days (threshold: {}).",
        count_7d, config.freq_7d_threshold
      ),
    };
  }

  // Rule 4: over-temperature on temp-critical codes only. Strictly greater:
  // a reading exactly at the threshold does not trigger.
  if config.is_temp_critical(&event.code) {
    if let Some(reading) = event.temperature_c {
      if reading > config.temp_threshold_c {
        return Decision {
          action: Action::WaitCoolDown,
          rationale: format!(
            "Temperature {}°C exceeds threshold {}°C. Wait for cool-down.",
            reading, config.temp_threshold_c
          ),
        };
      }
    }
  }

  // Rule 5: default.
  Decision {
    action: Action::Reset,
    rationale: "Conditions allow for automatic reset. No escalation required.".to_string(),
  }
}

/// Same-code occurrences in the trailing window, including the triggering
/// event: stored events inside the window are counted as-is, and the event
/// itself is added when the store does not already hold it (matching
/// ingestion, which appends before classifying). A synthesized re-evaluation
/// event reuses its original's id and so never counts twice.
fn count_same_code(event: &FaultEvent, history: &dyn EventHistory, window: Duration) -> usize {
  let since = event.occurred_at - window;
  let in_window: Vec<_> = history
    .same_code_since(&event.turbine_id, &event.code, since)
    .into_iter()
    .filter(|e| e.occurred_at <= event.occurred_at)
    .collect();
  let already_stored = in_window.iter().any(|e| e.id == event.id);
  in_window.len() + usize::from(!already_stored)
}
