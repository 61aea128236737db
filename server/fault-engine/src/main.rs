//! Binary entrypoint: replay alarm JSON lines through the decision cascade.
//!
//! Each input line is an InboundAlarm. Events are appended to an in-memory
//! per-run history as they arrive, so later lines are classified against
//! earlier ones exactly as the orchestrator would classify them live.
//! Output lines are either a decision record or an ErrorOutput when input
//! validation fails. Useful for auditing decisions offline.

use std::io::{self, BufRead, Write};

use chrono::Utc;
use serde::Serialize;

use fault_engine::types::ErrorOutput;
use fault_engine::{decide, EngineConfig, HistoryWindow, InboundAlarm};

#[derive(Serialize)]
struct ReplayOutput<'a> {
  turbine_id: &'a str,
  code: &'a str,
  occurred_at: String,
  action: fault_engine::Action,
  rationale: &'a str,
}

fn main() {
  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  let config = EngineConfig::default();
  let mut history = HistoryWindow::default();
  let mut next_id: u64 = 1;

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        let _ = writeln!(io::stderr(), "fault-replay: read error: {}", e);
        std::process::exit(1);
      }
    };

    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let raw: InboundAlarm = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        let err = ErrorOutput::new(format!("json parse: {}", e));
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    let mut event = match fault_engine::normalize::normalize(&raw, Utc::now()) {
      Ok(ev) => ev,
      Err(e) => {
        let err = match &e {
          fault_engine::EngineError::Validation { field, reason } => {
            ErrorOutput::new(reason.clone()).with_field(field.clone())
          }
          _ => ErrorOutput::new(e.to_string()),
        };
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    // Record the event first, then classify — the live ingestion order.
    event.id = next_id;
    next_id += 1;
    history.push(event.clone());

    let decision = decide(&event, &history, &config);
    let record = ReplayOutput {
      turbine_id: &event.turbine_id,
      code: &event.code,
      occurred_at: event.occurred_at.to_rfc3339(),
      action: decision.action,
      rationale: &decision.rationale,
    };
    let _ = serde_json::to_writer(&mut out, &record);
    let _ = writeln!(out);
  }

  let _ = out.flush();
}
