//! Binary entrypoint: JSON-lines driver over an in-memory store.
//!
//! Each input line is either a turbine registration (has `capacity_kw`) or
//! an inbound alarm. Alarms are ingested through the orchestrator; output
//! lines are the resulting Recommendation, or an ErrorOutput when input is
//! rejected. The reconciliation worker runs in the background and is shut
//! down gracefully on stdin EOF.

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use fault_engine::types::ErrorOutput;
use fault_engine::{EngineError, InboundAlarm, Turbine};
use orchestrator::{
  MemoryStore, Orchestrator, OrchestratorConfig, OrchestratorError, ReconcileWorker, TurbineStore,
};

#[derive(Deserialize)]
struct TurbineSpec {
  turbine_id: String,
  name: String,
  #[serde(default)]
  location: String,
  #[serde(default)]
  model: String,
  capacity_kw: f64,
}

/// Registration lines carry `capacity_kw`; everything else is an alarm.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputLine {
  Turbine(TurbineSpec),
  Alarm(InboundAlarm),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let store = Arc::new(MemoryStore::new());
  let core = Arc::new(Orchestrator::new(store.clone(), OrchestratorConfig::default()));

  let token = CancellationToken::new();
  let worker = ReconcileWorker::new(core.clone(), token.clone());
  let worker_handle = tokio::spawn(worker.run());

  let stdin = BufReader::new(tokio::io::stdin());
  let mut lines = stdin.lines();

  while let Some(line) = lines.next_line().await? {
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let parsed: InputLine = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        print_json(&ErrorOutput::new(format!("json parse: {}", e)));
        continue;
      }
    };

    match parsed {
      InputLine::Turbine(spec) => {
        let turbine = Turbine::new(
          &spec.turbine_id,
          &spec.name,
          &spec.location,
          &spec.model,
          spec.capacity_kw,
        );
        match store.register_turbine(turbine).await {
          Ok(()) => tracing::info!(turbine_id = %spec.turbine_id, "turbine registered"),
          Err(e) => print_json(&ErrorOutput::new(e.to_string())),
        }
      }
      InputLine::Alarm(raw) => match core.ingest(&raw).await {
        Ok(rec) => print_json(&rec),
        Err(e) => print_json(&error_output(e)),
      },
    }
  }

  // Stdin closed: let the in-flight tick finish, then stop.
  token.cancel();
  let _ = worker_handle.await;
  Ok(())
}

fn error_output(err: OrchestratorError) -> ErrorOutput {
  match err {
    OrchestratorError::Engine(EngineError::Validation { field, reason }) => {
      ErrorOutput::new(reason).with_field(field)
    }
    other => ErrorOutput::new(other.to_string()),
  }
}

fn print_json<T: serde::Serialize>(value: &T) {
  match serde_json::to_string(value) {
    Ok(s) => println!("{}", s),
    Err(e) => tracing::error!(error = %e, "failed to serialize output line"),
  }
}
