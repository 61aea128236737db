//! Wind Fault Orchestrator
//!
//! Async shell around the fault-engine cascade: ingests turbine alarms,
//! classifies them under per-turbine mutual exclusion, persists state and
//! recommendations through store traits, and re-evaluates snoozed
//! recommendations on a timer.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod store;

pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use reconcile::ReconcileWorker;
pub use store::{FaultStore, MemoryStore, RecommendationStore, Store, StoreError, TurbineStore};
