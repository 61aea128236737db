//! Structured error types for the orchestration shell.

use thiserror::Error;

use crate::store::StoreError;
use fault_engine::EngineError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
  /// The referenced turbine is not registered. No recommendation is created.
  #[error("turbine not found: {0}")]
  TurbineNotFound(String),

  #[error("fault event not found: {0}")]
  EventNotFound(u64),

  /// Conditional turbine write kept losing against a concurrent writer.
  #[error("write conflict on turbine {turbine_id} after {attempts} attempts")]
  WriteConflict { turbine_id: String, attempts: u32 },

  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error(transparent)]
  Store(#[from] StoreError),
}
