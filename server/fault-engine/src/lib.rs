//! Wind Fault Classification Engine — deterministic, rule-based.
//!
//! Validates inbound turbine alarms, classifies each against recent
//! per-turbine history via a strict priority cascade, maps the decided
//! action onto an operational turbine state, and fills recommendation
//! content from a per-code catalog.
//!
//! No AI, no DB, no network; pure computation over an injected history view.

pub mod catalog;
pub mod config;
pub mod decide;
pub mod error;
pub mod history;
pub mod normalize;
pub mod state;
pub mod types;

pub use config::EngineConfig;
pub use decide::decide;
pub use error::EngineError;
pub use history::{EventHistory, HistoryWindow};
pub use state::next_state;
pub use types::{Action, Decision, FaultEvent, InboundAlarm, Recommendation, Turbine, TurbineState};
