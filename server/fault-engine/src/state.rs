//! Map a decided action onto an operational turbine state.

use crate::config::EngineConfig;
use crate::types::{Action, TurbineState};

/// Derive the next turbine state from the current state and a decided action.
///
/// | Action           | State     |
/// |------------------|-----------|
/// | Escalate         | Repair    |
/// | WaitCoolDown     | Available |
/// | Reset            | Online (Impacted for derated codes) |
/// | Snooze           | Stopped   |
/// | ManualInspection | Impacted  |
///
/// The derated-code override applies only to Reset: a derated code signals
/// "operable at reduced output", which is moot once a more severe action has
/// been chosen. A turbine in `Netcom` stays in `Netcom` — only the external
/// communication-restored trigger moves it out.
pub fn next_state(
  current: TurbineState,
  action: Action,
  code: &str,
  config: &EngineConfig,
) -> TurbineState {
  if current == TurbineState::Netcom {
    return TurbineState::Netcom;
  }
  match action {
    Action::Escalate => TurbineState::Repair,
    Action::WaitCoolDown => TurbineState::Available,
    Action::Reset => {
      if config.is_derated(code) {
        TurbineState::Impacted
      } else {
        TurbineState::Online
      }
    }
    Action::Snooze => TurbineState::Stopped,
    Action::ManualInspection => TurbineState::Impacted,
  }
}
