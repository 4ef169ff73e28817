//! Engine-status state machine.
//!
//! Models the badge driven by the one-shot startup probe:
//! ```text
//! Checking ─┬─ Reachable ──→ Online
//!           └─ Unreachable → Offline
//! ```
//! Both outcomes are terminal; there is no periodic re-check.

use statig::prelude::*;
use tracing::info;

use crate::dashboard::EngineStatus;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events dispatched to the engine-status state machine.
#[derive(Debug, Clone)]
pub enum ProbeEvent {
    /// `GET /` answered with a 2xx status.
    Reachable,
    /// The probe failed or the engine answered non-2xx.
    Unreachable(String),
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct EngineStatusMachine;

impl EngineStatusMachine {
    /// Map a machine state onto the dashboard badge.
    pub fn engine_status(state: &State) -> EngineStatus {
        match state {
            State::Checking {} => EngineStatus::Checking,
            State::Online {} => EngineStatus::Online,
            State::Offline {} => EngineStatus::Offline,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(
    initial = "State::checking()",
    state(derive(Debug, Clone, PartialEq))
)]
impl EngineStatusMachine {
    /// Probe in flight.
    #[state]
    fn checking(event: &ProbeEvent) -> Outcome<State> {
        match event {
            ProbeEvent::Reachable => Transition(State::online()),
            ProbeEvent::Unreachable(reason) => {
                info!(target: "probe", "engine offline: {}", reason);
                Transition(State::offline())
            }
        }
    }

    /// Engine answered the probe.
    #[state]
    fn online(event: &ProbeEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }

    /// Engine unreachable; ingestion will fall back to simulation.
    #[state]
    fn offline(event: &ProbeEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachable_goes_online() {
        let mut sm = EngineStatusMachine.state_machine();
        sm.handle(&ProbeEvent::Reachable);
        assert_eq!(EngineStatusMachine::engine_status(sm.state()), EngineStatus::Online);
    }

    #[test]
    fn unreachable_goes_offline() {
        let mut sm = EngineStatusMachine.state_machine();
        sm.handle(&ProbeEvent::Unreachable("connection refused".to_string()));
        assert_eq!(EngineStatusMachine::engine_status(sm.state()), EngineStatus::Offline);
    }

    #[test]
    fn outcome_is_terminal() {
        let mut sm = EngineStatusMachine.state_machine();
        sm.handle(&ProbeEvent::Unreachable("timeout".to_string()));
        sm.handle(&ProbeEvent::Reachable);
        assert_eq!(EngineStatusMachine::engine_status(sm.state()), EngineStatus::Offline);
    }
}
