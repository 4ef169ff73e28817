//! One-shot engine reachability check, run at startup.

use statig::prelude::*;
use tracing::{debug, warn};

use crate::activity_log::ActivityLog;
use crate::dashboard::{DashboardRenderer, EngineStatus};
use crate::engine_client::EngineClient;
use crate::state_machine::engine_status_sm::{EngineStatusMachine, ProbeEvent};

pub const ONLINE_MESSAGE: &str = "Backend engine connected and ready.";
pub const OFFLINE_MESSAGE: &str = "Warning: Backend engine unreachable. Using local simulation.";

#[derive(Debug, Clone)]
pub struct EngineProbe {
    engine: EngineClient,
    renderer: DashboardRenderer,
    log: ActivityLog,
}

impl EngineProbe {
    pub fn new(engine: EngineClient, renderer: DashboardRenderer, log: ActivityLog) -> Self {
        Self {
            engine,
            renderer,
            log,
        }
    }

    /// Ping the engine once, update the badge and log the outcome.
    pub async fn check_status(&self) -> EngineStatus {
        let event = match self.engine.ping().await {
            Ok(info) => {
                if let Some(info) = info {
                    debug!(target: "probe", message = %info.message, version = ?info.version, "engine info");
                }
                ProbeEvent::Reachable
            }
            Err(e) => {
                warn!(target: "probe", url = %self.engine.root_url(), kind = e.kind(), "engine probe failed: {}", e);
                ProbeEvent::Unreachable(e.to_string())
            }
        };

        let mut machine = EngineStatusMachine.state_machine();
        machine.handle(&event);
        let status = EngineStatusMachine::engine_status(machine.state());

        self.renderer.set_engine_status(status);
        match status {
            EngineStatus::Online => self.log.success(ONLINE_MESSAGE),
            EngineStatus::Offline => self.log.info(OFFLINE_MESSAGE),
            EngineStatus::Checking => {}
        }
        status
    }
}
