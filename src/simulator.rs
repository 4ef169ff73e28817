//! Offline stand-in for the analysis engine.
//!
//! When the engine cannot be used, a profile is fabricated from the file
//! name alone and released only after a fixed delay, so the dashboard
//! behaves as if an analysis had run.

use std::time::Duration;

use crate::activity_log::ActivityLog;
use crate::protocol::DashboardProfile;

/// Substring (case-sensitive) that marks a file as critical.
pub const CRITICAL_MARKER: &str = "critical";
pub const SIMULATED_VULNERABILITY_COUNT: u64 = 3;

pub const CRITICAL_REACHABILITY: &str = "Critical Infrastructure";
pub const ISOLATED_REACHABILITY: &str = "Isolated Network";
pub const CRITICAL_TECHNIQUE: &str = "T1190";
pub const ISOLATED_TECHNIQUE: &str = "T1059";

#[derive(Debug, Clone)]
pub struct Simulator {
    delay: Duration,
    log: ActivityLog,
}

impl Simulator {
    pub fn new(delay: Duration, log: ActivityLog) -> Self {
        Self { delay, log }
    }

    /// The naming rule, without delay or logging.
    pub fn profile_for(file_name: &str) -> DashboardProfile {
        let is_critical = file_name.contains(CRITICAL_MARKER);
        let (reachability, mitre_technique) = if is_critical {
            (CRITICAL_REACHABILITY, CRITICAL_TECHNIQUE)
        } else {
            (ISOLATED_REACHABILITY, ISOLATED_TECHNIQUE)
        };
        DashboardProfile {
            reachability: reachability.to_string(),
            mitre_technique: mitre_technique.to_string(),
            vulnerability_count: SIMULATED_VULNERABILITY_COUNT,
            is_critical,
        }
    }

    /// Wait out the simulated latency, then produce the profile.
    pub async fn simulate(&self, file_name: &str) -> DashboardProfile {
        tokio::time::sleep(self.delay).await;
        let profile = Self::profile_for(file_name);
        self.log
            .success(format!("Simulation complete for {file_name}."));
        profile
    }
}
