//! The ingestion pipeline.
//!
//! One call to [`AnalysisClient::process`] takes a file through:
//!
//! ```text
//! log "Ingesting…" → POST /ingest/csv ─┬─ Ok  → log summary → normalize ─┐
//!                                      └─ Err → log fallback → simulate ─┴→ apply
//! ```
//!
//! Every failure kind (transport, non-2xx, bad JSON) takes the same fallback
//! branch; the kind only shows up in diagnostic tracing. Submissions are
//! numbered as they start, and the renderer ignores a profile older than the
//! one already on screen.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::activity_log::ActivityLog;
use crate::config::Config;
use crate::dashboard::DashboardRenderer;
use crate::engine_client::EngineClient;
use crate::input::IngestFile;
use crate::protocol::{AnalysisResult, DashboardProfile};
use crate::simulator::Simulator;

/// Reachability label when the engine sends no per-item reachability.
pub const CALCULATED_PROFILE: &str = "Calculated Profile";
pub const CRITICAL_TECHNIQUE_LABEL: &str = "T1190 (Exploit Public-Facing Application)";
pub const DEFAULT_TECHNIQUE_LABEL: &str = "T1059 (Command/Script)";

pub const FALLBACK_MESSAGE: &str = "Backend unavailable, falling back to simulation...";

/// Map an engine response onto the dashboard profile.
pub fn normalize(result: &AnalysisResult) -> DashboardProfile {
    let reachability = result
        .first_report()
        .and_then(|r| r.reachability.as_deref())
        .filter(|r| !r.is_empty())
        .unwrap_or(CALCULATED_PROFILE);

    let mitre_technique = if result.summary.is_critical {
        CRITICAL_TECHNIQUE_LABEL
    } else {
        DEFAULT_TECHNIQUE_LABEL
    };

    DashboardProfile {
        reachability: reachability.to_string(),
        mitre_technique: mitre_technique.to_string(),
        vulnerability_count: result.summary.total_processed,
        is_critical: result.summary.is_critical,
    }
}

/// Where a profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileSource {
    Engine,
    Simulation,
}

/// What happened to one submission.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub seq: u64,
    pub file_name: String,
    pub source: ProfileSource,
    pub profile: DashboardProfile,
    /// False when a newer submission was already on screen.
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    engine: EngineClient,
    simulator: Simulator,
    renderer: DashboardRenderer,
    log: ActivityLog,
    next_seq: Arc<AtomicU64>,
}

impl AnalysisClient {
    pub fn new(
        engine: EngineClient,
        simulator: Simulator,
        renderer: DashboardRenderer,
        log: ActivityLog,
    ) -> Self {
        Self {
            engine,
            simulator,
            renderer,
            log,
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wire a client from config, sharing `renderer` and `log` with the caller.
    pub fn from_config(config: &Config, renderer: DashboardRenderer, log: ActivityLog) -> Result<Self> {
        let engine = EngineClient::new(config)?;
        let simulator = Simulator::new(config.simulation_delay(), log.clone());
        Ok(Self::new(engine, simulator, renderer, log))
    }

    pub fn renderer(&self) -> &DashboardRenderer {
        &self.renderer
    }

    /// Analyze `file` remotely, or simulate on any failure, and show the result.
    pub async fn process(&self, file: IngestFile) -> ProcessReport {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.info(format!("Ingesting {}...", file.name));

        let (profile, source) = match self.engine.ingest(&file).await {
            Ok(result) => {
                self.report_analysis(&result);
                (normalize(&result), ProfileSource::Engine)
            }
            Err(err) => {
                warn!(target: "analysis", seq, file = %file.name, kind = err.kind(), "ingest failed: {}", err);
                self.log.info(FALLBACK_MESSAGE);
                (self.simulator.simulate(&file.name).await, ProfileSource::Simulation)
            }
        };

        let applied = self.renderer.apply(seq, &profile);
        info!(target: "analysis", seq, file = %file.name, ?source, applied, "submission finished");

        ProcessReport {
            seq,
            file_name: file.name,
            source,
            profile,
            applied,
        }
    }

    fn report_analysis(&self, result: &AnalysisResult) {
        self.log.success(format!(
            "Received analysis for {} vulnerabilities.",
            result.summary.total_processed
        ));

        if let Some(path) = result.attack_path() {
            if result.summary.is_critical {
                self.log
                    .danger(format!("CRITICAL: Vector Chaining detected: {path}"));
            } else {
                self.log.info(format!("Chain analysis complete: {path}"));
            }
        }
    }
}
