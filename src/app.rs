//! Wiring for one client session.
//!
//! A session owns the activity log and the dashboard and hands clones of
//! them to every component that reports or renders. Nothing here outlives
//! the process.

use anyhow::Result;

use crate::activity_log::ActivityLog;
use crate::analysis::AnalysisClient;
use crate::config::Config;
use crate::dashboard::{DashboardRenderer, render_text};
use crate::engine_client::EngineClient;
use crate::probe::EngineProbe;

#[derive(Debug, Clone)]
pub struct Session {
    pub log: ActivityLog,
    pub renderer: DashboardRenderer,
    pub analysis: AnalysisClient,
    pub probe: EngineProbe,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self> {
        let log = ActivityLog::new();
        let renderer = DashboardRenderer::new(config.dashboard.node_count, config.node_stagger());
        let analysis = AnalysisClient::from_config(config, renderer.clone(), log.clone())?;
        let probe = EngineProbe::new(EngineClient::new(config)?, renderer.clone(), log.clone());

        Ok(Self {
            log,
            renderer,
            analysis,
            probe,
        })
    }

    /// Current dashboard and log as terminal text.
    pub fn render(&self) -> String {
        render_text(&self.renderer.snapshot(), &self.log.entries())
    }
}
