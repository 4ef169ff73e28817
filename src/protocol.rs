//! Analysis engine protocol types.
//!
//! Defines the JSON bodies returned by the engine's `GET /` and
//! `POST /ingest/csv` endpoints, plus the normalized [`DashboardProfile`]
//! the rest of the client works with. Fields the dashboard does not read are
//! kept for protocol completeness.

use serde::{Deserialize, Serialize};

/// Body of a successful `POST /ingest/csv`.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisResult {
    pub summary: Summary,
    #[serde(default)]
    pub attack_path_analysis: Option<AttackPathAnalysis>,
    /// `null`, missing and `[]` all mean "no reports".
    #[serde(default)]
    pub individual_reports: Option<Vec<IndividualReport>>,
}

impl AnalysisResult {
    pub fn first_report(&self) -> Option<&IndividualReport> {
        self.individual_reports.as_ref().and_then(|r| r.first())
    }

    /// The attack-path description, if the engine produced one.
    pub fn attack_path(&self) -> Option<&str> {
        self.attack_path_analysis
            .as_ref()
            .and_then(|a| a.path.as_deref())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Summary {
    pub total_processed: u64,
    #[serde(default)]
    pub is_critical: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AttackPathAnalysis {
    pub chain_id: Option<String>,
    pub path: Option<String>,
    pub aggregate_risk: Option<f64>,
    pub threat_actor_level: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IndividualReport {
    pub id: Option<String>,
    pub title: Option<String>,
    pub score: Option<f64>,
    pub reachability: Option<String>,
    pub status: Option<String>,
}

/// Body of `GET /`. Only used for diagnostics; any 2xx means online.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineInfo {
    #[serde(default)]
    pub message: String,
    pub version: Option<String>,
}

/// Render-ready summary of one analysis outcome, remote or simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardProfile {
    pub reachability: String,
    pub mitre_technique: String,
    pub vulnerability_count: u64,
    pub is_critical: bool,
}
