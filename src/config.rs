//! Runtime configuration loaded from `~/.config/event-horizon/config.toml`.
//!
//! Every key is optional; anything missing falls back to the compiled
//! defaults below. On first launch a commented default file is written so
//! the user has something to edit.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::paths::AppPaths;

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";
/// Artificial latency before a simulated profile is applied.
pub const DEFAULT_SIMULATION_DELAY_MS: u64 = 1000;
/// Delay between successive chain-node highlights.
pub const DEFAULT_NODE_STAGGER_MS: u64 = 200;
pub const DEFAULT_NODE_COUNT: usize = 4;

const INGEST_PATH: &str = "ingest/csv";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub timing: TimingConfig,
    pub dashboard: DashboardConfig,
    pub drop: DropConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub simulation_delay_ms: u64,
    pub node_stagger_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub node_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DropConfig {
    /// Folder watched for new files.
    pub folder: Option<PathBuf>,
    /// Address for the `POST /drop` upload endpoint.
    pub listen: Option<SocketAddr>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENGINE_URL.to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            simulation_delay_ms: DEFAULT_SIMULATION_DELAY_MS,
            node_stagger_ms: DEFAULT_NODE_STAGGER_MS,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            node_count: DEFAULT_NODE_COUNT,
        }
    }
}

impl Config {
    /// Parse a TOML document and validate the engine URL.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.base_url()?;
        Ok(config)
    }

    /// Load from `path`, or compiled defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// The engine base URL, normalised to end with `/` so relative joins
    /// keep any path prefix.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.engine.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("Invalid engine URL: {}", self.engine.base_url))
    }

    /// `GET` target for the reachability probe.
    pub fn root_url(&self) -> Result<Url> {
        self.base_url()
    }

    /// `POST` target for file ingestion.
    pub fn ingest_url(&self) -> Result<Url> {
        self.base_url()?
            .join(INGEST_PATH)
            .context("Failed to build ingest URL")
    }

    pub fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.timing.simulation_delay_ms)
    }

    pub fn node_stagger(&self) -> Duration {
        Duration::from_millis(self.timing.node_stagger_ms)
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Default location of `config.toml`, if `$HOME` is known.
pub fn default_config_path() -> Option<PathBuf> {
    AppPaths::resolve().map(|p| p.config_file())
}

/// Write the default TOML content to `path` if the file does not already exist.
/// Creates parent directories as needed.
pub fn ensure_default_config(path: &Path, default_content: &str) {
    if path.exists() {
        return;
    }
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(target: "config", "failed to create config dir {}: {e}", parent.display());
            return;
        }
    }
    if let Err(e) = std::fs::write(path, default_content) {
        warn!(target: "config", "failed to write default config at {}: {e}", path.display());
    }
}

/// A well-commented default config whose values match the compiled defaults.
pub fn default_config_content() -> String {
    format!(
        r#"# Event Horizon client configuration.
# Any missing values use compiled defaults. Delete a line to reset it.

[engine]
base_url = "{DEFAULT_ENGINE_URL}"   # Analysis engine root (GET / and POST /ingest/csv)

[timing]
simulation_delay_ms = {DEFAULT_SIMULATION_DELAY_MS}   # Latency before a simulated result is shown
node_stagger_ms = {DEFAULT_NODE_STAGGER_MS}        # Delay between chain-node highlights

[dashboard]
node_count = {DEFAULT_NODE_COUNT}              # Number of chain nodes on the dashboard

[drop]
# folder = "/path/to/drop"      # Ingest files created in this folder
# listen = "127.0.0.1:8700"     # Accept uploads on POST /drop
"#
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_content_matches_compiled_defaults() {
        let parsed = Config::from_toml_str(&default_config_content()).expect("default parses");
        assert_eq!(parsed.engine.base_url, DEFAULT_ENGINE_URL);
        assert_eq!(parsed.timing.simulation_delay_ms, 1000);
        assert_eq!(parsed.timing.node_stagger_ms, 200);
        assert_eq!(parsed.dashboard.node_count, DEFAULT_NODE_COUNT);
        assert!(parsed.drop.folder.is_none());
        assert!(parsed.drop.listen.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed = Config::from_toml_str("[timing]\nsimulation_delay_ms = 25\n").unwrap();
        assert_eq!(parsed.simulation_delay(), Duration::from_millis(25));
        assert_eq!(parsed.node_stagger(), Duration::from_millis(200));
        assert_eq!(parsed.engine.base_url, DEFAULT_ENGINE_URL);
    }

    #[test]
    fn ingest_url_is_joined_onto_base() {
        let config = Config::default();
        assert_eq!(config.root_url().unwrap().as_str(), "http://localhost:8000/");
        assert_eq!(
            config.ingest_url().unwrap().as_str(),
            "http://localhost:8000/ingest/csv"
        );
    }

    #[test]
    fn ingest_url_keeps_path_prefix() {
        let mut config = Config::default();
        config.engine.base_url = "http://engine.internal/api".to_string();
        assert_eq!(
            config.ingest_url().unwrap().as_str(),
            "http://engine.internal/api/ingest/csv"
        );
    }

    #[test]
    fn invalid_engine_url_is_rejected() {
        let err = Config::from_toml_str("[engine]\nbase_url = \"not a url\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.dashboard.node_count, DEFAULT_NODE_COUNT);
    }

    #[test]
    fn ensure_default_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        ensure_default_config(&path, "# test content\n[dashboard]\nnode_count = 6\n");
        assert!(path.exists());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.dashboard.node_count, 6);
    }

    #[test]
    fn ensure_default_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "# user customized\n").unwrap();

        ensure_default_config(&path, "# default content\n");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(
            content.contains("user customized"),
            "ensure_default_config should not overwrite existing file"
        );
    }
}
