//! Application directory structure for event-horizon.
//!
//! Provides a single `AppPaths` struct that resolves the two directories the
//! client touches:
//!
//! - Config:    `~/.config/event-horizon/`  (human-editable, XDG-style)
//! - Logs:      `~/Library/Logs/event-horizon/` on macOS, XDG data dir elsewhere
//!
//! Nothing under these paths holds session state; the dashboard and activity
//! log live only in memory.

use std::path::{Path, PathBuf};
use tracing::info;

pub const APP_NAME: &str = "event-horizon";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// All resolved application directory paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Human-editable config: `~/.config/event-horizon/`
    pub config: PathBuf,
    /// Diagnostic log files (only written when `EVENT_HORIZON_LOG=1`)
    pub logs: PathBuf,
}

impl AppPaths {
    /// Resolve all paths from the user's home directory.
    /// Does not create any directories; `logging` calls `ensure()` when the
    /// file sink is enabled.
    pub fn resolve() -> Option<Self> {
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;

        Some(Self {
            config: resolve_config_dir(&home),
            logs: resolve_log_dir(&home),
        })
    }

    /// Full path to `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILE_NAME)
    }

    /// Create all directories that don't already exist.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.config, &self.logs] {
            std::fs::create_dir_all(dir)?;
            info!("ensured directory: {}", dir.display());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Platform-specific path resolution
// ---------------------------------------------------------------------------

fn resolve_config_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join(APP_NAME)
    } else {
        home.join(".config").join(APP_NAME)
    }
}

#[cfg(target_os = "macos")]
fn resolve_log_dir(home: &Path) -> PathBuf {
    home.join("Library").join("Logs").join(APP_NAME)
}

#[cfg(not(target_os = "macos"))]
fn resolve_log_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_NAME).join("logs")
    } else {
        home.join(".local").join("share").join(APP_NAME).join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_produces_valid_paths() {
        let paths = AppPaths::resolve().expect("HOME should be set in tests");
        assert!(paths.config.to_string_lossy().contains("event-horizon"));
        assert!(paths.logs.to_string_lossy().contains("event-horizon"));
        assert!(paths.config_file().ends_with("event-horizon/config.toml"));
    }

    #[test]
    fn ensure_creates_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");

        let paths = AppPaths {
            config: tmp.path().join("config"),
            logs: tmp.path().join("logs"),
        };

        paths.ensure().expect("ensure should succeed");

        assert!(paths.config.is_dir());
        assert!(paths.logs.is_dir());
    }
}
