//! Dashboard state and rendering.
//!
//! [`DashboardState`] is the single value the UI reads from: engine badge,
//! the reachability and MITRE fields, and the chain nodes. It is owned by
//! [`DashboardRenderer`] and published through a `watch` channel so the
//! terminal front end can redraw on every change.
//!
//! Applying a profile sets the text fields at once and then lights the
//! chain nodes one by one, node `i` at `i × stagger`. The animation is fire
//! and forget; a newer submission cancels whatever is left of an older one.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::activity_log::LogEntry;
use crate::protocol::DashboardProfile;
use crate::scheduler::Scheduler;

// --- Node palette ---

const CRITICAL_COLOR: &str = "#ff2d55";  // alert red
const NORMAL_COLOR: &str = "#007aff";    // info blue
const GLOW_ALPHA: &str = "66";           // ~40% opacity suffix for the glow
const GLOW_RADIUS_PX: u32 = 20;

const PLACEHOLDER: &str = "--";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EngineStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

impl EngineStatus {
    pub fn badge(self) -> &'static str {
        match self {
            EngineStatus::Checking => "ENGINE CHECKING",
            EngineStatus::Online => "ENGINE ONLINE",
            EngineStatus::Offline => "ENGINE OFFLINE",
        }
    }
}

/// Highlight applied to a chain node. Binary: critical or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeTone {
    Critical,
    Normal,
}

impl NodeTone {
    pub fn for_profile(profile: &DashboardProfile) -> Self {
        if profile.is_critical {
            NodeTone::Critical
        } else {
            NodeTone::Normal
        }
    }

    /// Border color.
    pub fn color(self) -> &'static str {
        match self {
            NodeTone::Critical => CRITICAL_COLOR,
            NodeTone::Normal => NORMAL_COLOR,
        }
    }

    /// Box-shadow glow in the same hue.
    pub fn glow(self) -> String {
        format!("0 0 {GLOW_RADIUS_PX}px {}{GLOW_ALPHA}", self.color())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainNode {
    pub index: usize,
    pub tone: Option<NodeTone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardState {
    pub engine_status: EngineStatus,
    pub reachability: String,
    pub mitre_technique: String,
    pub vulnerability_count: Option<u64>,
    pub is_critical: bool,
    pub nodes: Vec<ChainNode>,
    /// Sequence number of the submission currently shown.
    pub last_applied: Option<u64>,
}

impl DashboardState {
    pub fn new(node_count: usize) -> Self {
        Self {
            engine_status: EngineStatus::Checking,
            reachability: PLACEHOLDER.to_string(),
            mitre_technique: PLACEHOLDER.to_string(),
            vulnerability_count: None,
            is_critical: false,
            nodes: (0..node_count)
                .map(|index| ChainNode { index, tone: None })
                .collect(),
            last_applied: None,
        }
    }

    /// True once every node carries the tone of the shown profile.
    pub fn animation_settled(&self) -> bool {
        let expected = if self.is_critical {
            NodeTone::Critical
        } else {
            NodeTone::Normal
        };
        self.last_applied.is_some() && self.nodes.iter().all(|n| n.tone == Some(expected))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardRenderer {
    state: Arc<watch::Sender<DashboardState>>,
    scheduler: Scheduler,
    stagger: Duration,
    /// Serialises the seq check, cancellation and scheduling of one apply
    /// against concurrent applies from other submissions.
    apply_lock: Arc<Mutex<()>>,
}

impl DashboardRenderer {
    pub fn new(node_count: usize, stagger: Duration) -> Self {
        let (tx, _rx) = watch::channel(DashboardState::new(node_count));
        Self {
            state: Arc::new(tx),
            scheduler: Scheduler::new(),
            stagger,
            apply_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn set_engine_status(&self, status: EngineStatus) {
        self.state.send_if_modified(|s| {
            let changed = s.engine_status != status;
            s.engine_status = status;
            changed
        });
    }

    /// Show `profile` for submission `seq`.
    ///
    /// Returns `false` and changes nothing if a newer submission is already
    /// on screen. Must be called from within a Tokio runtime.
    pub fn apply(&self, seq: u64, profile: &DashboardProfile) -> bool {
        let _guard = self.apply_lock.lock().unwrap_or_else(|e| e.into_inner());

        let applied = self.state.send_if_modified(|s| {
            if s.last_applied.is_some_and(|last| seq < last) {
                return false;
            }
            s.reachability = profile.reachability.clone();
            s.mitre_technique = profile.mitre_technique.clone();
            s.vulnerability_count = Some(profile.vulnerability_count);
            s.is_critical = profile.is_critical;
            s.last_applied = Some(seq);
            true
        });

        if !applied {
            debug!(target: "dashboard", seq, "dropping stale profile");
            return false;
        }

        self.scheduler.cancel_before(seq);
        self.animate_nodes(seq, NodeTone::for_profile(profile));
        true
    }

    /// Resolves once every scheduled node highlight has fired or been cancelled.
    pub async fn wait_for_animations(&self) {
        debug!(target: "dashboard", pending = self.scheduler.pending(), "waiting for node animations");
        self.scheduler.wait_idle().await;
    }

    fn animate_nodes(&self, seq: u64, tone: NodeTone) {
        let node_count = self.state.borrow().nodes.len();
        for index in 0..node_count {
            let state = Arc::clone(&self.state);
            let delay = self.stagger * index as u32;
            self.scheduler.schedule(seq, delay, move || {
                // Only the submission on screen may paint nodes.
                state.send_if_modified(|s| {
                    if s.last_applied != Some(seq) {
                        return false;
                    }
                    match s.nodes.get_mut(index) {
                        Some(node) => {
                            node.tone = Some(tone);
                            true
                        }
                        None => false,
                    }
                });
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal view
// ---------------------------------------------------------------------------

/// Render the dashboard and the activity log (newest first) as plain text.
pub fn render_text(state: &DashboardState, log: &[LogEntry]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "EVENT HORIZON  [{}]", state.engine_status.badge());
    let _ = writeln!(out, "  Reachability     {}", state.reachability);
    let _ = writeln!(out, "  MITRE Technique  {}", state.mitre_technique);
    let count = state
        .vulnerability_count
        .map(|c| c.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let _ = writeln!(out, "  Vulnerabilities  {count}");

    let chain: Vec<&str> = state
        .nodes
        .iter()
        .map(|n| match n.tone {
            Some(NodeTone::Critical) => "[!]",
            Some(NodeTone::Normal) => "[*]",
            None => "[ ]",
        })
        .collect();
    let _ = write!(out, "  Chain            {}", chain.join("--"));
    if let Some(tone) = state.nodes.iter().rev().find_map(|n| n.tone) {
        let _ = write!(out, "  ({}, glow {})", tone.color(), tone.glow());
    }
    out.push('\n');

    if !log.is_empty() {
        out.push('\n');
        for entry in log {
            let _ = writeln!(out, "{entry}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn profile(critical: bool) -> DashboardProfile {
        DashboardProfile {
            reachability: "DMZ".to_string(),
            mitre_technique: "T1190 (Exploit Public-Facing Application)".to_string(),
            vulnerability_count: 5,
            is_critical: critical,
        }
    }

    #[test]
    fn tone_colors_and_glow() {
        assert_eq!(NodeTone::Critical.color(), "#ff2d55");
        assert_eq!(NodeTone::Normal.color(), "#007aff");
        assert_eq!(NodeTone::Critical.glow(), "0 0 20px #ff2d5566");
    }

    #[tokio::test(start_paused = true)]
    async fn apply_sets_text_fields_immediately() {
        let renderer = DashboardRenderer::new(4, Duration::from_millis(200));
        assert!(renderer.apply(1, &profile(true)));

        let state = renderer.snapshot();
        assert_eq!(state.reachability, "DMZ");
        assert_eq!(state.mitre_technique, "T1190 (Exploit Public-Facing Application)");
        assert_eq!(state.vulnerability_count, Some(5));
        assert_eq!(state.last_applied, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn nodes_light_up_staggered() {
        let renderer = DashboardRenderer::new(4, Duration::from_millis(200));
        let start = Instant::now();
        renderer.apply(1, &profile(false));

        tokio::time::sleep(Duration::from_millis(250)).await;
        let state = renderer.snapshot();
        let lit: Vec<bool> = state.nodes.iter().map(|n| n.tone.is_some()).collect();
        assert_eq!(lit, vec![true, true, false, false]);

        renderer.wait_for_animations().await;
        assert!(start.elapsed() >= Duration::from_millis(600));
        let state = renderer.snapshot();
        assert!(state.nodes.iter().all(|n| n.tone == Some(NodeTone::Normal)));
        assert!(state.animation_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn applying_twice_is_idempotent() {
        let renderer = DashboardRenderer::new(3, Duration::from_millis(200));
        renderer.apply(1, &profile(true));
        let first = renderer.snapshot();
        renderer.apply(1, &profile(true));
        let second = renderer.snapshot();

        assert_eq!(first.reachability, second.reachability);
        assert_eq!(first.mitre_technique, second.mitre_technique);

        renderer.wait_for_animations().await;
        assert!(renderer.snapshot().animation_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_profile_is_dropped() {
        let renderer = DashboardRenderer::new(2, Duration::from_millis(200));
        assert!(renderer.apply(2, &profile(true)));

        let mut stale = profile(false);
        stale.reachability = "Isolated Network".to_string();
        assert!(!renderer.apply(1, &stale));

        renderer.wait_for_animations().await;
        let state = renderer.snapshot();
        assert_eq!(state.reachability, "DMZ");
        assert!(state.nodes.iter().all(|n| n.tone == Some(NodeTone::Critical)));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_submission_cancels_older_animation() {
        let renderer = DashboardRenderer::new(4, Duration::from_millis(200));
        renderer.apply(1, &profile(true));
        tokio::time::sleep(Duration::from_millis(50)).await;

        renderer.apply(2, &profile(false));
        renderer.wait_for_animations().await;

        let state = renderer.snapshot();
        assert!(state.nodes.iter().all(|n| n.tone == Some(NodeTone::Normal)));
    }

    #[test]
    fn engine_status_updates_badge() {
        let renderer = DashboardRenderer::new(1, Duration::ZERO);
        assert_eq!(renderer.snapshot().engine_status.badge(), "ENGINE CHECKING");
        renderer.set_engine_status(EngineStatus::Offline);
        assert_eq!(renderer.snapshot().engine_status.badge(), "ENGINE OFFLINE");
    }

    #[test]
    fn render_text_shows_fields_and_log() {
        let mut state = DashboardState::new(3);
        state.engine_status = EngineStatus::Online;
        state.reachability = "DMZ".to_string();
        state.mitre_technique = "T1059 (Command/Script)".to_string();
        state.vulnerability_count = Some(2);
        state.nodes[0].tone = Some(NodeTone::Normal);

        let log = vec![LogEntry {
            timestamp: "10:00:01".to_string(),
            message: "Received analysis for 2 vulnerabilities.".to_string(),
            severity: crate::activity_log::Severity::Success,
        }];
        let text = render_text(&state, &log);

        assert!(text.contains("[ENGINE ONLINE]"));
        assert!(text.contains("Reachability     DMZ"));
        assert!(text.contains("MITRE Technique  T1059 (Command/Script)"));
        assert!(text.contains("Vulnerabilities  2"));
        assert!(text.contains("[*]--[ ]--[ ]  (#007aff, glow 0 0 20px #007aff66)"));
        assert!(text.contains("[10:00:01] Received analysis for 2 vulnerabilities."));
    }

    #[tokio::test(start_paused = true)]
    async fn apply_keeps_previous_tones_until_restaggered() {
        let renderer = DashboardRenderer::new(4, Duration::from_millis(200));
        renderer.apply(1, &profile(true));
        renderer.wait_for_animations().await;

        renderer.apply(2, &profile(false));
        assert_eq!(renderer.scheduler().pending(), 4);
        let state = renderer.snapshot();
        assert!(!state.is_critical);
        assert_eq!(state.nodes[3].tone, Some(NodeTone::Critical));

        renderer.wait_for_animations().await;
        assert_eq!(renderer.snapshot().nodes[3].tone, Some(NodeTone::Normal));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_applies_leave_nodes_matching_shown_profile() {
        let mut mismatched = 0;
        for _ in 0..200 {
            let renderer = DashboardRenderer::new(4, Duration::from_millis(1));
            let mut handles = Vec::new();
            for seq in 1..=16u64 {
                let renderer = renderer.clone();
                handles.push(tokio::spawn(async move {
                    renderer.apply(seq, &profile(seq % 2 == 0));
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }
            renderer.wait_for_animations().await;

            let state = renderer.snapshot();
            let expected = NodeTone::for_profile(&profile(state.is_critical));
            if state.nodes.iter().any(|n| n.tone != Some(expected)) {
                mismatched += 1;
            }
        }
        assert_eq!(mismatched, 0);
    }
}
