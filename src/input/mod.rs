//! File acquisition.
//!
//! Files reach the pipeline from three places: paths given on the command
//! line, a watched drop folder, and the HTTP `POST /drop` endpoint. All of
//! them push an [`IngestFile`] into one channel; [`InputController`] starts
//! a pipeline per file as it arrives. Nothing is queued behind an earlier
//! submission, so several analyses may be in flight at once.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::analysis::{AnalysisClient, ProcessReport};

pub mod drop_folder;
pub mod drop_server;

/// A user-supplied file. Contents are never inspected on this side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl IngestFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its bare file name.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::new(name, bytes))
    }
}

/// Handle the input sources use to submit files.
pub type FileSender = mpsc::UnboundedSender<IngestFile>;

pub struct InputController {
    client: AnalysisClient,
    rx: mpsc::UnboundedReceiver<IngestFile>,
}

impl InputController {
    pub fn new(client: AnalysisClient) -> (Self, FileSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { client, rx }, tx)
    }

    /// Start one pipeline per incoming file until every sender is dropped,
    /// then wait for the in-flight ones. Returns reports in completion order.
    pub async fn run(self) -> Vec<ProcessReport> {
        let mut reports = Vec::new();
        self.run_with(|report| reports.push(report)).await;
        reports
    }

    /// Like [`run`](Self::run) but hands each report to `on_report` as it
    /// completes instead of keeping it. Returns how many pipelines finished.
    /// Each report is already logged by [`AnalysisClient::process`].
    pub async fn run_with(mut self, mut on_report: impl FnMut(ProcessReport)) -> usize {
        let mut tasks = JoinSet::new();
        let mut finished = 0;

        loop {
            tokio::select! {
                file = self.rx.recv() => match file {
                    Some(file) => {
                        info!(target: "input", file = %file.name, size = file.bytes.len(), "file received");
                        let client = self.client.clone();
                        tasks.spawn(async move { client.process(file).await });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    finished += deliver(joined, &mut on_report);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            finished += deliver(joined, &mut on_report);
        }
        finished
    }
}

fn deliver(
    joined: Result<ProcessReport, tokio::task::JoinError>,
    on_report: &mut impl FnMut(ProcessReport),
) -> usize {
    match joined {
        Ok(report) => {
            on_report(report);
            1
        }
        Err(e) => {
            error!(target: "input", "analysis task failed: {}", e);
            0
        }
    }
}
