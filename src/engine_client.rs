//! HTTP transport to the remote analysis engine.
//!
//! Two calls, both single-shot with no retry and the transport's default
//! timeout: a reachability `GET /` and a multipart `POST /ingest/csv`.
//! Failures come back as a typed [`IngestError`] so callers can tell
//! transport problems from engine rejections, even though the pipeline
//! treats them all the same.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::input::IngestFile;
use crate::protocol::{AnalysisResult, EngineInfo};

/// Multipart field name the engine reads the upload from.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub enum IngestError {
    /// The request never produced a response (connect refused, DNS, reset...).
    Transport(reqwest::Error),
    /// The engine answered with a non-2xx status.
    Rejected { status: u16, body: String },
    /// A 2xx body that is not the expected JSON shape.
    Malformed(serde_json::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Transport(e) => write!(f, "engine unreachable: {e}"),
            IngestError::Rejected { status, body } if body.is_empty() => {
                write!(f, "engine returned {status}")
            }
            IngestError::Rejected { status, body } => write!(f, "engine returned {status}: {body}"),
            IngestError::Malformed(e) => write!(f, "malformed engine response: {e}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Transport(e) => Some(e),
            IngestError::Malformed(e) => Some(e),
            IngestError::Rejected { .. } => None,
        }
    }
}

impl IngestError {
    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Transport(_) => "transport",
            IngestError::Rejected { .. } => "rejected",
            IngestError::Malformed(_) => "malformed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    root_url: Url,
    ingest_url: Url,
}

impl EngineClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            root_url: config.root_url()?,
            ingest_url: config.ingest_url()?,
        })
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    pub fn ingest_url(&self) -> &Url {
        &self.ingest_url
    }

    /// Upload `file` as the single multipart field `file` and parse the
    /// engine's analysis.
    pub async fn ingest(&self, file: &IngestFile) -> Result<AnalysisResult, IngestError> {
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part(FILE_FIELD, part);

        debug!(target: "engine", url = %self.ingest_url, file = %file.name, size = file.bytes.len(), "POST ingest");

        let response = self
            .http
            .post(self.ingest_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(IngestError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(IngestError::Transport)?;
        serde_json::from_slice(&body).map_err(IngestError::Malformed)
    }

    /// Reachability check against the engine root. The body is optional
    /// decoration; an unparseable body on a 2xx still counts as reachable.
    pub async fn ping(&self) -> Result<Option<EngineInfo>, IngestError> {
        let response = self
            .http
            .get(self.root_url.clone())
            .send()
            .await
            .map_err(IngestError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Rejected {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        Ok(response.json::<EngineInfo>().await.ok())
    }
}
