//! HTTP drop endpoint: `POST /drop` with a multipart body.
//!
//! The first part that carries a file name is submitted as-is. No type or
//! size checks are applied. Answers `202 Accepted` with a [`DropReceipt`].

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{FileSender, IngestFile};

/// Acknowledgement returned for an accepted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropReceipt {
    /// Bare filename as sent by the client.
    pub accepted: String,
    pub size_bytes: u64,
    pub received_at: DateTime<Utc>,
}

pub fn router(sender: FileSender) -> Router {
    Router::new()
        .route("/drop", post(upload))
        .layer(DefaultBodyLimit::disable())
        .with_state(sender)
}

/// Bind `addr` and serve the drop endpoint in the background.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn start(addr: SocketAddr, sender: FileSender) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind drop endpoint on {addr}"))?;
    let local = listener.local_addr()?;
    info!(target: "drop_server", addr = %local, "drop endpoint listening");

    let app = router(sender);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(target: "drop_server", "drop endpoint stopped: {}", e);
        }
    });
    Ok((local, handle))
}

async fn upload(
    State(sender): State<FileSender>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DropReceipt>), (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let Some(name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

        let receipt = DropReceipt {
            accepted: name.clone(),
            size_bytes: bytes.len() as u64,
            received_at: Utc::now(),
        };

        sender
            .send(IngestFile::new(name, bytes.to_vec()))
            .map_err(|_| (StatusCode::SERVICE_UNAVAILABLE, "ingestion stopped".to_string()))?;

        return Ok((StatusCode::ACCEPTED, Json(receipt)));
    }

    Err((StatusCode::BAD_REQUEST, "no file part in upload".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::multipart::{Form, Part};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn upload_is_forwarded_to_the_pipeline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (addr, server) = start("127.0.0.1:0".parse().unwrap(), tx).await.unwrap();

        let form = Form::new().part(
            "file",
            Part::bytes(b"CVE_ID\nCVE-1\n".to_vec()).file_name("scan.csv"),
        );
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/drop"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
        let receipt: DropReceipt = response.json().await.unwrap();
        assert_eq!(receipt.accepted, "scan.csv");
        assert_eq!(receipt.size_bytes, 13);

        let file = rx.recv().await.unwrap();
        assert_eq!(file.name, "scan.csv");
        assert_eq!(file.bytes, b"CVE_ID\nCVE-1\n");

        server.abort();
    }

    #[tokio::test]
    async fn upload_without_file_part_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let (addr, server) = start("127.0.0.1:0".parse().unwrap(), tx).await.unwrap();

        let form = Form::new().text("note", "no file here");
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/drop"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        server.abort();
    }
}
