//! Rendered document downloads

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use super::{error_response, AppState};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Serve a stored artifact under a fresh `SOP-<millis>.docx` name
pub async fn download_doc(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    let path = match state.orchestrator.store().resolve(&filename) {
        Ok(path) => path,
        Err(_) => return error_response(StatusCode::NOT_FOUND, "Document not found"),
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(filename = %filename, "Requested document does not exist");
            return error_response(StatusCode::NOT_FOUND, "Document not found");
        }
        Err(e) => {
            error!(filename = %filename, error = %e, "Failed to read document");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error downloading document");
        }
    };

    let attachment = format!(
        "attachment; filename=\"SOP-{}.docx\"",
        chrono::Utc::now().timestamp_millis()
    );
    (
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::super::tests::{spawn_app, state};

    #[tokio::test]
    async fn test_download_existing_document() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(tmp.path(), "http://127.0.0.1:9/unused".into());
        let filename = state
            .orchestrator
            .store()
            .save(b"PK fake docx", "Runbook.docx")
            .await
            .unwrap();
        let base = spawn_app(state).await;

        let response = reqwest::get(format!("{base}/download/doc/{filename}"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"SOP-"));
        assert!(disposition.ends_with(".docx\""));
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"PK fake docx");
    }

    #[tokio::test]
    async fn test_download_missing_document() {
        let tmp = tempfile::tempdir().unwrap();
        let base = spawn_app(state(tmp.path(), "http://127.0.0.1:9/unused".into())).await;

        let response = reqwest::get(format!("{base}/download/doc/nope.docx")).await.unwrap();
        assert_eq!(response.status(), 404);

        let response = reqwest::get(format!("{base}/download/doc/..%2Fsecret.docx"))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
