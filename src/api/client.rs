//! HTTP client for the diagnosis backend.
//!
//! [`DiagnosisBackend`] is the seam between the session controller and the
//! network: the TUI talks to [`HttpBackend`], tests talk to a scripted fake.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::Sender;

use super::error::{ApiError, extract_detail};
use super::sse::{FinalizeEvent, FinalizeStream};
use super::types::{
    AnalyzeRequest, Assessment, DiagnosisEnvelope, HealthStatus, ImageUpload, MessageReply,
    NewMessage, SessionCreated, SessionSnapshot, UploadedImage,
};

#[async_trait]
pub trait DiagnosisBackend: Send + Sync {
    /// `POST /v1/sessions` → new session id.
    async fn create_session(&self) -> Result<String, ApiError>;

    /// `POST /v1/sessions/{id}/messages`.
    async fn send_message(&self, session_id: &str, content: &str)
    -> Result<MessageReply, ApiError>;

    /// `POST /v1/sessions/{id}/images` (multipart `file`).
    async fn upload_image(
        &self,
        session_id: &str,
        image: ImageUpload,
    ) -> Result<UploadedImage, ApiError>;

    /// `GET /v1/sessions/{id}`.
    async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ApiError>;

    /// `GET /v1/sessions/{id}/diagnosis`.
    async fn get_diagnosis(&self, session_id: &str) -> Result<Assessment, ApiError>;

    /// `GET /v1/sessions/{id}/finalize`, forwarding events until a terminal one.
    async fn stream_finalize(
        &self,
        session_id: &str,
        sender: Sender<FinalizeEvent>,
    ) -> Result<(), ApiError>;

    /// `POST /v1/analyze` one-shot case analysis.
    async fn analyze_case(&self, case_text: &str) -> Result<Assessment, ApiError>;

    /// `GET /health`.
    async fn health(&self) -> Result<bool, ApiError>;
}

/// Backend reached over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    /// Per-request timeout for request/response calls.
    timeout: Duration,
}

impl HttpBackend {
    /// Creates a client for `base_url` (e.g. `http://localhost:8000`).
    ///
    /// `timeout` bounds plain request/response calls; the finalize stream is
    /// long-lived and is not subject to it.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/v1/sessions/{id}[/{tail}]` with the session id percent-encoded as a
    /// single path segment.
    fn session_url(&self, session_id: &str, tail: Option<&str>) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&self.url("/v1/sessions"))
            .map_err(|e| ApiError::Network(format!("invalid backend URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("invalid backend URL {}", self.base_url)))?
            .push(session_id)
            .extend(tail);
        Ok(url)
    }

    /// Turns a non-success response into `ApiError::Status`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        debug!("Backend response status: {}", status);
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Backend error: {} - {}", status.as_u16(), body);
        Err(ApiError::Status {
            status: status.as_u16(),
            message: extract_detail(&body),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::check(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Unexpected body ({}): {}", e, body);
            ApiError::Parse(e.to_string())
        })
    }

    fn timed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.timeout(self.timeout)
    }
}

#[async_trait]
impl DiagnosisBackend for HttpBackend {
    async fn create_session(&self) -> Result<String, ApiError> {
        let response = self
            .timed(self.client.post(self.url("/v1/sessions")))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let created: SessionCreated = Self::read_json(response).await?;
        info!("Session created: {}", created.id);
        Ok(created.id)
    }

    async fn send_message(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<MessageReply, ApiError> {
        debug!("Sending message to session {} ({} bytes)", session_id, content.len());
        let response = self
            .timed(
                self.client
                    .post(self.session_url(session_id, Some("messages"))?),
            )
            .json(&NewMessage { content })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn upload_image(
        &self,
        session_id: &str,
        image: ImageUpload,
    ) -> Result<UploadedImage, ApiError> {
        info!(
            "Uploading {} ({} bytes, {}) to session {}",
            image.file_name,
            image.bytes.len(),
            image.mime,
            session_id
        );
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime)
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .timed(
                self.client
                    .post(self.session_url(session_id, Some("images"))?),
            )
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ApiError> {
        let response = self
            .timed(self.client.get(self.session_url(session_id, None)?))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_diagnosis(&self, session_id: &str) -> Result<Assessment, ApiError> {
        let response = self
            .timed(
                self.client
                    .get(self.session_url(session_id, Some("diagnosis"))?),
            )
            .send()
            .await?;
        let envelope: DiagnosisEnvelope = Self::read_json(response).await?;
        Ok(envelope.assessment)
    }

    async fn stream_finalize(
        &self,
        session_id: &str,
        sender: Sender<FinalizeEvent>,
    ) -> Result<(), ApiError> {
        info!("Opening finalize stream for session {}", session_id);
        let response = self
            .client
            .get(self.session_url(session_id, Some("finalize"))?)
            .header("Accept", "text/event-stream")
            .send()
            .await?;
        let response = Self::check(response).await?;

        let mut stream = FinalizeStream::from_response(session_id, response);
        stream.pump(&sender).await
    }

    async fn analyze_case(&self, case_text: &str) -> Result<Assessment, ApiError> {
        let response = self
            .timed(self.client.post(self.url("/v1/analyze")))
            .json(&AnalyzeRequest { case_text })
            .send()
            .await?;
        let envelope: DiagnosisEnvelope = Self::read_json(response).await?;
        Ok(envelope.assessment)
    }

    async fn health(&self) -> Result<bool, ApiError> {
        let response = self.timed(self.client.get(self.url("/health"))).send().await?;
        let status: HealthStatus = Self::read_json(response).await?;
        Ok(status.ok)
    }
}
