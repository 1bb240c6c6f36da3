//! # Effect Runner
//!
//! Performs the I/O that `update()` asks for and reports the outcome back as
//! an [`Action`] over the event loop's channel. Each effect runs as its own
//! tokio task; the returned abort handle lets the event loop cancel it when a
//! new session starts.
//!
//! ```text
//! Effect::SendMessage ──► backend.send_message() ──► Action::ReplyReceived
//!                                                └─► Action::SendFailed
//! ```

use std::fmt;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::AbortHandle;

use crate::api::{ApiError, Assessment, DiagnosisBackend, FinalizeEvent, ImageUpload};
use crate::core::action::{Action, Effect};
use crate::core::config::ResolvedConfig;

/// Linear backoff for session creation: wait `base_delay × attempt` after
/// each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            attempts: config.create_attempts.max(1),
            base_delay: config.retry_base_delay,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResolvedConfig::default())
    }
}

pub async fn create_session_with_retry(
    backend: &dyn DiagnosisBackend,
    policy: &RetryPolicy,
) -> Result<String, ApiError> {
    let mut attempt = 1;
    loop {
        match backend.create_session().await {
            Ok(id) => return Ok(id),
            Err(e) if attempt < policy.attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Session creation attempt {}/{} failed: {}; retrying in {:?}",
                    attempt, policy.attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Session creation failed after {} attempts: {}", attempt, e);
                return Err(e);
            }
        }
    }
}

/// Run one effect to completion, sending resulting actions on `tx`.
pub async fn run(
    effect: Effect,
    backend: &dyn DiagnosisBackend,
    policy: &RetryPolicy,
    tx: &mpsc::Sender<Action>,
) {
    match effect {
        Effect::None | Effect::Quit => {}

        Effect::Restart { epoch } => {
            let action = match create_session_with_retry(backend, policy).await {
                Ok(session_id) => Action::SessionCreated { epoch, session_id },
                Err(error) => Action::SessionCreateFailed { epoch, error },
            };
            send(tx, action);
        }

        Effect::SendMessage {
            epoch,
            session_id,
            local_id,
            text,
        } => {
            let action = match backend.send_message(&session_id, &text).await {
                Ok(reply) => Action::ReplyReceived {
                    epoch,
                    local_id,
                    reply,
                },
                Err(error) => Action::SendFailed {
                    epoch,
                    local_id,
                    text,
                    error,
                },
            };
            send(tx, action);
        }

        Effect::UploadImage {
            epoch,
            session_id,
            path,
        } => {
            let action = match read_image(&path).await {
                Ok(upload) => {
                    let file_name = upload.file_name.clone();
                    match backend.upload_image(&session_id, upload).await {
                        Ok(image) => Action::ImageUploaded {
                            epoch,
                            file_name,
                            image,
                        },
                        Err(error) => Action::UploadFailed { epoch, error },
                    }
                }
                Err(error) => Action::UploadFailed { epoch, error },
            };
            send(tx, action);
        }

        Effect::Resync {
            epoch,
            session_id,
            delay,
        } => {
            if !delay.is_zero() {
                debug!("Resync for {} in {:?}", session_id, delay);
                tokio::time::sleep(delay).await;
            }
            let action = match backend.get_session(&session_id).await {
                Ok(snapshot) => Action::SessionSynced { epoch, snapshot },
                Err(error) => Action::RefreshFailed { epoch, error },
            };
            send(tx, action);
        }

        Effect::FetchDiagnosis { epoch, session_id } => {
            let action = match backend.get_diagnosis(&session_id).await {
                Ok(assessment) => Action::DiagnosisLoaded {
                    epoch,
                    assessment: Box::new(assessment),
                },
                Err(error) => Action::DiagnosisFailed { epoch, error },
            };
            send(tx, action);
        }

        Effect::OpenFinalizeStream { epoch, session_id } => {
            let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<FinalizeEvent>(32);

            let stream = backend.stream_finalize(&session_id, event_tx);
            let forward = async move {
                let mut saw_terminal = false;
                while let Some(event) = event_rx.recv().await {
                    saw_terminal |= event.is_terminal();
                    if !send(tx, Action::Finalize { epoch, event }) {
                        break;
                    }
                }
                saw_terminal
            };

            let (result, saw_terminal) = tokio::join!(stream, forward);
            match result {
                Ok(()) => info!("Finalize stream for {} finished", session_id),
                Err(error) if !saw_terminal => {
                    send(tx, Action::FinalizeFailed { epoch, error });
                }
                Err(error) => debug!("Finalize stream error after terminal event: {}", error),
            }
        }
    }
}

/// Spawn `effect` as a tokio task. Returns `None` for effects with no I/O.
pub fn spawn(
    effect: Effect,
    backend: Arc<dyn DiagnosisBackend>,
    policy: RetryPolicy,
    tx: mpsc::Sender<Action>,
) -> Option<AbortHandle> {
    if matches!(effect, Effect::None | Effect::Quit) {
        return None;
    }
    debug!("Spawning effect: {:?}", effect);
    let handle = tokio::spawn(async move {
        run(effect, backend.as_ref(), &policy, &tx).await;
    });
    Some(handle.abort_handle())
}

async fn read_image(path: &Path) -> Result<ImageUpload, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload::new(file_name, bytes))
}

fn send(tx: &mpsc::Sender<Action>, action: Action) -> bool {
    if tx.send(action).is_err() {
        warn!("Failed to send action: receiver dropped");
        return false;
    }
    true
}

// ============================================================================
// One-shot case analysis
// ============================================================================

pub const MIN_CASE_TEXT_CHARS: usize = 10;
pub const MAX_CASE_TEXT_CHARS: usize = 6000;

#[derive(Debug, PartialEq)]
pub enum AnalyzeError {
    TooShort(usize),
    TooLong(usize),
    Api(ApiError),
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzeError::TooShort(n) => write!(
                f,
                "case text too short ({n} characters, need at least {MIN_CASE_TEXT_CHARS})"
            ),
            AnalyzeError::TooLong(n) => write!(
                f,
                "case text too long ({n} characters, limit is {MAX_CASE_TEXT_CHARS})"
            ),
            AnalyzeError::Api(e) => write!(f, "{}", e.user_message()),
        }
    }
}

impl std::error::Error for AnalyzeError {}

impl From<ApiError> for AnalyzeError {
    fn from(e: ApiError) -> Self {
        AnalyzeError::Api(e)
    }
}

/// Trim and length-check free-text case notes before they go to the backend.
pub fn validate_case_text(raw: &str) -> Result<&str, AnalyzeError> {
    let text = raw.trim();
    let chars = text.chars().count();
    if chars < MIN_CASE_TEXT_CHARS {
        return Err(AnalyzeError::TooShort(chars));
    }
    if chars > MAX_CASE_TEXT_CHARS {
        return Err(AnalyzeError::TooLong(chars));
    }
    Ok(text)
}

pub async fn analyze_case(
    backend: &dyn DiagnosisBackend,
    raw: &str,
) -> Result<Assessment, AnalyzeError> {
    let text = validate_case_text(raw)?;
    info!("Analyzing case ({} characters)", text.chars().count());
    Ok(backend.analyze_case(text).await?)
}
