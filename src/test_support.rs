//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc::Sender;

use crate::api::types::MessageMetadata;
use crate::api::{
    ActionItem, ApiError, Assessment, DiagnosisBackend, Differential, FinalizeEvent, ImageUpload,
    MessageReply, RedFlag, SessionSnapshot, Severity, Soap, UploadedImage, Urgency,
};
use crate::core::state::App;

/// Creates a test App pointed at a dummy URL with no resync delay.
pub fn test_app() -> App {
    App::new("http://test".to_string(), Duration::ZERO)
}

/// An assistant reply, optionally carrying the final-diagnosis marker.
pub fn reply(content: &str, final_diagnosis: bool) -> MessageReply {
    MessageReply {
        id: format!("srv-{}", uuid::Uuid::new_v4()),
        content: content.to_string(),
        images: Vec::new(),
        timestamp: Utc::now(),
        message_metadata: final_diagnosis.then(|| MessageMetadata {
            final_diagnosis: Some(serde_json::json!({ "ready": true })),
        }),
    }
}

/// A small but complete report.
pub fn assessment_fixture() -> Assessment {
    Assessment {
        patient_summary: "34-year-old with three days of fever and sore throat.".into(),
        differentials: vec![
            Differential {
                name: "Streptococcal pharyngitis".into(),
                likelihood: 62.0,
                reasoning: "Fever, tonsillar exudate, no cough.".into(),
                urgency: Urgency::Urgent,
                general_causes: vec!["Group A streptococcus".into()],
                patient_specific_factors: vec![],
                risk_factors: vec!["Close contact with children".into()],
                supporting_findings: vec!["Tender anterior nodes".into()],
                contradicting_findings: vec![],
                prognosis: Some("Good with antibiotics".into()),
                complications: vec!["Peritonsillar abscess".into()],
                recommended_tests: vec!["Rapid antigen test".into()],
                treatment_summary: None,
            },
            Differential {
                name: "Viral pharyngitis".into(),
                likelihood: 30.0,
                reasoning: "Common presentation.".into(),
                urgency: Urgency::Routine,
                general_causes: vec![],
                patient_specific_factors: vec![],
                risk_factors: vec![],
                supporting_findings: vec![],
                contradicting_findings: vec![],
                prognosis: None,
                complications: vec![],
                recommended_tests: vec![],
                treatment_summary: None,
            },
        ],
        red_flags: vec![RedFlag {
            severity: Severity::Warning,
            message: "Difficulty swallowing saliva".into(),
            rationale: "May indicate airway compromise.".into(),
        }],
        action_plan: vec![ActionItem {
            priority: Urgency::Immediate,
            action: "Seek care if breathing becomes difficult".into(),
            rationale: String::new(),
        }],
        soap: Some(Soap {
            subjective: "Sore throat for 3 days".into(),
            objective: "Temp 38.9C".into(),
            assessment: "Likely strep".into(),
            plan: "Rapid strep test".into(),
        }),
        missing_questions: vec!["Any rash?".into()],
        limitations: None,
    }
}

/// Backend that replays queued results and counts calls.
///
/// An empty queue answers with a generic error, so tests only script the
/// calls they care about.
#[derive(Default)]
pub struct ScriptedBackend {
    pub sessions: Mutex<VecDeque<Result<String, ApiError>>>,
    pub replies: Mutex<VecDeque<Result<MessageReply, ApiError>>>,
    pub uploads: Mutex<VecDeque<Result<UploadedImage, ApiError>>>,
    pub snapshots: Mutex<VecDeque<Result<SessionSnapshot, ApiError>>>,
    pub diagnoses: Mutex<VecDeque<Result<Assessment, ApiError>>>,
    /// Events emitted by `stream_finalize`, followed by its return value.
    pub finalize: Mutex<Option<(Vec<FinalizeEvent>, Result<(), ApiError>)>>,
    pub create_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub diagnosis_calls: AtomicUsize,
    pub finalize_calls: AtomicUsize,
    pub uploaded: Mutex<Vec<ImageUpload>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_session(&self, result: Result<String, ApiError>) -> &Self {
        lock(&self.sessions).push_back(result);
        self
    }

    pub fn push_reply(&self, result: Result<MessageReply, ApiError>) -> &Self {
        lock(&self.replies).push_back(result);
        self
    }

    pub fn push_upload(&self, result: Result<UploadedImage, ApiError>) -> &Self {
        lock(&self.uploads).push_back(result);
        self
    }

    pub fn push_snapshot(&self, result: Result<SessionSnapshot, ApiError>) -> &Self {
        lock(&self.snapshots).push_back(result);
        self
    }

    pub fn push_diagnosis(&self, result: Result<Assessment, ApiError>) -> &Self {
        lock(&self.diagnoses).push_back(result);
        self
    }

    pub fn set_finalize(&self, events: Vec<FinalizeEvent>, result: Result<(), ApiError>) {
        *lock(&self.finalize) = Some((events, result));
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>) -> Result<T, ApiError> {
    lock(queue)
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())))
}

#[async_trait]
impl DiagnosisBackend for ScriptedBackend {
    async fn create_session(&self) -> Result<String, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.sessions)
    }

    async fn send_message(&self, _session_id: &str, _content: &str) -> Result<MessageReply, ApiError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.replies)
    }

    async fn upload_image(
        &self,
        _session_id: &str,
        image: ImageUpload,
    ) -> Result<UploadedImage, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.uploaded).push(image);
        next(&self.uploads)
    }

    async fn get_session(&self, _session_id: &str) -> Result<SessionSnapshot, ApiError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.snapshots)
    }

    async fn get_diagnosis(&self, _session_id: &str) -> Result<Assessment, ApiError> {
        self.diagnosis_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.diagnoses)
    }

    async fn stream_finalize(
        &self,
        _session_id: &str,
        sender: Sender<FinalizeEvent>,
    ) -> Result<(), ApiError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.finalize).take();
        let Some((events, result)) = script else {
            return Err(ApiError::Stream("no scripted stream".into()));
        };
        for event in events {
            if sender.send(event).await.is_err() {
                break;
            }
        }
        result
    }

    async fn analyze_case(&self, _case_text: &str) -> Result<Assessment, ApiError> {
        self.diagnosis_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.diagnoses)
    }

    async fn health(&self) -> Result<bool, ApiError> {
        Ok(true)
    }
}
