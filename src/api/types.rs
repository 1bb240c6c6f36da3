//! Wire types for the diagnosis backend.
//!
//! These mirror the JSON bodies of the `/v1/sessions` API. Tiered values
//! (urgency, priority, severity) keep unknown strings instead of failing the
//! whole payload, so a report with one unexpected value still renders.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Messages
// ============================================================================

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One chat turn as the backend reports it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(deserialize_with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Builds a client-side message that has not been confirmed by the server yet.
    pub fn optimistic(content: String, images: Vec<String>) -> Self {
        Self {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            role: Role::User,
            content,
            images,
            timestamp: Utc::now(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("local-")
    }
}

/// Extra data attached to an assistant reply.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MessageMetadata {
    /// Present once the backend has settled on a diagnosis for the session.
    #[serde(default)]
    pub final_diagnosis: Option<serde_json::Value>,
}

/// Response body of `POST /v1/sessions/{id}/messages`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageReply {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(deserialize_with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message_metadata: Option<MessageMetadata>,
}

impl MessageReply {
    pub fn signals_final_diagnosis(&self) -> bool {
        self.message_metadata
            .as_ref()
            .and_then(|m| m.final_diagnosis.as_ref())
            .is_some_and(|v| !v.is_null())
    }

    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            role: Role::Assistant,
            content: self.content,
            images: self.images,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct NewMessage<'a> {
    pub content: &'a str,
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionCreated {
    pub id: String,
}

/// Response body of `GET /v1/sessions/{id}`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SessionSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// A local image ready to be sent as multipart `file`.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Guesses the MIME type from the file extension.
    pub fn new(file_name: String, bytes: Vec<u8>) -> Self {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            _ => "application/octet-stream",
        };
        Self {
            file_name,
            mime: mime.to_string(),
            bytes,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DiagnosisEnvelope {
    pub assessment: Assessment,
}

#[derive(Serialize, Debug)]
pub struct AnalyzeRequest<'a> {
    pub case_text: &'a str,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HealthStatus {
    #[serde(default)]
    pub ok: bool,
}

// ============================================================================
// Assessment
// ============================================================================

/// Structured diagnostic report, produced once per session by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Assessment {
    #[serde(default)]
    pub patient_summary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub differentials: Vec<Differential>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub red_flags: Vec<RedFlag>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub action_plan: Vec<ActionItem>,
    #[serde(default)]
    pub soap: Option<Soap>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub missing_questions: Vec<String>,
    #[serde(default)]
    pub limitations: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Differential {
    pub name: String,
    #[serde(default)]
    pub likelihood: f64,
    #[serde(default)]
    pub reasoning: String,
    pub urgency: Urgency,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub general_causes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patient_specific_factors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub risk_factors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub supporting_findings: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contradicting_findings: Vec<String>,
    #[serde(default)]
    pub prognosis: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub complications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub treatment_summary: Option<String>,
}

impl Differential {
    /// Whether any of the extended clinical detail fields carry content.
    pub fn has_details(&self) -> bool {
        !self.general_causes.is_empty()
            || !self.patient_specific_factors.is_empty()
            || !self.risk_factors.is_empty()
            || !self.supporting_findings.is_empty()
            || !self.contradicting_findings.is_empty()
            || self.prognosis.as_deref().is_some_and(|s| !s.is_empty())
            || !self.complications.is_empty()
            || !self.recommended_tests.is_empty()
            || self.treatment_summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RedFlag {
    pub severity: Severity,
    pub message: String,
    #[serde(default, rename = "why_it_matters")]
    pub rationale: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionItem {
    pub priority: Urgency,
    pub action: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Soap {
    #[serde(default)]
    pub subjective: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub assessment: String,
    #[serde(default)]
    pub plan: String,
}

/// Urgency of a differential, or priority of an action-plan item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Urgency {
    Immediate,
    Urgent,
    Routine,
    /// Any value outside the fixed set, kept verbatim.
    Unknown(String),
}

impl From<String> for Urgency {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "immediate" => Urgency::Immediate,
            "urgent" => Urgency::Urgent,
            "routine" => Urgency::Routine,
            _ => Urgency::Unknown(raw),
        }
    }
}

impl From<Urgency> for String {
    fn from(value: Urgency) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Immediate => f.write_str("immediate"),
            Urgency::Urgent => f.write_str("urgent"),
            Urgency::Routine => f.write_str("routine"),
            Urgency::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Severity of a red flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Unknown(String),
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            _ => Severity::Unknown(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => f.write_str("critical"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
            Severity::Unknown(raw) => f.write_str(raw),
        }
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

/// The backend uses integer primary keys for messages; keep them as strings.
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Accepts RFC 3339 timestamps and offset-less ones, which the backend
/// writes for naive UTC columns.
fn utc_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}

/// Treats an explicit `null` list the same as a missing one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
