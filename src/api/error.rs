use std::fmt;

/// Errors that can occur while talking to the diagnosis backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response at all (timeout, DNS, connection refused).
    Network(String),
    /// The backend answered with a non-success status.
    Status { status: u16, message: String },
    /// The body did not have the expected shape.
    Parse(String),
    /// The finalize stream reported an error or ended without a result.
    Stream(String),
    /// Reading a local file for upload failed.
    Io(String),
}

impl ApiError {
    /// Short text suitable for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the diagnosis service".to_string(),
            ApiError::Status { status, message } if message.is_empty() => {
                format!("The service returned an error (HTTP {status})")
            }
            ApiError::Status { status, message } => {
                format!("The service returned an error (HTTP {status}): {message}")
            }
            ApiError::Parse(_) => "Unexpected response from the service".to_string(),
            ApiError::Stream(msg) => format!("Diagnosis generation failed: {msg}"),
            ApiError::Io(msg) => format!("Could not read file: {msg}"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Status { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
            ApiError::Stream(msg) => write!(f, "stream error: {msg}"),
            ApiError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Io(e.to_string())
    }
}

/// Pulls a readable message out of an error body.
///
/// FastAPI wraps errors as `{"detail": ...}` where detail is either a string
/// or a list of validation errors with `msg` fields.
pub fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.trim().to_string(),
    }
}
