//! Server-Sent Events support for the finalize endpoint.
//!
//! `GET /v1/sessions/{id}/finalize` emits named events:
//!
//! ```text
//! event: progress
//! data: {"message": "Reviewing red flags"}
//!
//! event: complete
//! data: {"assessment": {...}}
//! ```
//!
//! [`SseParser`] turns raw bytes into frames, [`FinalizeStream`] turns frames
//! into [`FinalizeEvent`]s and owns the connection. The connection is released
//! by [`FinalizeStream::close`], which runs on every terminal path and again
//! from `Drop` (so an aborted task also lets go of the socket).

use std::collections::VecDeque;

use futures::StreamExt;
use futures::stream::BoxStream;
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc::Sender;

use super::error::ApiError;
use super::types::{Assessment, DiagnosisEnvelope};

// ============================================================================
// Frame parsing
// ============================================================================

/// One dispatched SSE event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE parser. Handles frames split across network chunks,
/// multi-line `data:` fields, comments and CRLF line endings.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every frame completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Flush whatever is pending when the connection ends without a trailing blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry are not used by this backend
            _ => debug!("Ignoring SSE field '{}'", field),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take(),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(frame)
    }
}

// ============================================================================
// Finalize events
// ============================================================================

/// What the finalize stream reports to the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeEvent {
    Progress(String),
    Complete(Box<Assessment>),
    Error(String),
}

impl FinalizeEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FinalizeEvent::Complete(_) | FinalizeEvent::Error(_))
    }
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Interpret a frame. Unnamed or unknown events yield `None`.
pub fn parse_frame(frame: &SseFrame) -> Option<FinalizeEvent> {
    match frame.event.as_deref() {
        Some("progress") => {
            let text = serde_json::from_str::<MessagePayload>(&frame.data)
                .ok()
                .and_then(|p| p.message)
                .unwrap_or_else(|| frame.data.clone());
            Some(FinalizeEvent::Progress(text))
        }
        Some("complete") => {
            let parsed = serde_json::from_str::<DiagnosisEnvelope>(&frame.data)
                .map(|env| env.assessment)
                .or_else(|_| serde_json::from_str::<Assessment>(&frame.data));
            Some(match parsed {
                Ok(assessment) => FinalizeEvent::Complete(Box::new(assessment)),
                Err(e) => {
                    warn!("Malformed complete event: {}", e);
                    FinalizeEvent::Error("the final report could not be read".to_string())
                }
            })
        }
        Some("error") => {
            let text = serde_json::from_str::<MessagePayload>(&frame.data)
                .ok()
                .and_then(|p| p.message.or(p.detail))
                .unwrap_or_else(|| frame.data.clone());
            let text = if text.trim().is_empty() {
                "the service reported an error".to_string()
            } else {
                text
            };
            Some(FinalizeEvent::Error(text))
        }
        Some(other) => {
            debug!("Ignoring SSE event '{}': {} bytes", other, frame.data.len());
            None
        }
        None => {
            debug!("Ignoring unnamed SSE frame: {} bytes", frame.data.len());
            None
        }
    }
}

// ============================================================================
// Stream guard
// ============================================================================

pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

/// An open finalize subscription.
pub struct FinalizeStream {
    session_id: String,
    source: Option<ByteStream>,
    parser: SseParser,
    pending: VecDeque<FinalizeEvent>,
}

impl FinalizeStream {
    pub fn from_response(session_id: &str, response: reqwest::Response) -> Self {
        let source = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ApiError::from))
            .boxed();
        Self::from_stream(session_id, source)
    }

    pub fn from_stream(session_id: &str, source: ByteStream) -> Self {
        info!("Finalize stream opened for session {}", session_id);
        Self {
            session_id: session_id.to_string(),
            source: Some(source),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Release the connection. Idempotent.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            info!("Finalize stream closed for session {}", self.session_id);
        }
    }

    /// Next meaningful event. `Ok(None)` once the stream is exhausted or closed.
    pub async fn next_event(&mut self) -> Result<Option<FinalizeEvent>, ApiError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            let Some(source) = self.source.as_mut() else {
                return Ok(None);
            };

            match source.next().await {
                Some(Ok(bytes)) => {
                    debug!("Finalize chunk received: {} bytes", bytes.len());
                    let frames = self.parser.feed(&bytes);
                    self.pending.extend(frames.iter().filter_map(parse_frame));
                }
                Some(Err(e)) => {
                    self.close();
                    return Err(e);
                }
                None => {
                    if let Some(event) = self.parser.finish().as_ref().and_then(parse_frame) {
                        self.pending.push_back(event);
                    }
                    self.close();
                }
            }
        }
    }

    /// Forward events to `sender` until a terminal event, then close.
    ///
    /// Returns `Err(ApiError::Stream)` if the connection ends before `complete`
    /// or `error` arrived.
    pub async fn pump(&mut self, sender: &Sender<FinalizeEvent>) -> Result<(), ApiError> {
        let result = self.pump_inner(sender).await;
        self.close();
        result
    }

    async fn pump_inner(&mut self, sender: &Sender<FinalizeEvent>) -> Result<(), ApiError> {
        let mut forwarded = 0usize;
        while let Some(event) = self.next_event().await? {
            forwarded += 1;
            let terminal = event.is_terminal();
            if sender.send(event).await.is_err() {
                warn!("Finalize event send failed: receiver dropped");
                return Ok(());
            }
            if terminal {
                debug!("Finalize stream terminal after {} events", forwarded);
                return Ok(());
            }
        }
        Err(ApiError::Stream(
            "connection ended before the report was ready".to_string(),
        ))
    }
}

impl Drop for FinalizeStream {
    fn drop(&mut self) {
        self.close();
    }
}
