//! # Backend API
//!
//! Typed access to the clinical-reasoning service: JSON wire types, the
//! HTTP client, and the SSE finalize stream.

pub mod client;
pub mod error;
pub mod sse;
pub mod types;

pub use client::{DiagnosisBackend, HttpBackend};
pub use error::ApiError;
pub use sse::{FinalizeEvent, FinalizeStream};
pub use types::{
    ActionItem, Assessment, ChatMessage, Differential, ImageUpload, MessageReply, RedFlag, Role,
    SessionSnapshot, SessionStatus, Severity, Soap, UploadedImage, Urgency,
};
