//! # Application State
//!
//! Core session state for the chat client. Domain data only; presentation
//! state (scroll offsets, expanded panels, the input buffer) lives in `tui`.
//!
//! ```text
//! App
//! ├── epoch: u64                      // bumps on every new session
//! ├── session_id: Option<String>      // None until the backend creates one
//! ├── status: SessionStatus           // active | completed
//! ├── messages: Vec<ChatMessage>      // append-only, replaced on resync
//! ├── assessment: Option<Assessment>  // final diagnostic report
//! ├── creating_session / is_typing / is_uploading /
//! │   loading_diagnosis / finalizing  // in-flight flags
//! ├── analyzing_image: Option<String> // uploaded image awaiting resync
//! ├── progress: Option<String>        // latest finalize progress text
//! ├── error: Option<String>           // user-facing error banner
//! └── draft_to_restore: Option<String>// text handed back after a failed send
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::time::Duration;

use crate::api::{Assessment, ChatMessage, SessionStatus};
use crate::core::config::ResolvedConfig;

pub struct App {
    pub api_url: String,
    /// Delay before re-reading the message list after an image upload.
    pub resync_delay: Duration,
    /// Session incarnation; results tagged with an older epoch are dropped.
    pub epoch: u64,
    pub session_id: Option<String>,
    pub status: SessionStatus,
    pub messages: Vec<ChatMessage>,
    pub assessment: Option<Assessment>,
    pub creating_session: bool,
    pub is_typing: bool,
    pub is_uploading: bool,
    pub analyzing_image: Option<String>,
    pub loading_diagnosis: bool,
    pub finalizing: bool,
    pub progress: Option<String>,
    pub error: Option<String>,
    pub status_message: String,
    pub draft_to_restore: Option<String>,
}

impl App {
    pub fn new(api_url: String, resync_delay: Duration) -> Self {
        Self {
            api_url,
            resync_delay,
            epoch: 0,
            session_id: None,
            status: SessionStatus::Active,
            messages: Vec::new(),
            assessment: None,
            creating_session: false,
            is_typing: false,
            is_uploading: false,
            analyzing_image: None,
            loading_diagnosis: false,
            finalizing: false,
            progress: None,
            error: None,
            status_message: String::new(),
            draft_to_restore: None,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.api_url.clone(), config.resync_delay)
    }

    /// Drop everything tied to the current session and start a new epoch.
    pub fn reset(&mut self) {
        let api_url = std::mem::take(&mut self.api_url);
        let epoch = self.epoch + 1;
        *self = App::new(api_url, self.resync_delay);
        self.epoch = epoch;
    }

    /// True while a backend-mutating call is outstanding. New submissions are
    /// rejected in this state.
    pub fn is_busy(&self) -> bool {
        self.creating_session
            || self.is_typing
            || self.is_uploading
            || self.loading_diagnosis
            || self.finalizing
    }

    /// Whether the action targets the current session incarnation.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Text for the title bar, most pressing state first.
    pub fn status_line(&self) -> String {
        if self.creating_session {
            "Starting session...".to_string()
        } else if self.finalizing {
            self.progress
                .clone()
                .unwrap_or_else(|| "Generating diagnosis...".to_string())
        } else if self.is_uploading {
            "Uploading image...".to_string()
        } else if self.is_typing {
            "Assistant is typing...".to_string()
        } else if self.loading_diagnosis {
            "Loading diagnostic report...".to_string()
        } else if self.analyzing_image.is_some() {
            "Analyzing image...".to_string()
        } else {
            self.status_message.clone()
        }
    }

    pub fn short_session_id(&self) -> &str {
        match self.session_id.as_deref() {
            Some(id) => id.get(..8).unwrap_or(id),
            None => "-",
        }
    }
}
