//! # Actions
//!
//! Everything that can happen in a session becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::ReplyReceived { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates the
//! state, and returns an [`Effect`] describing the I/O to perform next. No
//! I/O happens here; `core::effects` runs the effect and reports back with
//! another action.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Results from the backend carry the `epoch` they were issued under. After a
//! new session starts, late results from the old one are ignored.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};

use crate::api::{
    ApiError, Assessment, ChatMessage, FinalizeEvent, MessageReply, SessionSnapshot,
    SessionStatus, UploadedImage,
};
use crate::core::state::App;

const BUSY_NOTICE: &str = "Please wait for the current request to finish";
const NO_SESSION_NOTICE: &str = "No active session. Press Ctrl+N to start a new one";

#[derive(Debug)]
pub enum Action {
    // Session lifecycle
    NewSession,
    SessionCreated { epoch: u64, session_id: String },
    SessionCreateFailed { epoch: u64, error: ApiError },

    // Chat
    Submit(String),
    ReplyReceived {
        epoch: u64,
        local_id: String,
        reply: MessageReply,
    },
    SendFailed {
        epoch: u64,
        local_id: String,
        text: String,
        error: ApiError,
    },

    // Images
    UploadImage(PathBuf),
    ImageUploaded {
        epoch: u64,
        file_name: String,
        image: UploadedImage,
    },
    UploadFailed { epoch: u64, error: ApiError },

    // Server resync
    Refresh,
    SessionSynced {
        epoch: u64,
        snapshot: SessionSnapshot,
    },
    RefreshFailed { epoch: u64, error: ApiError },

    // Diagnosis
    LoadDiagnosis,
    DiagnosisLoaded {
        epoch: u64,
        assessment: Box<Assessment>,
    },
    DiagnosisFailed { epoch: u64, error: ApiError },
    ForceDiagnosis,
    Finalize { epoch: u64, event: FinalizeEvent },
    FinalizeFailed { epoch: u64, error: ApiError },

    DismissError,
    Quit,
}

/// I/O requested by `update()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    /// Abort in-flight work from older epochs, then create a session.
    Restart { epoch: u64 },
    SendMessage {
        epoch: u64,
        session_id: String,
        local_id: String,
        text: String,
    },
    UploadImage {
        epoch: u64,
        session_id: String,
        path: PathBuf,
    },
    /// Re-read the server's message list after `delay`.
    Resync {
        epoch: u64,
        session_id: String,
        delay: Duration,
    },
    FetchDiagnosis { epoch: u64, session_id: String },
    OpenFinalizeStream { epoch: u64, session_id: String },
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Quit => Effect::Quit,

        Action::NewSession => {
            app.reset();
            app.creating_session = true;
            info!("Starting session epoch {}", app.epoch);
            Effect::Restart { epoch: app.epoch }
        }

        Action::SessionCreated { epoch, session_id } => {
            if !app.is_current(epoch) {
                return stale("SessionCreated", epoch);
            }
            info!("Session ready: {}", session_id);
            app.creating_session = false;
            app.session_id = Some(session_id);
            app.status = SessionStatus::Active;
            app.status_message = "Session ready".to_string();
            Effect::None
        }

        Action::SessionCreateFailed { epoch, error } => {
            if !app.is_current(epoch) {
                return stale("SessionCreateFailed", epoch);
            }
            warn!("Session creation failed: {}", error);
            app.creating_session = false;
            app.session_id = None;
            app.messages.clear();
            app.error = Some(format!(
                "Could not start a session. {}",
                error.user_message()
            ));
            Effect::None
        }

        Action::Submit(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Effect::None;
            }
            let Some(session_id) = app.session_id.clone() else {
                app.error = Some(NO_SESSION_NOTICE.to_string());
                app.draft_to_restore = Some(text.to_string());
                return Effect::None;
            };
            if app.is_busy() {
                app.status_message = BUSY_NOTICE.to_string();
                app.draft_to_restore = Some(text.to_string());
                return Effect::None;
            }

            let message = ChatMessage::optimistic(text.to_string(), Vec::new());
            let local_id = message.id.clone();
            app.messages.push(message);
            app.is_typing = true;
            app.error = None;
            Effect::SendMessage {
                epoch: app.epoch,
                session_id,
                local_id,
                text: text.to_string(),
            }
        }

        Action::ReplyReceived {
            epoch,
            local_id,
            reply,
        } => {
            if !app.is_current(epoch) {
                return stale("ReplyReceived", epoch);
            }
            debug!("Reply received for {}", local_id);
            app.is_typing = false;
            let final_diagnosis = reply.signals_final_diagnosis();
            // A resync may already have brought this reply in
            if app.messages.iter().any(|m| m.id == reply.id) {
                debug!("Reply {} already present after resync", reply.id);
            } else {
                app.messages.push(reply.into_message());
            }

            if final_diagnosis && !app.loading_diagnosis {
                info!("Reply signals a final diagnosis, fetching report");
                match app.session_id.clone() {
                    Some(session_id) => {
                        app.loading_diagnosis = true;
                        Effect::FetchDiagnosis {
                            epoch: app.epoch,
                            session_id,
                        }
                    }
                    None => Effect::None,
                }
            } else {
                Effect::None
            }
        }

        Action::SendFailed {
            epoch,
            local_id,
            text,
            error,
        } => {
            if !app.is_current(epoch) {
                return stale("SendFailed", epoch);
            }
            warn!("Send failed: {}", error);
            app.is_typing = false;
            app.messages.retain(|m| m.id != local_id);
            app.error = Some(format!("Message not sent. {}", error.user_message()));
            app.draft_to_restore = Some(text);
            Effect::None
        }

        Action::UploadImage(path) => {
            let Some(session_id) = app.session_id.clone() else {
                app.error = Some(NO_SESSION_NOTICE.to_string());
                return Effect::None;
            };
            if app.is_busy() {
                app.status_message = BUSY_NOTICE.to_string();
                return Effect::None;
            }
            app.is_uploading = true;
            app.error = None;
            Effect::UploadImage {
                epoch: app.epoch,
                session_id,
                path,
            }
        }

        Action::ImageUploaded {
            epoch,
            file_name,
            image,
        } => {
            if !app.is_current(epoch) {
                return stale("ImageUploaded", epoch);
            }
            info!("Image uploaded: {}", image.url);
            app.is_uploading = false;
            app.messages.push(ChatMessage::optimistic(
                format!("Image uploaded: {file_name}"),
                vec![image.url.clone()],
            ));
            app.analyzing_image = Some(image.url);
            match app.session_id.clone() {
                Some(session_id) => Effect::Resync {
                    epoch: app.epoch,
                    session_id,
                    delay: app.resync_delay,
                },
                None => Effect::None,
            }
        }

        Action::UploadFailed { epoch, error } => {
            if !app.is_current(epoch) {
                return stale("UploadFailed", epoch);
            }
            warn!("Upload failed: {}", error);
            app.is_uploading = false;
            app.error = Some(format!("Image not uploaded. {}", error.user_message()));
            Effect::None
        }

        Action::Refresh => match app.session_id.clone() {
            Some(session_id) => Effect::Resync {
                epoch: app.epoch,
                session_id,
                delay: Duration::ZERO,
            },
            None => Effect::None,
        },

        Action::SessionSynced { epoch, snapshot } => {
            if !app.is_current(epoch) {
                return stale("SessionSynced", epoch);
            }
            app.analyzing_image = None;
            if snapshot.messages.len() > app.messages.len() {
                info!(
                    "Resync: server has {} messages, local {}; replacing",
                    snapshot.messages.len(),
                    app.messages.len()
                );
                app.messages = snapshot.messages;
            } else {
                debug!(
                    "Resync: server has {} messages, local {}; keeping local",
                    snapshot.messages.len(),
                    app.messages.len()
                );
            }

            if snapshot.status == Some(SessionStatus::Completed) {
                app.status = SessionStatus::Completed;
                if app.assessment.is_none()
                    && !app.loading_diagnosis
                    && let Some(session_id) = app.session_id.clone()
                {
                    app.loading_diagnosis = true;
                    return Effect::FetchDiagnosis {
                        epoch: app.epoch,
                        session_id,
                    };
                }
            }
            Effect::None
        }

        Action::RefreshFailed { epoch, error } => {
            if !app.is_current(epoch) {
                return stale("RefreshFailed", epoch);
            }
            warn!("Resync failed: {}", error);
            app.analyzing_image = None;
            app.error = Some(format!("Could not refresh the conversation. {}", error.user_message()));
            Effect::None
        }

        Action::LoadDiagnosis => {
            let Some(session_id) = app.session_id.clone() else {
                app.error = Some(NO_SESSION_NOTICE.to_string());
                return Effect::None;
            };
            if app.loading_diagnosis {
                return Effect::None;
            }
            app.loading_diagnosis = true;
            Effect::FetchDiagnosis {
                epoch: app.epoch,
                session_id,
            }
        }

        Action::DiagnosisLoaded { epoch, assessment } => {
            if !app.is_current(epoch) {
                return stale("DiagnosisLoaded", epoch);
            }
            info!(
                "Diagnosis loaded: {} differentials, {} red flags",
                assessment.differentials.len(),
                assessment.red_flags.len()
            );
            app.loading_diagnosis = false;
            app.assessment = Some(*assessment);
            app.status = SessionStatus::Completed;
            app.status_message = "Diagnostic report ready".to_string();
            Effect::None
        }

        Action::DiagnosisFailed { epoch, error } => {
            if !app.is_current(epoch) {
                return stale("DiagnosisFailed", epoch);
            }
            warn!("Diagnosis fetch failed: {}", error);
            app.loading_diagnosis = false;
            app.error = Some(format!("Could not load the report. {}", error.user_message()));
            Effect::None
        }

        Action::ForceDiagnosis => {
            let Some(session_id) = app.session_id.clone() else {
                app.error = Some(NO_SESSION_NOTICE.to_string());
                return Effect::None;
            };
            if app.is_busy() {
                app.status_message = BUSY_NOTICE.to_string();
                return Effect::None;
            }
            app.finalizing = true;
            app.progress = None;
            app.error = None;
            Effect::OpenFinalizeStream {
                epoch: app.epoch,
                session_id,
            }
        }

        Action::Finalize { epoch, event } => {
            if !app.is_current(epoch) {
                return stale("Finalize", epoch);
            }
            match event {
                FinalizeEvent::Progress(message) => {
                    debug!("Finalize progress: {}", message);
                    app.progress = Some(message);
                }
                FinalizeEvent::Complete(assessment) => {
                    info!("Finalize complete");
                    app.finalizing = false;
                    app.progress = None;
                    app.assessment = Some(*assessment);
                    app.status = SessionStatus::Completed;
                    app.status_message = "Diagnostic report ready".to_string();
                }
                FinalizeEvent::Error(message) => {
                    warn!("Finalize error event: {}", message);
                    app.finalizing = false;
                    app.progress = None;
                    app.error = Some(ApiError::Stream(message).user_message());
                }
            }
            Effect::None
        }

        Action::FinalizeFailed { epoch, error } => {
            if !app.is_current(epoch) {
                return stale("FinalizeFailed", epoch);
            }
            if app.finalizing {
                warn!("Finalize stream failed: {}", error);
                app.finalizing = false;
                app.progress = None;
                app.error = Some(error.user_message());
            }
            Effect::None
        }

        Action::DismissError => {
            app.error = None;
            Effect::None
        }
    }
}

fn stale(name: &str, epoch: u64) -> Effect {
    debug!("Dropping stale {} from epoch {}", name, epoch);
    Effect::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Role, Urgency};
    use crate::test_support::{assessment_fixture, reply, test_app};

    /// App with a live session at epoch 1.
    fn ready_app() -> App {
        let mut app = test_app();
        update(&mut app, Action::NewSession);
        let epoch = app.epoch;
        update(
            &mut app,
            Action::SessionCreated {
                epoch,
                session_id: "sess-1".into(),
            },
        );
        app
    }

    fn submit(app: &mut App, text: &str) -> (String, Effect) {
        let effect = update(app, Action::Submit(text.to_string()));
        let local_id = match &effect {
            Effect::SendMessage { local_id, .. } => local_id.clone(),
            _ => String::new(),
        };
        (local_id, effect)
    }

    #[test]
    fn test_new_session_requests_restart() {
        let mut app = test_app();
        let effect = update(&mut app, Action::NewSession);
        assert_eq!(effect, Effect::Restart { epoch: 1 });
        assert!(app.creating_session);
        assert!(app.is_busy());
    }

    #[test]
    fn test_session_created_sets_id() {
        let app = ready_app();
        assert_eq!(app.session_id.as_deref(), Some("sess-1"));
        assert!(!app.creating_session);
        assert_eq!(app.status, SessionStatus::Active);
    }

    #[test]
    fn test_session_create_failure_leaves_messages_empty() {
        let mut app = test_app();
        update(&mut app, Action::NewSession);
        let epoch = app.epoch;
        update(
            &mut app,
            Action::SessionCreateFailed {
                epoch,
                error: ApiError::Network("refused".into()),
            },
        );
        assert!(app.messages.is_empty());
        assert!(app.session_id.is_none());
        assert!(!app.creating_session);
        assert!(app.error.as_deref().unwrap().contains("Could not start a session"));
    }

    #[test]
    fn test_empty_submit_has_no_effect() {
        let mut app = ready_app();
        assert_eq!(update(&mut app, Action::Submit(String::new())), Effect::None);
        assert_eq!(update(&mut app, Action::Submit("  \n\t ".into())), Effect::None);
        assert!(app.messages.is_empty());
        assert!(!app.is_typing);
    }

    #[test]
    fn test_submit_trims_and_appends_one_user_message() {
        let mut app = ready_app();
        let (local_id, effect) = submit(&mut app, "  I have a headache  ");

        assert_eq!(
            effect,
            Effect::SendMessage {
                epoch: 1,
                session_id: "sess-1".into(),
                local_id: local_id.clone(),
                text: "I have a headache".into(),
            }
        );
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.messages[0].content, "I have a headache");
        assert!(app.is_typing);
    }

    #[test]
    fn test_reply_appends_assistant_after_user() {
        let mut app = ready_app();
        let (local_id, _) = submit(&mut app, "hello");
        let effect = update(
            &mut app,
            Action::ReplyReceived {
                epoch: 1,
                local_id,
                reply: reply("How long has it hurt?", false),
            },
        );

        assert_eq!(effect, Effect::None);
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.messages[1].role, Role::Assistant);
        assert!(!app.is_typing);
    }

    #[test]
    fn test_final_diagnosis_marker_triggers_one_fetch() {
        let mut app = ready_app();
        let (local_id, _) = submit(&mut app, "that's all");
        let effect = update(
            &mut app,
            Action::ReplyReceived {
                epoch: 1,
                local_id: local_id.clone(),
                reply: reply("I have enough information.", true),
            },
        );
        assert_eq!(
            effect,
            Effect::FetchDiagnosis {
                epoch: 1,
                session_id: "sess-1".into()
            }
        );
        assert!(app.loading_diagnosis);

        // A second marker while the fetch is outstanding does not duplicate it
        let effect = update(
            &mut app,
            Action::ReplyReceived {
                epoch: 1,
                local_id,
                reply: reply("Still working.", true),
            },
        );
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn test_send_failure_rolls_back_optimistic_message() {
        let mut app = ready_app();
        let (local_id, _) = submit(&mut app, "hello");
        update(
            &mut app,
            Action::SendFailed {
                epoch: 1,
                local_id,
                text: "hello".into(),
                error: ApiError::Status {
                    status: 500,
                    message: "boom".into(),
                },
            },
        );

        assert!(app.messages.is_empty());
        assert!(!app.is_typing);
        assert_eq!(app.draft_to_restore.as_deref(), Some("hello"));
        assert!(app.error.as_deref().unwrap().contains("HTTP 500"));
    }

    #[test]
    fn test_overlapping_submit_is_rejected() {
        let mut app = ready_app();
        submit(&mut app, "first");
        let (_, effect) = submit(&mut app, "second");

        assert_eq!(effect, Effect::None);
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.status_message, BUSY_NOTICE);
        assert_eq!(app.draft_to_restore.as_deref(), Some("second"));
    }

    #[test]
    fn test_submit_without_session_reports_error() {
        let mut app = test_app();
        let (_, effect) = submit(&mut app, "hello");
        assert_eq!(effect, Effect::None);
        assert_eq!(app.error.as_deref(), Some(NO_SESSION_NOTICE));
    }

    #[test]
    fn test_upload_appends_message_with_exact_url() {
        let mut app = ready_app();
        let effect = update(&mut app, Action::UploadImage("/tmp/rash.png".into()));
        assert!(matches!(effect, Effect::UploadImage { .. }));
        assert!(app.is_uploading);

        let effect = update(
            &mut app,
            Action::ImageUploaded {
                epoch: 1,
                file_name: "rash.png".into(),
                image: UploadedImage {
                    url: "/uploads/abc.png".into(),
                    filename: None,
                    size: None,
                    content_type: None,
                },
            },
        );

        assert_eq!(
            effect,
            Effect::Resync {
                epoch: 1,
                session_id: "sess-1".into(),
                delay: app.resync_delay,
            }
        );
        assert!(!app.is_uploading);
        let last = app.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.images, vec!["/uploads/abc.png".to_string()]);
        assert_eq!(app.analyzing_image.as_deref(), Some("/uploads/abc.png"));
    }

    #[test]
    fn test_upload_failure_appends_nothing() {
        let mut app = ready_app();
        update(&mut app, Action::UploadImage("/tmp/missing.png".into()));
        update(
            &mut app,
            Action::UploadFailed {
                epoch: 1,
                error: ApiError::Io("not found".into()),
            },
        );
        assert!(app.messages.is_empty());
        assert!(!app.is_uploading);
        assert!(app.error.is_some());
    }

    #[test]
    fn test_resync_replaces_only_when_server_has_more() {
        let mut app = ready_app();
        let (local_id, _) = submit(&mut app, "hello");
        update(
            &mut app,
            Action::ReplyReceived {
                epoch: 1,
                local_id,
                reply: reply("hi", false),
            },
        );

        let fewer = SessionSnapshot {
            messages: vec![ChatMessage::optimistic("only one".into(), vec![])],
            status: None,
        };
        update(&mut app, Action::SessionSynced { epoch: 1, snapshot: fewer });
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[0].content, "hello");

        let more = SessionSnapshot {
            messages: vec![
                ChatMessage::optimistic("a".into(), vec![]),
                ChatMessage::optimistic("b".into(), vec![]),
                ChatMessage::optimistic("c".into(), vec![]),
            ],
            status: None,
        };
        update(&mut app, Action::SessionSynced { epoch: 1, snapshot: more });
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages[2].content, "c");
    }

    #[test]
    fn test_reply_after_overlapping_resync_is_not_duplicated() {
        let mut app = ready_app();
        let (local_id, _) = submit(&mut app, "hello");
        let answer = reply("hi there", false);

        let mut server_user = ChatMessage::optimistic("hello".into(), vec![]);
        server_user.id = "1".into();
        let snapshot = SessionSnapshot {
            messages: vec![server_user, answer.clone().into_message()],
            status: None,
        };
        update(&mut app, Action::SessionSynced { epoch: 1, snapshot });
        assert_eq!(app.messages.len(), 2);

        update(
            &mut app,
            Action::ReplyReceived {
                epoch: 1,
                local_id,
                reply: answer,
            },
        );
        let contents: Vec<&str> = app.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "hi there"]);
        assert!(!app.is_typing);
    }

    #[test]
    fn test_resync_clears_analyzing_marker() {
        let mut app = ready_app();
        app.analyzing_image = Some("/uploads/x.png".into());
        update(
            &mut app,
            Action::SessionSynced {
                epoch: 1,
                snapshot: SessionSnapshot::default(),
            },
        );
        assert!(app.analyzing_image.is_none());
    }

    #[test]
    fn test_completed_snapshot_fetches_missing_report() {
        let mut app = ready_app();
        let effect = update(
            &mut app,
            Action::SessionSynced {
                epoch: 1,
                snapshot: SessionSnapshot {
                    messages: vec![],
                    status: Some(SessionStatus::Completed),
                },
            },
        );
        assert!(matches!(effect, Effect::FetchDiagnosis { .. }));
        assert_eq!(app.status, SessionStatus::Completed);
    }

    #[test]
    fn test_diagnosis_loaded_completes_session() {
        let mut app = ready_app();
        assert!(matches!(
            update(&mut app, Action::LoadDiagnosis),
            Effect::FetchDiagnosis { .. }
        ));
        // Repeated load while outstanding is a no-op
        assert_eq!(update(&mut app, Action::LoadDiagnosis), Effect::None);

        update(
            &mut app,
            Action::DiagnosisLoaded {
                epoch: 1,
                assessment: Box::new(assessment_fixture()),
            },
        );
        assert!(!app.loading_diagnosis);
        assert_eq!(app.status, SessionStatus::Completed);
        let a = app.assessment.as_ref().unwrap();
        assert_eq!(a.differentials[0].urgency, Urgency::Urgent);
    }

    #[test]
    fn test_finalize_progress_then_complete() {
        let mut app = ready_app();
        let effect = update(&mut app, Action::ForceDiagnosis);
        assert_eq!(
            effect,
            Effect::OpenFinalizeStream {
                epoch: 1,
                session_id: "sess-1".into()
            }
        );

        update(
            &mut app,
            Action::Finalize {
                epoch: 1,
                event: FinalizeEvent::Progress("Step 1".into()),
            },
        );
        assert_eq!(app.progress.as_deref(), Some("Step 1"));
        assert!(app.finalizing);

        update(
            &mut app,
            Action::Finalize {
                epoch: 1,
                event: FinalizeEvent::Complete(Box::new(assessment_fixture())),
            },
        );
        assert!(!app.finalizing);
        assert_eq!(app.status, SessionStatus::Completed);
        assert!(app.assessment.is_some());
        assert!(app.progress.is_none());
    }

    #[test]
    fn test_finalize_error_event_surfaces_message() {
        let mut app = ready_app();
        update(&mut app, Action::ForceDiagnosis);
        update(
            &mut app,
            Action::Finalize {
                epoch: 1,
                event: FinalizeEvent::Error("model overloaded".into()),
            },
        );
        assert!(!app.finalizing);
        assert_eq!(app.status, SessionStatus::Active);
        assert_eq!(
            app.error.as_deref(),
            Some("Diagnosis generation failed: model overloaded")
        );
    }

    #[test]
    fn test_finalize_transport_failure_after_complete_is_ignored() {
        let mut app = ready_app();
        update(&mut app, Action::ForceDiagnosis);
        update(
            &mut app,
            Action::Finalize {
                epoch: 1,
                event: FinalizeEvent::Complete(Box::new(assessment_fixture())),
            },
        );
        update(
            &mut app,
            Action::FinalizeFailed {
                epoch: 1,
                error: ApiError::Stream("late".into()),
            },
        );
        assert!(app.error.is_none());
    }

    #[test]
    fn test_stale_results_are_dropped_after_new_session() {
        let mut app = ready_app();
        let (local_id, _) = submit(&mut app, "hello");
        update(&mut app, Action::NewSession);
        assert!(app.messages.is_empty());

        let effect = update(
            &mut app,
            Action::ReplyReceived {
                epoch: 1,
                local_id,
                reply: reply("late reply", true),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.messages.is_empty());
        assert!(!app.loading_diagnosis);
    }

    #[test]
    fn test_dismiss_error() {
        let mut app = test_app();
        app.error = Some("x".into());
        update(&mut app, Action::DismissError);
        assert!(app.error.is_none());
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
