//! # TitleBar Component
//!
//! Top status line: session id, session status and the most pressing
//! transient state (typing, uploading, finalize progress...).
//!
//! Purely presentational. All fields are props copied from `App` and the
//! message list state:
//!
//! 1. **Unseen content**: `"Medical Diagnostic Assistant (session: 1a2b3c4d) | active | Typing... | ↓ New"`
//! 2. **Status message**: `"Medical Diagnostic Assistant (session: 1a2b3c4d) | active | Typing..."`
//! 3. **Default**: `"Medical Diagnostic Assistant (session: 1a2b3c4d) | active"`

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::api::SessionStatus;
use crate::tui::component::Component;

pub const APP_TITLE: &str = "Medical Diagnostic Assistant";

pub struct TitleBar {
    pub session_id: String,
    pub status: SessionStatus,
    pub status_message: String,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(
        session_id: String,
        status: SessionStatus,
        status_message: String,
        has_unseen_content: bool,
    ) -> Self {
        Self {
            session_id,
            status,
            status_message,
            has_unseen_content,
        }
    }

    fn status_span(&self) -> Span<'static> {
        let color = match self.status {
            SessionStatus::Active => Color::Green,
            SessionStatus::Completed => Color::Cyan,
            SessionStatus::Abandoned => Color::DarkGray,
        };
        Span::styled(self.status.label(), Style::default().fg(color))
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let separator = || Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![
            Span::styled(APP_TITLE, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" (session: {})", self.session_id)),
            separator(),
            self.status_span(),
        ];
        if !self.status_message.is_empty() {
            spans.push(separator());
            spans.push(Span::styled(
                self.status_message.clone(),
                Style::default().fg(Color::Yellow),
            ));
        }
        if self.has_unseen_content {
            spans.push(separator());
            spans.push(Span::styled("↓ New", Style::default().fg(Color::Cyan)));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
