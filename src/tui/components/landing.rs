//! # Landing Page Component
//!
//! Shown in place of the message list while the conversation is empty:
//! what the assistant does, the medical disclaimer, and the key bindings.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::tui::component::Component;

pub const DISCLAIMER: &str = "This assistant does not replace a medical professional. \
In an emergency, call your local emergency number.";

const KEY_HINTS: &[(&str, &str)] = &[
    ("Enter", "send message"),
    ("Shift+Enter", "new line"),
    ("Ctrl+A", "attach an image"),
    ("Ctrl+D", "generate diagnosis"),
    ("Ctrl+L", "load diagnosis"),
    ("Ctrl+R", "refresh session"),
    ("Ctrl+N", "new session"),
    ("Tab", "switch panel"),
    ("Ctrl+C", "quit"),
];

pub struct LandingPage {
    /// Still waiting for the backend to create the session.
    pub starting: bool,
}

impl LandingPage {
    pub fn new(starting: bool) -> Self {
        Self { starting }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                "Describe your symptoms to begin",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("medchat v{}", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            )),
            Line::default(),
            Line::from(Span::styled(DISCLAIMER, Style::default().fg(Color::Yellow))),
            Line::default(),
        ];
        for (key, what) in KEY_HINTS {
            lines.push(Line::from(vec![
                Span::styled(format!("{key:>12}"), Style::default().fg(Color::Green)),
                Span::styled(format!("  {what:<18}"), Style::default().fg(Color::DarkGray)),
            ]));
        }
        if self.starting {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Starting session...",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }
}

impl Component for LandingPage {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let [body] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, body);
    }
}
