use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::api::{ChatMessage, Role};
use crate::tui::component::Component;
use crate::tui::components::image_preview::gallery_lines;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// A stateless component that renders one chat turn.
///
/// # Design
///
/// `Message` is a **transient component**: built fresh each frame from a
/// `&ChatMessage`. Selection and the analyzing marker are props from the
/// parent `MessageList`.
///
/// # Layout
///
/// ```text
/// ╭ assistant · 14:05 ───────────────╮
/// │ markdown body                    │
/// │ ▣ rash.png  /uploads/rash.png    │  ← gallery, at most 4 entries
/// │   ⟳ Analyzing image...           │
/// ╰──────────────────────────────────╯
/// ```
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ChatMessage,
    pub is_selected: bool,
    /// URL of the image currently being analyzed, if any.
    pub analyzing_url: Option<&'a str>,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ChatMessage, is_selected: bool, analyzing_url: Option<&'a str>) -> Self {
        Self {
            message,
            is_selected,
            analyzing_url,
        }
    }

    /// Body text: Markdown for the assistant, verbatim for everyone else,
    /// followed by the image gallery.
    fn body(&self) -> Text<'static> {
        let content = self.message.content.trim();
        let mut text = match self.message.role {
            Role::Assistant => markdown::render(content, role_color(Role::Assistant)),
            role => Text::from(
                content
                    .lines()
                    .map(|l| Line::styled(l.to_string(), Style::default().fg(role_color(role))))
                    .collect::<Vec<_>>(),
            ),
        };
        text.lines
            .extend(gallery_lines(&self.message.images, self.analyzing_url));
        text
    }

    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(self.body()).wrap(Wrap { trim: false })
    }

    /// Height this message needs at `width`, borders included.
    ///
    /// Uses the same `Paragraph` that `render` draws, so measured and drawn
    /// heights always agree.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let body = self.body();
        if body.lines.is_empty() {
            return VERTICAL_OVERHEAD;
        }
        let lines = self.paragraph().line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

pub fn role_color(role: Role) -> Color {
    match role {
        Role::User => Color::Green,
        Role::Assistant => Color::Blue,
        Role::System => Color::Yellow,
    }
}

/// `HH:MM` clock string in `tz`.
pub fn format_clock<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.with_timezone(tz).format("%H:%M").to_string()
}

/// `HH:MM` in the user's local time zone.
pub fn local_clock(timestamp: &DateTime<Utc>) -> String {
    format_clock(timestamp, &Local)
}

impl Widget for Message<'_> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let color = role_color(self.message.role);
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        let title = format!(
            " {} · {} ",
            role_label(self.message.role),
            local_clock(&self.message.timestamp)
        );

        let block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);
        self.paragraph().render(inner_area, buf);
    }
}

impl Component for Message<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
