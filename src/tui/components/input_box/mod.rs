//! # Composer
//!
//! Captures the user's next message, or the path of an image to upload.
//!
//! ## Modes
//!
//! - **Text**: Enter submits, Shift+Enter / Ctrl+J inserts a newline.
//! - **Attach** (Ctrl+A toggles): the buffer holds a file path; Enter emits
//!   an upload intent.
//!
//! Each mode keeps its own buffer so toggling never loses a half-typed
//! message.
//!
//! ## Disabled
//!
//! `disabled` is a prop from the application state (`App::is_busy`). While
//! set, editing still works but Enter is ignored and the box is drawn dimmed.
//! The buffer is cleared as soon as an intent is emitted; a failed send hands
//! the text back through [`Composer::restore`].

mod editor;

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, BorderType, Padding, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use editor::{Editor, MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width};

/// High-level events emitted by the Composer
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    /// Trimmed-non-empty message text (Enter in text mode)
    Submit(String),
    /// Image path (Enter in attach mode)
    Upload(PathBuf),
    /// Buffer or cursor changed
    ContentChanged,
    ModeChanged(ComposerMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerMode {
    #[default]
    Text,
    Attach,
}

impl ComposerMode {
    fn title(self) -> &'static str {
        match self {
            ComposerMode::Text => " Message (Enter send · Shift+Enter newline · Ctrl+A attach) ",
            ComposerMode::Attach => " Image path (Enter upload · Ctrl+A back to message) ",
        }
    }
}

/// Text input for chat messages and image paths.
///
/// # Props
///
/// - `disabled`: an operation is in flight (from App state)
/// - `focused`: keyboard focus is on the composer
#[derive(Debug, Default)]
pub struct Composer {
    pub mode: ComposerMode,
    pub disabled: bool,
    pub focused: bool,
    message: Editor,
    path: Editor,
    /// Inner width from the last render, for vertical cursor movement.
    last_width: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Self::default()
        }
    }

    fn editor(&self) -> &Editor {
        match self.mode {
            ComposerMode::Text => &self.message,
            ComposerMode::Attach => &self.path,
        }
    }

    fn editor_mut(&mut self) -> &mut Editor {
        match self.mode {
            ComposerMode::Text => &mut self.message,
            ComposerMode::Attach => &mut self.path,
        }
    }

    /// Current buffer of the active mode.
    pub fn text(&self) -> &str {
        &self.editor().text
    }

    /// Put a message draft back (after a failed or rejected send). Anything
    /// typed since is kept after the restored text.
    pub fn restore(&mut self, draft: String) {
        let typed = self.message.take();
        let text = if typed.trim().is_empty() {
            draft
        } else {
            format!("{draft}\n{typed}")
        };
        self.message.set(text);
        self.mode = ComposerMode::Text;
    }

    /// Discard both buffers (new session).
    pub fn clear(&mut self) {
        self.message = Editor::default();
        self.path = Editor::default();
        self.mode = ComposerMode::Text;
    }

    /// Height for the current draft, clamped to the visible-line limit.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let rows = self.editor().row_count(inner_width(area_width));
        rows.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn submit(&mut self) -> Option<ComposerEvent> {
        if self.disabled || self.editor().is_blank() {
            return None;
        }
        match self.mode {
            ComposerMode::Text => {
                let text = self.message.take();
                Some(ComposerEvent::Submit(text.trim().to_string()))
            }
            ComposerMode::Attach => {
                let raw = self.path.take();
                self.mode = ComposerMode::Text;
                Some(ComposerEvent::Upload(expand_path(raw.trim())))
            }
        }
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect) {
        let total = self.editor().row_count(inner_width(area.width));
        if total <= MAX_VISIBLE_LINES {
            return;
        }
        // content_length is the max scroll position, not the row count
        let mut state = ScrollbarState::default()
            .content_length((total - MAX_VISIBLE_LINES) as usize)
            .position(self.editor().scroll as usize);
        let bar = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            bar,
            &mut state,
        );
    }
}

/// `~/` prefix → home directory.
fn expand_path(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(raw),
        },
        None => PathBuf::from(raw),
    }
}

impl Component for Composer {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        self.last_width = width;
        self.editor_mut().follow_cursor(width);

        let accent = match self.mode {
            ComposerMode::Text => Color::Green,
            ComposerMode::Attach => Color::Magenta,
        };
        let mut style = Style::default().fg(accent);
        if self.disabled {
            style = style.fg(Color::DarkGray).add_modifier(Modifier::DIM);
        }
        let title = if self.disabled {
            " Waiting for response... "
        } else {
            self.mode.title()
        };
        let border = if self.focused && !self.disabled {
            Style::default().fg(accent)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(title)
            .padding(Padding::horizontal(1));
        let input = Paragraph::new(self.editor().visible_text(width))
            .block(block)
            .style(style);

        frame.render_widget(input, area);
        self.render_scrollbar(frame, area);

        if self.focused {
            frame.set_cursor_position(self.editor().screen_position(area));
        }
    }
}

impl EventHandler for Composer {
    type Event = ComposerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        let width = self.last_width;
        let changed = |moved: bool| moved.then_some(ComposerEvent::ContentChanged);
        match event {
            TuiEvent::InputChar('\n') if self.mode == ComposerMode::Attach => None,
            TuiEvent::InputChar(c) => {
                self.editor_mut().insert(*c);
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                let text = match self.mode {
                    // Paths are single-line; drop trailing newlines from drag-and-drop
                    ComposerMode::Attach => text.trim().to_string(),
                    ComposerMode::Text => text.replace("\r\n", "\n"),
                };
                self.editor_mut().insert_str(&text);
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Backspace => changed(self.editor_mut().backspace()),
            TuiEvent::Delete => changed(self.editor_mut().delete()),
            TuiEvent::CursorLeft => changed(self.editor_mut().left()),
            TuiEvent::CursorRight => changed(self.editor_mut().right()),
            TuiEvent::CursorHome => changed(self.editor_mut().home()),
            TuiEvent::CursorEnd => changed(self.editor_mut().end()),
            TuiEvent::CursorUp => changed(self.editor_mut().vertical(-1, width)),
            TuiEvent::CursorDown => changed(self.editor_mut().vertical(1, width)),
            TuiEvent::ToggleAttach => {
                self.mode = match self.mode {
                    ComposerMode::Text => ComposerMode::Attach,
                    ComposerMode::Attach => ComposerMode::Text,
                };
                Some(ComposerEvent::ModeChanged(self.mode))
            }
            TuiEvent::Submit => self.submit(),
            _ => None,
        }
    }
}
