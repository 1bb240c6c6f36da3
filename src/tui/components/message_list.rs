//! # MessageList Component
//!
//! Scrollable view of the session's chat turns.
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the message slice
//! (props). Heights are cached per message id: messages never change once
//! appended, so a cached height only goes stale when the width changes, the
//! list is replaced by a resync, or the "analyzing" overlay moves.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::api::ChatMessage;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

pub const TYPING_TEXT: &str = "Assistant is typing...";

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::default(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_scroll(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Re-engage auto-scroll once the user scrolls back to the end.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Content exists below the viewport.
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.scroll_state.offset().y < self.max_scroll()
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [ChatMessage],
    pub analyzing_url: Option<&'a str>,
    pub is_typing: bool,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [ChatMessage],
        analyzing_url: Option<&'a str>,
        is_typing: bool,
    ) -> Self {
        Self {
            state,
            messages,
            analyzing_url,
            is_typing,
        }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar column

        let layout = &mut self.state.layout;
        layout.refresh(self.messages, content_width, self.analyzing_url);

        let content_height = layout.total_height();
        let typing_rows = u16::from(self.is_typing);
        let canvas_height = content_height + typing_rows;

        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible = self.state.layout.visible_range(scroll_offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y = if visible.start > 0 {
            self.state.layout.prefix_heights[visible.start - 1]
        } else {
            0
        };
        for i in visible {
            let height = self.state.layout.heights[i];
            let message = Message::new(&self.messages[i], false, self.analyzing_url);
            scroll_view.render_widget(message, Rect::new(0, y, content_width, height));
            y += height;
        }

        if self.is_typing {
            let typing = Paragraph::new(Span::styled(
                format!(" {TYPING_TEXT}"),
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::ITALIC),
            ));
            scroll_view.render_widget(typing, Rect::new(0, content_height, content_width, 1));
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp | TuiEvent::CursorUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown | TuiEvent::CursorDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::CursorEnd => {
                self.stick_to_bottom = true;
            }
            _ => {}
        }
        None
    }
}

/// Cached message heights for one width.
#[derive(Debug, Default)]
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    ids: Vec<String>,
    content_width: u16,
    analyzing_url: Option<String>,
}

impl LayoutCache {
    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Number of leading cached heights still valid for `messages`.
    pub fn reusable_count(
        &self,
        messages: &[ChatMessage],
        content_width: u16,
        analyzing_url: Option<&str>,
    ) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        let mut reusable = self
            .ids
            .iter()
            .zip(messages)
            .take_while(|(cached, m)| **cached == m.id)
            .count();

        // The overlay line appears or disappears under whichever message holds
        // the old or new analyzing image.
        if self.analyzing_url.as_deref() != analyzing_url {
            let affected = messages.iter().position(|m| {
                m.images.iter().any(|url| {
                    Some(url.as_str()) == analyzing_url
                        || Some(url.as_str()) == self.analyzing_url.as_deref()
                })
            });
            if let Some(index) = affected {
                reusable = reusable.min(index);
            }
        }
        reusable
    }

    /// Bring the cache in line with `messages`, measuring only what changed.
    pub fn refresh(&mut self, messages: &[ChatMessage], content_width: u16, analyzing_url: Option<&str>) {
        let reusable = self.reusable_count(messages, content_width, analyzing_url);
        self.heights.truncate(reusable);
        self.ids.truncate(reusable);

        for message in &messages[reusable..] {
            let height = Message::new(message, false, analyzing_url).calculate_height(content_width);
            self.heights.push(height);
            self.ids.push(message.id.clone());
        }
        self.content_width = content_width;
        self.analyzing_url = analyzing_url.map(str::to_string);
        self.rebuild_prefix_heights();
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    /// Indices overlapping the viewport, padded by half a screen each way.
    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
