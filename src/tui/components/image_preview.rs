//! # Image Preview
//!
//! Terminal stand-in for image thumbnails: each uploaded image is shown as a
//! framed reference line with its file name, plus an overlay line while the
//! backend is still analyzing it.
//!
//! Stateless. `Message` embeds the gallery lines for any message with images.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Galleries show at most this many entries, then `+N more`.
pub const MAX_GALLERY_ITEMS: usize = 4;

pub const ANALYZING_TEXT: &str = "Analyzing image...";

/// One image reference.
pub struct ImagePreview<'a> {
    pub url: &'a str,
    pub analyzing: bool,
}

impl<'a> ImagePreview<'a> {
    pub fn new(url: &'a str, analyzing: bool) -> Self {
        Self { url, analyzing }
    }

    /// Last path segment of the URL, without any query string.
    pub fn file_name(&self) -> &'a str {
        let path = self.url.split(['?', '#']).next().unwrap_or(self.url);
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.url)
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(vec![
            Span::styled("▣ ", Style::default().fg(Color::Magenta)),
            Span::styled(
                self.file_name().to_string(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", self.url), Style::default().fg(Color::DarkGray)),
        ])];
        if self.analyzing {
            lines.push(Line::from(Span::styled(
                format!("  ⟳ {ANALYZING_TEXT}"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }
}

/// Bounded gallery for a message's image list.
///
/// `analyzing_url` marks the image still being processed, if it is in this
/// gallery.
pub fn gallery_lines(images: &[String], analyzing_url: Option<&str>) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = images
        .iter()
        .take(MAX_GALLERY_ITEMS)
        .flat_map(|url| ImagePreview::new(url, analyzing_url == Some(url.as_str())).lines())
        .collect();

    let hidden = images.len().saturating_sub(MAX_GALLERY_ITEMS);
    if hidden > 0 {
        lines.push(Line::from(Span::styled(
            format!("+{hidden} more"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}
