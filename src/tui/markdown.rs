//! Markdown → ratatui `Text` for assistant replies.
//!
//! The backend writes its questions and summaries in light Markdown: bold
//! terms, bullet lists of symptoms, the occasional heading. This walks the
//! `pulldown_cmark` event stream and produces styled lines. Headings drop
//! their `#` markers, lists use `•`/numbers, code is shown verbatim.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// Render `content` with `base_fg` as the body colour.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, options) {
        renderer.event(event);
    }
    Text::from(renderer.lines)
}

/// Nesting context for list items.
enum ListKind {
    Bullet,
    Numbered(u64),
}

struct Renderer {
    lines: Vec<Line<'static>>,
    base: Style,
    /// Inline modifiers in effect (bold inside a heading, italic inside bold...).
    inline: Vec<Style>,
    lists: Vec<ListKind>,
    quote_depth: usize,
    in_code_block: bool,
    pending_link: Option<String>,
    /// A block just closed; the next block starts after a blank line.
    gap: bool,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            base: Style::default().fg(base_fg),
            inline: Vec::new(),
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            pending_link: None,
            gap: false,
        }
    }

    fn current(&self) -> Style {
        self.inline.last().copied().unwrap_or(self.base)
    }

    fn push_inline(&mut self, style: Style) {
        let next = self.current().patch(style);
        self.inline.push(next);
    }

    /// Start a fresh output line, prefixed with any blockquote bars.
    fn new_line(&mut self) {
        let mut line = Line::default();
        for _ in 0..self.quote_depth {
            line.push_span(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
        }
        self.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        if self.lines.is_empty() {
            self.new_line();
        }
        if let Some(line) = self.lines.last_mut() {
            line.push_span(span);
        }
    }

    fn start_block(&mut self) {
        if self.gap && !self.lines.is_empty() {
            self.new_line();
        }
        self.gap = false;
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.append(Span::styled(
                code.to_string(),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            )),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.start_block();
                self.new_line();
                self.append(Span::styled(
                    "─".repeat(32),
                    Style::default().fg(Color::DarkGray),
                ));
                self.gap = true;
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // Paragraphs inside list items continue the bullet line
                if self.lists.is_empty() {
                    self.start_block();
                    self.new_line();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                self.new_line();
                let modifier = match level {
                    HeadingLevel::H1 => Modifier::BOLD | Modifier::UNDERLINED,
                    _ => Modifier::BOLD,
                };
                self.push_inline(Style::default().add_modifier(modifier));
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.quote_depth += 1;
                self.push_inline(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                }
                self.lists.push(match start {
                    Some(n) => ListKind::Numbered(n),
                    None => ListKind::Bullet,
                });
            }
            Tag::Item => {
                self.new_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Numbered(n)) => {
                        let m = format!("{indent}{n}. ");
                        *n += 1;
                        m
                    }
                    _ => format!("{indent}• "),
                };
                self.append(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_inline(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_inline(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_inline(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.pending_link = Some(dest_url.to_string());
                self.push_inline(Style::default().add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.inline.pop();
            }
            TagEnd::Link => {
                self.inline.pop();
                if let Some(url) = self.pending_link.take() {
                    self.append(Span::styled(
                        format!(" <{url}>"),
                        Style::default().fg(Color::Cyan),
                    ));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        // ratatui draws \t as zero width
        let text = text.replace('\t', "    ");
        if self.in_code_block {
            let style = Style::default().fg(Color::White);
            for row in text.lines() {
                self.new_line();
                self.append(Span::styled(format!("    {row}"), style));
            }
            return;
        }
        let style = self.current();
        self.append(Span::styled(text, style));
    }
}
