//! # Diagnostic Report
//!
//! Renders an [`Assessment`] as a collapsible document.
//!
//! ## Architecture
//!
//! Same split as `MessageList`: [`ReportViewState`] is persistent (lives in
//! `TuiState`, survives frames) and [`ReportView`] is transient, created each
//! frame with the assessment as a prop.
//!
//! The document itself comes from [`build_report`], a pure function of
//! `(assessment, view state)`. No I/O happens here, so every toggle is
//! testable without a terminal.
//!
//! ```text
//! Patient summary              (always shown)
//! [1] ▾ Differential Diagnoses
//!       ▸ Strep pharyngitis  62%  URGENT     ← Space toggles details
//! [2] ▾ Red Flags
//! [3] ▸ Action Plan
//! [4] ▸ SOAP Note
//! [5] ▸ Additional Information Needed
//! Limitations                  (when present)
//! ```

use std::collections::HashSet;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Wrap};

use crate::api::{Assessment, Differential, Severity, Urgency};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Top-level collapsible sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Differentials,
    RedFlags,
    ActionPlan,
    Soap,
    MissingQuestions,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Differentials,
        Section::RedFlags,
        Section::ActionPlan,
        Section::Soap,
        Section::MissingQuestions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Differentials => "Differential Diagnoses",
            Section::RedFlags => "Red Flags",
            Section::ActionPlan => "Action Plan",
            Section::Soap => "SOAP Note",
            Section::MissingQuestions => "Additional Information Needed",
        }
    }

    /// Number key that toggles this section.
    pub fn hotkey(self) -> char {
        match self {
            Section::Differentials => '1',
            Section::RedFlags => '2',
            Section::ActionPlan => '3',
            Section::Soap => '4',
            Section::MissingQuestions => '5',
        }
    }

    pub fn from_hotkey(c: char) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.hotkey() == c)
    }
}

// ============================================================================
// Tier labels and colours
// ============================================================================

/// Display label and colours for an urgency/priority or severity value.
#[derive(Debug, Clone, PartialEq)]
pub struct TierStyle {
    pub label: String,
    pub fg: Color,
    pub bg: Option<Color>,
}

impl TierStyle {
    fn known(label: &str, fg: u32, bg: u32) -> Self {
        Self {
            label: label.to_string(),
            fg: rgb(fg),
            bg: Some(rgb(bg)),
        }
    }

    fn unrated(raw: &str) -> Self {
        Self {
            label: format!("UNRATED ({})", raw.trim()),
            fg: Color::Gray,
            bg: None,
        }
    }

    pub fn style(&self) -> Style {
        let style = Style::default().fg(self.fg).add_modifier(Modifier::BOLD);
        match self.bg {
            Some(bg) => style.bg(bg),
            None => style,
        }
    }

    pub fn badge(&self) -> Span<'static> {
        Span::styled(format!(" {} ", self.label), self.style())
    }
}

fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

pub fn urgency_style(urgency: &Urgency) -> TierStyle {
    match urgency {
        Urgency::Immediate => TierStyle::known("IMMEDIATE", 0xdc2626, 0xfef2f2),
        Urgency::Urgent => TierStyle::known("URGENT", 0xea580c, 0xfff7ed),
        Urgency::Routine => TierStyle::known("ROUTINE", 0x16a34a, 0xf0fdf4),
        Urgency::Unknown(raw) => TierStyle::unrated(raw),
    }
}

pub fn severity_style(severity: &Severity) -> TierStyle {
    match severity {
        Severity::Critical => TierStyle::known("CRITICAL", 0xdc2626, 0xfef2f2),
        Severity::Warning => TierStyle::known("WARNING", 0xf59e0b, 0xfffbeb),
        Severity::Info => TierStyle::known("INFO", 0x3b82f6, 0xeff6ff),
        Severity::Unknown(raw) => TierStyle::unrated(raw),
    }
}

/// `62` → `62%`, `12.5` → `12.5%`.
pub fn format_likelihood(likelihood: f64) -> String {
    if likelihood.fract() == 0.0 {
        format!("{likelihood:.0}%")
    } else {
        format!("{likelihood:.1}%")
    }
}

// ============================================================================
// View state
// ============================================================================

/// Expansion, selection and scroll state for the report panel.
#[derive(Debug, Clone)]
pub struct ReportViewState {
    open_sections: HashSet<Section>,
    open_details: HashSet<usize>,
    /// Differential under the keyboard cursor.
    pub selected: Option<usize>,
    pub scroll: u16,
    /// Rendered document height from the last frame, for scroll clamping.
    content_height: u16,
    viewport_height: u16,
}

impl Default for ReportViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportViewState {
    pub fn new() -> Self {
        Self {
            open_sections: HashSet::from([Section::Differentials, Section::RedFlags]),
            open_details: HashSet::new(),
            selected: None,
            scroll: 0,
            content_height: 0,
            viewport_height: 0,
        }
    }

    /// Everything expanded; used for the plain-text export.
    pub fn fully_expanded(differential_count: usize) -> Self {
        Self {
            open_sections: Section::ALL.into_iter().collect(),
            open_details: (0..differential_count).collect(),
            ..Self::new()
        }
    }

    pub fn is_open(&self, section: Section) -> bool {
        self.open_sections.contains(&section)
    }

    pub fn toggle(&mut self, section: Section) {
        if !self.open_sections.remove(&section) {
            self.open_sections.insert(section);
        }
    }

    pub fn is_detail_open(&self, index: usize) -> bool {
        self.open_details.contains(&index)
    }

    pub fn toggle_detail(&mut self, index: usize) {
        if !self.open_details.remove(&index) {
            self.open_details.insert(index);
        }
    }

    pub fn select_next(&mut self, count: usize) {
        if count == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(count - 1),
            None => 0,
        });
    }

    pub fn select_prev(&mut self, count: usize) {
        if count == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => i.saturating_sub(1),
            None => count - 1,
        });
    }

    fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn page(&self) -> u16 {
        self.viewport_height.saturating_sub(1).max(1)
    }
}

/// Events the report emits to the parent. Only detail toggles need the
/// differential count, which the state doesn't know, so selection is
/// resolved by the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEvent {
    SelectNext,
    SelectPrev,
    ToggleSelectedDetail,
}

impl EventHandler for ReportViewState {
    type Event = ReportEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(' ') => Some(ReportEvent::ToggleSelectedDetail),
            TuiEvent::InputChar(c) => {
                if let Some(section) = Section::from_hotkey(*c) {
                    self.toggle(section);
                }
                None
            }
            TuiEvent::CursorUp => Some(ReportEvent::SelectPrev),
            TuiEvent::CursorDown => Some(ReportEvent::SelectNext),
            TuiEvent::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
                None
            }
            TuiEvent::ScrollDown => {
                self.scroll = (self.scroll + 1).min(self.max_scroll());
                None
            }
            TuiEvent::ScrollPageUp => {
                self.scroll = self.scroll.saturating_sub(self.page());
                None
            }
            TuiEvent::ScrollPageDown => {
                self.scroll = (self.scroll + self.page()).min(self.max_scroll());
                None
            }
            _ => None,
        }
    }
}

// ============================================================================
// Document builder
// ============================================================================

fn heading_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

fn label_style() -> Style {
    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn section_header(section: Section, open: bool, count: Option<usize>) -> Line<'static> {
    let marker = if open { "▾" } else { "▸" };
    let mut spans = vec![
        Span::styled(format!("[{}] ", section.hotkey()), dim()),
        Span::styled(format!("{marker} {}", section.title()), heading_style()),
    ];
    if let Some(n) = count {
        spans.push(Span::styled(format!(" ({n})"), dim()));
    }
    Line::from(spans)
}

fn bullet_list(lines: &mut Vec<Line<'static>>, label: &str, items: &[String], indent: &str) {
    if items.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(format!("{indent}{label}"), label_style())));
    for item in items {
        lines.push(Line::from(format!("{indent}  • {item}")));
    }
}

fn labelled_text(lines: &mut Vec<Line<'static>>, label: &str, text: Option<&str>, indent: &str) {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return;
    };
    lines.push(Line::from(Span::styled(format!("{indent}{label}"), label_style())));
    for row in text.lines() {
        lines.push(Line::from(format!("{indent}  {row}")));
    }
}

fn differential_lines(
    lines: &mut Vec<Line<'static>>,
    index: usize,
    dx: &Differential,
    state: &ReportViewState,
) {
    let selected = state.selected == Some(index);
    let detail_open = state.is_detail_open(index);
    let cursor = if selected { "›" } else { " " };
    let toggle = if !dx.has_details() {
        " "
    } else if detail_open {
        "▾"
    } else {
        "▸"
    };

    let name_style = if selected {
        Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    lines.push(Line::from(vec![
        Span::raw(format!(" {cursor} {toggle} ")),
        Span::styled(format!("{}. {}", index + 1, dx.name), name_style),
        Span::raw("  "),
        Span::styled(
            format_likelihood(dx.likelihood),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        urgency_style(&dx.urgency).badge(),
    ]));
    if !dx.reasoning.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            format!("      {}", dx.reasoning.trim()),
            Style::default().fg(Color::Gray),
        )));
    }

    if detail_open && dx.has_details() {
        let indent = "      ";
        bullet_list(lines, "General causes", &dx.general_causes, indent);
        bullet_list(lines, "Patient-specific factors", &dx.patient_specific_factors, indent);
        bullet_list(lines, "Risk factors", &dx.risk_factors, indent);
        bullet_list(lines, "Supporting findings", &dx.supporting_findings, indent);
        bullet_list(lines, "Contradicting findings", &dx.contradicting_findings, indent);
        labelled_text(lines, "Prognosis", dx.prognosis.as_deref(), indent);
        bullet_list(lines, "Possible complications", &dx.complications, indent);
        bullet_list(lines, "Recommended tests", &dx.recommended_tests, indent);
        labelled_text(lines, "Treatment", dx.treatment_summary.as_deref(), indent);
    }
}

/// Build the report document for the current view state.
///
/// Sections with nothing in them are left out entirely, so their hotkeys
/// toggle hidden state until content arrives.
pub fn build_report(assessment: &Assessment, state: &ReportViewState) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(Span::styled("Patient Summary", heading_style())));
    let summary = assessment.patient_summary.trim();
    if summary.is_empty() {
        lines.push(Line::from(Span::styled("  (no summary provided)", dim())));
    } else {
        for row in summary.lines() {
            lines.push(Line::from(format!("  {row}")));
        }
    }

    if !assessment.differentials.is_empty() {
        let open = state.is_open(Section::Differentials);
        lines.push(Line::default());
        lines.push(section_header(
            Section::Differentials,
            open,
            Some(assessment.differentials.len()),
        ));
        if open {
            for (i, dx) in assessment.differentials.iter().enumerate() {
                differential_lines(&mut lines, i, dx, state);
            }
        }
    }

    if !assessment.red_flags.is_empty() {
        let open = state.is_open(Section::RedFlags);
        lines.push(Line::default());
        lines.push(section_header(
            Section::RedFlags,
            open,
            Some(assessment.red_flags.len()),
        ));
        if open {
            for flag in &assessment.red_flags {
                lines.push(Line::from(vec![
                    Span::raw("   "),
                    severity_style(&flag.severity).badge(),
                    Span::raw(" "),
                    Span::styled(flag.message.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]));
                if !flag.rationale.trim().is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", flag.rationale.trim()),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }
        }
    }

    if !assessment.action_plan.is_empty() {
        let open = state.is_open(Section::ActionPlan);
        lines.push(Line::default());
        lines.push(section_header(
            Section::ActionPlan,
            open,
            Some(assessment.action_plan.len()),
        ));
        if open {
            for item in &assessment.action_plan {
                lines.push(Line::from(vec![
                    Span::raw("   "),
                    urgency_style(&item.priority).badge(),
                    Span::raw(" "),
                    Span::raw(item.action.clone()),
                ]));
                if !item.rationale.trim().is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", item.rationale.trim()),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }
        }
    }

    if let Some(soap) = &assessment.soap {
        let open = state.is_open(Section::Soap);
        lines.push(Line::default());
        lines.push(section_header(Section::Soap, open, None));
        if open {
            let indent = "   ";
            labelled_text(&mut lines, "SUBJECTIVE", Some(&soap.subjective), indent);
            labelled_text(&mut lines, "OBJECTIVE", Some(&soap.objective), indent);
            labelled_text(&mut lines, "ASSESSMENT", Some(&soap.assessment), indent);
            labelled_text(&mut lines, "PLAN", Some(&soap.plan), indent);
        }
    }

    if !assessment.missing_questions.is_empty() {
        let open = state.is_open(Section::MissingQuestions);
        lines.push(Line::default());
        lines.push(section_header(
            Section::MissingQuestions,
            open,
            Some(assessment.missing_questions.len()),
        ));
        if open {
            for question in &assessment.missing_questions {
                lines.push(Line::from(format!("   ? {question}")));
            }
        }
    }

    if let Some(limitations) = assessment
        .limitations
        .as_deref()
        .filter(|l| !l.trim().is_empty())
    {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Limitations", heading_style())));
        for row in limitations.trim().lines() {
            lines.push(Line::from(Span::styled(
                format!("  {row}"),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
    }

    Text::from(lines)
}

/// The report with every section and detail panel expanded, as plain text.
pub fn export_plain(assessment: &Assessment) -> String {
    let state = ReportViewState::fully_expanded(assessment.differentials.len());
    build_report(assessment, &state)
        .lines
        .iter()
        .map(|line| {
            let row: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            row.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Re-flow exported text to `width` columns. Continuation rows keep the
/// row's indent plus two spaces.
pub fn wrap_plain(text: &str, width: usize) -> String {
    text.lines()
        .map(|row| {
            let body = row.trim_start();
            if body.is_empty() {
                return String::new();
            }
            let indent = &row[..row.len() - body.len()];
            let continuation = format!("{indent}  ");
            let options = textwrap::Options::new(width.max(continuation.len() + 8))
                .initial_indent(indent)
                .subsequent_indent(&continuation);
            textwrap::fill(body, options)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Component
// ============================================================================

/// Report panel, created fresh each frame.
pub struct ReportView<'a> {
    pub state: &'a mut ReportViewState,
    pub assessment: &'a Assessment,
    pub focused: bool,
}

impl<'a> ReportView<'a> {
    pub fn new(state: &'a mut ReportViewState, assessment: &'a Assessment, focused: bool) -> Self {
        Self {
            state,
            assessment,
            focused,
        }
    }
}

impl Component for ReportView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(" Diagnostic Report ")
            .title_bottom(Line::from(Span::styled(
                " 1-5 sections · ↑↓ select · Space details · Tab focus ",
                dim(),
            )))
            .padding(Padding::horizontal(1));

        let inner = block.inner(area);
        let paragraph = Paragraph::new(build_report(self.assessment, self.state))
            .wrap(Wrap { trim: false });

        self.state.viewport_height = inner.height;
        self.state.content_height = paragraph.line_count(inner.width) as u16;
        self.state.scroll = self.state.scroll.min(self.state.max_scroll());

        frame.render_widget(paragraph.block(block).scroll((self.state.scroll, 0)), area);
    }
}
