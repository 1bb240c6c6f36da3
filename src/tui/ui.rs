use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::{LandingPage, MessageList, ReportView, TitleBar};
use crate::tui::{Focus, TuiState};

/// Rows taken by the error banner (message + dismiss hint + borders).
const ERROR_BANNER_HEIGHT: u16 = 4;

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    tui.composer.disabled = app.is_busy();
    tui.composer.focused = tui.focus == Focus::Composer;

    let area = frame.area();
    let composer_height = tui.composer.calculate_height(area.width);
    let banner_height = if app.error.is_some() { ERROR_BANNER_HEIGHT } else { 0 };

    let [title_area, banner_area, main_area, composer_area] = Layout::vertical([
        Length(1),
        Length(banner_height),
        Min(0),
        Length(composer_height),
    ])
    .areas(area);

    let mut title_bar = TitleBar::new(
        app.short_session_id().to_string(),
        app.status,
        app.status_line(),
        tui.message_list.has_unseen_content(),
    );
    title_bar.render(frame, title_area);

    if let Some(error) = &app.error {
        draw_error_banner(frame, banner_area, error);
    }

    let chat_area = match &app.assessment {
        Some(assessment) => {
            let [chat, report] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(main_area);
            ReportView::new(&mut tui.report, assessment, tui.focus == Focus::Report)
                .render(frame, report);
            chat
        }
        None => main_area,
    };

    if app.messages.is_empty() && !app.is_typing {
        LandingPage::new(app.creating_session).render(frame, chat_area);
    } else {
        MessageList::new(
            &mut tui.message_list,
            &app.messages,
            app.analyzing_image.as_deref(),
            app.is_typing,
        )
        .render(frame, chat_area);
    }

    tui.composer.render(frame, composer_area);
}

fn draw_error_banner(frame: &mut Frame, area: Rect, error: &str) {
    let text = vec![
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
        Line::from(Span::styled(
            "Esc to dismiss",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];
    let banner = Paragraph::new(text)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(banner, area);
}
