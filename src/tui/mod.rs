//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into `core::Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Loop
//!
//! ```text
//! poll keys ─► components ─► Action ─► update() ─► Effect ─► effects::spawn
//!                                         ▲                        │
//!                                         └──── mpsc::Receiver ◄───┘
//! ```
//!
//! Redraws happen only after an event or a background result; idle frames
//! sleep in `poll_event` for up to 100ms. A `SteadyBlock` cursor is used
//! because `set_cursor_position` resets the blink timer on every draw.

mod component;
pub mod components;
mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};
use tokio::task::AbortHandle;

use crate::api::{DiagnosisBackend, HttpBackend};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::effects::{self, RetryPolicy};
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    Composer, ComposerEvent, MessageListState, ReportEvent, ReportViewState,
};
use crate::tui::event::{TuiEvent, poll_event, poll_event_immediate};

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    Report,
}

/// TUI-specific presentation state (not part of core session logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub composer: Composer,
    pub report: ReportViewState,
    pub focus: Focus,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            composer: Composer::new(),
            report: ReportViewState::new(),
            focus: Focus::Composer,
        }
    }

    /// Forget everything tied to the previous session.
    fn reset(&mut self) {
        self.message_list = MessageListState::new();
        self.composer.clear();
        self.report = ReportViewState::new();
        self.focus = Focus::Composer;
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter through; terminals without
        // it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Runs effects and owns the abort handles of the current session's tasks.
struct EffectRunner {
    backend: Arc<dyn DiagnosisBackend>,
    policy: RetryPolicy,
    tx: mpsc::Sender<Action>,
    handles: Vec<AbortHandle>,
}

impl EffectRunner {
    /// Returns true when the effect asks the loop to exit.
    fn apply(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::Quit => return true,
            Effect::None => {}
            Effect::Restart { .. } => {
                // Aborting drops any open finalize stream, which closes it
                for handle in self.handles.drain(..) {
                    handle.abort();
                }
                self.spawn(effect);
            }
            effect => self.spawn(effect),
        }
        false
    }

    fn spawn(&mut self, effect: Effect) {
        self.handles.retain(|h| !h.is_finished());
        if let Some(handle) =
            effects::spawn(effect, self.backend.clone(), self.policy, self.tx.clone())
        {
            self.handles.push(handle);
        }
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

/// Map a key event outside the composer to a session-level action.
fn global_action(event: &TuiEvent) -> Option<Action> {
    match event {
        TuiEvent::ForceQuit => Some(Action::Quit),
        TuiEvent::NewSession => Some(Action::NewSession),
        TuiEvent::Refresh => Some(Action::Refresh),
        TuiEvent::LoadDiagnosis => Some(Action::LoadDiagnosis),
        TuiEvent::ForceDiagnosis => Some(Action::ForceDiagnosis),
        _ => None,
    }
}

/// Route one terminal event. Returns the action for `update`, if any.
fn route_event(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Option<Action> {
    if let Some(action) = global_action(event) {
        if matches!(action, Action::NewSession) {
            tui.reset();
        }
        return Some(action);
    }

    match event {
        TuiEvent::Escape if app.error.is_some() => return Some(Action::DismissError),
        TuiEvent::Escape if tui.focus == Focus::Report => {
            tui.focus = Focus::Composer;
            return None;
        }
        TuiEvent::FocusNext => {
            tui.focus = match tui.focus {
                Focus::Composer if app.assessment.is_some() => Focus::Report,
                _ => Focus::Composer,
            };
            return None;
        }
        TuiEvent::ScrollUp | TuiEvent::ScrollDown | TuiEvent::ScrollPageUp | TuiEvent::ScrollPageDown
            if tui.focus == Focus::Composer =>
        {
            tui.message_list.handle_event(event);
            return None;
        }
        _ => {}
    }

    match tui.focus {
        Focus::Report => {
            let count = app
                .assessment
                .as_ref()
                .map_or(0, |a| a.differentials.len());
            match tui.report.handle_event(event)? {
                ReportEvent::SelectNext => tui.report.select_next(count),
                ReportEvent::SelectPrev => tui.report.select_prev(count),
                ReportEvent::ToggleSelectedDetail => {
                    if let Some(index) = tui.report.selected {
                        tui.report.toggle_detail(index);
                    }
                }
            }
            None
        }
        Focus::Composer => match tui.composer.handle_event(event)? {
            ComposerEvent::Submit(text) => Some(Action::Submit(text)),
            ComposerEvent::Upload(path) => Some(Action::UploadImage(path)),
            ComposerEvent::ContentChanged | ComposerEvent::ModeChanged(_) => None,
        },
    }
}

/// Apply one action and run the resulting effect. Returns true on quit.
fn dispatch(app: &mut App, tui: &mut TuiState, runner: &mut EffectRunner, action: Action) -> bool {
    debug!("Dispatching {:?}", action);
    let effect = update(app, action);
    if let Some(draft) = app.draft_to_restore.take() {
        tui.composer.restore(draft);
    }
    if app.assessment.is_none() && tui.focus == Focus::Report {
        tui.focus = Focus::Composer;
    }
    runner.apply(effect)
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend: Arc<dyn DiagnosisBackend> =
        Arc::new(HttpBackend::new(&config.api_url, config.request_timeout));
    let (tx, rx) = mpsc::channel();
    let mut runner = EffectRunner {
        backend: backend.clone(),
        policy: RetryPolicy::from_config(&config),
        tx,
        handles: Vec::new(),
    };

    // Health probe is informational only
    tokio::spawn(async move {
        match backend.health().await {
            Ok(true) => info!("Backend healthy"),
            Ok(false) => warn!("Backend reports unhealthy"),
            Err(e) => warn!("Backend health check failed: {}", e),
        }
    });

    let mut app = App::from_config(&config);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut should_quit = dispatch(&mut app, &mut tui, &mut runner, Action::NewSession);
    let mut needs_redraw = true;

    while !should_quit {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        // Drain every pending key before the next draw
        let first_event = poll_event();
        for event in first_event.into_iter().chain(std::iter::from_fn(poll_event_immediate)) {
            needs_redraw = true;
            if let Some(action) = route_event(&app, &mut tui, &event)
                && dispatch(&mut app, &mut tui, &mut runner, action)
            {
                should_quit = true;
                break;
            }
        }

        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            if dispatch(&mut app, &mut tui, &mut runner, action) {
                should_quit = true;
                break;
            }
        }
    }

    runner.abort_all();
    ratatui::restore();
    info!("medchat shut down");
    Ok(())
}
