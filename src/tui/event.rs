use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    // Session-level commands (mapped to core actions)
    ForceQuit,
    Submit,
    NewSession,
    Refresh,
    LoadDiagnosis,
    ForceDiagnosis,

    // Composer
    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,
    ToggleAttach,

    // Navigation
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    FocusNext,
    Escape,
    Resize,
}

/// Poll for an event with timeout (blocks up to 100ms)
pub fn poll_event() -> Option<TuiEvent> {
    poll_event_timeout(Duration::from_millis(100))
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            log::warn!("Event poll failed: {}", e);
            return None;
        }
    }
    match event::read() {
        Ok(ev) => map_event(ev),
        Err(e) => {
            log::warn!("Event read failed: {}", e);
            None
        }
    }
}

pub fn map_event(ev: Event) -> Option<TuiEvent> {
    match ev {
        Event::Key(key) => map_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}

pub fn map_key(key: KeyEvent) -> Option<TuiEvent> {
    // Windows terminals report releases too
    if key.kind == KeyEventKind::Release {
        return None;
    }
    log::trace!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(TuiEvent::ForceQuit),
        KeyCode::Char('n') if ctrl => Some(TuiEvent::NewSession),
        KeyCode::Char('r') if ctrl => Some(TuiEvent::Refresh),
        KeyCode::Char('l') if ctrl => Some(TuiEvent::LoadDiagnosis),
        KeyCode::Char('d') if ctrl => Some(TuiEvent::ForceDiagnosis),
        KeyCode::Char('a') if ctrl => Some(TuiEvent::ToggleAttach),
        // Ctrl+J is ASCII LF; most terminals send it for Ctrl+Enter
        KeyCode::Char('j') if ctrl => Some(TuiEvent::InputChar('\n')),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(TuiEvent::InputChar(c)),
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(TuiEvent::InputChar('\n'))
        }
        KeyCode::Enter => Some(TuiEvent::Submit),
        KeyCode::Backspace => Some(TuiEvent::Backspace),
        KeyCode::Delete => Some(TuiEvent::Delete),
        KeyCode::Left => Some(TuiEvent::CursorLeft),
        KeyCode::Right => Some(TuiEvent::CursorRight),
        KeyCode::Up => Some(TuiEvent::CursorUp),
        KeyCode::Down => Some(TuiEvent::CursorDown),
        KeyCode::Home => Some(TuiEvent::CursorHome),
        KeyCode::End => Some(TuiEvent::CursorEnd),
        KeyCode::PageUp => Some(TuiEvent::ScrollPageUp),
        KeyCode::PageDown => Some(TuiEvent::ScrollPageDown),
        KeyCode::Tab => Some(TuiEvent::FocusNext),
        KeyCode::Esc => Some(TuiEvent::Escape),
        _ => None,
    }
}
