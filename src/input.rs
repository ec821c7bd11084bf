use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::models::Message;

/// What a key press asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Quit,
    SwitchTab,
    CursorUp,
    CursorDown,
}

pub fn key_intent(key: &KeyEvent) -> Option<Intent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Intent::Quit),
        KeyCode::Char('q') if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(Intent::Quit),
        KeyCode::Tab => Some(Intent::SwitchTab),
        KeyCode::Up => Some(Intent::CursorUp),
        KeyCode::Down => Some(Intent::CursorDown),
        _ => None,
    }
}

impl Message {
    /// Terminal events the dashboard reacts to. Mouse, focus and paste
    /// events are dropped here.
    pub fn from_event(event: Event) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(Message::Key(key)),
            Event::Resize(width, height) => Some(Message::Resize { width, height }),
            _ => None,
        }
    }
}
