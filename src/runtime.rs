// Copyright (c) 2026 rezky_nightky

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Green,
    Amber,
    Cyan,
    Red,
    Purple,
    Gray,
}

/// What a key press asks the main loop to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    TogglePause,
}

pub fn key_action(k: &KeyEvent) -> Option<Action> {
    if k.kind != KeyEventKind::Press {
        return None;
    }
    match (k.code, k.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Some(Action::Quit),
        (KeyCode::Char('p'), _) | (KeyCode::Char('P'), _) => Some(Action::TogglePause),
        _ => None,
    }
}
