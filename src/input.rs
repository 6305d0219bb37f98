use crate::model::{EscapeChoice, Input, MenuChoice};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NameEdit {
    Push(char),
    Backspace,
    Commit,
}

fn is_press(k: &KeyEvent) -> bool {
    k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat
}

/// First key pressed since the last call, if any. Everything queued behind
/// it is thrown away so held keys don't pile up across ticks.
pub(crate) fn poll_key_nonblocking() -> io::Result<Option<KeyEvent>> {
    let mut first = None;
    while event::poll(Duration::ZERO)? {
        if let Event::Key(k) = event::read()? {
            if first.is_none() && is_press(&k) {
                first = Some(k);
            }
        }
    }
    Ok(first)
}

pub(crate) fn wait_key() -> io::Result<KeyEvent> {
    loop {
        if let Event::Key(k) = event::read()? {
            if is_press(&k) {
                return Ok(k);
            }
        }
    }
}

/// Drops anything typed while the previous screen was up.
pub(crate) fn discard_pending() -> io::Result<()> {
    while event::poll(Duration::ZERO)? {
        let _ = event::read()?;
    }
    Ok(())
}

pub(crate) fn map_game_key(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Left => Some(Input::Left),
        KeyCode::Right => Some(Input::Right),
        KeyCode::Esc => Some(Input::Escape),
        _ => None,
    }
}

pub(crate) fn map_menu_key(code: KeyCode) -> Option<MenuChoice> {
    match code {
        KeyCode::Char('1') => Some(MenuChoice::Play),
        KeyCode::Char('2') => Some(MenuChoice::Ranking),
        KeyCode::Char('3') => Some(MenuChoice::Exit),
        _ => None,
    }
}

pub(crate) fn map_escape_key(code: KeyCode) -> Option<EscapeChoice> {
    match code {
        KeyCode::Char('1') => Some(EscapeChoice::Resume),
        KeyCode::Char('2') => Some(EscapeChoice::ReturnToMainMenu),
        _ => None,
    }
}

pub(crate) fn map_name_key(k: KeyEvent) -> Option<NameEdit> {
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match k.code {
        KeyCode::Enter => Some(NameEdit::Commit),
        KeyCode::Backspace => Some(NameEdit::Backspace),
        KeyCode::Char(ch) if !ch.is_control() => Some(NameEdit::Push(ch)),
        _ => None,
    }
}
