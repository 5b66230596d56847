/// Keyboard input.
///
/// Play is turn-based: every Press (or auto-Repeat) of a bound key becomes
/// exactly one `Intent`. Release events are ignored, so terminals with and
/// without keyboard enhancement behave the same.
///
/// The login screen works on raw keys from `next_key`; `TextField` turns
/// those into an edited line.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::Direction;

/// How long `next_key` blocks before returning `None`.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// What the player asked for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    Move(Direction),
    Restart,
    Save,
    Load,
    Quit,
}

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_SAVE: &[KeyCode] = &[KeyCode::F(5)];
const KEYS_LOAD: &[KeyCode] = &[KeyCode::F(9)];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Map one key event to an intent. Ctrl chords are checked first so that
/// Ctrl-S saves rather than moving down.
pub fn intent_for(key: &KeyEvent) -> Option<Intent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::Save),
            KeyCode::Char('l') | KeyCode::Char('L') => Some(Intent::Load),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Intent::Quit),
            _ => None,
        };
    }

    let code = &key.code;
    let table: [(&[KeyCode], Intent); 8] = [
        (KEYS_UP, Intent::Move(Direction::Up)),
        (KEYS_DOWN, Intent::Move(Direction::Down)),
        (KEYS_LEFT, Intent::Move(Direction::Left)),
        (KEYS_RIGHT, Intent::Move(Direction::Right)),
        (KEYS_RESTART, Intent::Restart),
        (KEYS_SAVE, Intent::Save),
        (KEYS_LOAD, Intent::Load),
        (KEYS_QUIT, Intent::Quit),
    ];
    table
        .iter()
        .find(|(keys, _)| keys.contains(code))
        .map(|(_, intent)| *intent)
}

pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

// ── Event source ──

/// Wait briefly for the next key press. `None` on timeout or for
/// non-key events (resizes are picked up by the renderer on its next frame).
pub fn next_key() -> std::io::Result<Option<KeyEvent>> {
    if !event::poll(POLL_TIMEOUT)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
        _ => Ok(None),
    }
}

// ── Text entry ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldAction {
    Edited,
    Submit,
    Cancel,
    Ignored,
}

/// A single-line text buffer for the login form.
#[derive(Clone, Debug, Default)]
pub struct TextField {
    text: String,
    /// Render as `*`s.
    pub masked: bool,
}

/// Cap on field length; longer input is dropped.
const FIELD_MAX: usize = 32;

impl TextField {
    pub fn new(masked: bool) -> Self {
        TextField { text: String::new(), masked }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Text as it should appear on screen.
    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.text.chars().count())
        } else {
            self.text.clone()
        }
    }

    pub fn handle(&mut self, key: &KeyEvent) -> FieldAction {
        match key.code {
            KeyCode::Enter => FieldAction::Submit,
            KeyCode::Esc => FieldAction::Cancel,
            KeyCode::Backspace => {
                if self.text.pop().is_some() {
                    FieldAction::Edited
                } else {
                    FieldAction::Ignored
                }
            }
            KeyCode::Char(c)
                if !c.is_control()
                    && !key.modifiers.contains(KeyModifiers::CONTROL)
                    && self.text.chars().count() < FIELD_MAX =>
            {
                self.text.push(c);
                FieldAction::Edited
            }
            _ => FieldAction::Ignored,
        }
    }
}
