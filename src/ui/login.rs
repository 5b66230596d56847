/// Login screen state.
///
///   Menu ──G──▶ done(Guest)
///   Menu ──L──▶ Form(Login)    ──Enter on password──▶ verify ──ok──▶ done(User)
///   Menu ──R──▶ Form(Register) ──Enter on password──▶ register ──ok──▶ Menu
///   Form ──Esc──▶ Menu
///   Menu ──Q/Esc──▶ done(Quit)
///
/// Failures keep the form open with the error in `message`.

use crossterm::event::{KeyCode, KeyEvent};

use crate::auth::CredentialStore;
use crate::ui::input::{self, FieldAction, TextField};

/// How the login screen ended.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LoginOutcome {
    Guest,
    User(String),
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormKind {
    Login,
    Register,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    Username,
    Password,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stage {
    Menu,
    Form(FormKind),
}

/// Menu rows, in display order.
pub const MENU_ITEMS: [(&str, &str); 4] = [
    ("G", "Play as guest"),
    ("L", "Log in"),
    ("R", "Register"),
    ("Q", "Quit"),
];

pub struct LoginFlow {
    pub stage: Stage,
    pub cursor: usize,
    pub username: TextField,
    pub password: TextField,
    pub focus: Focus,
    /// Last error or confirmation; cleared on the next edit.
    pub message: String,
}

impl LoginFlow {
    pub fn new() -> Self {
        LoginFlow {
            stage: Stage::Menu,
            cursor: 0,
            username: TextField::new(false),
            password: TextField::new(true),
            focus: Focus::Username,
            message: String::new(),
        }
    }

    /// Feed one key. Returns the outcome once the screen is done.
    pub fn handle_key(&mut self, key: &KeyEvent, creds: &mut CredentialStore) -> Option<LoginOutcome> {
        if input::is_ctrl_c(key) {
            return Some(LoginOutcome::Quit);
        }
        match self.stage {
            Stage::Menu => self.handle_menu(key),
            Stage::Form(kind) => self.handle_form(kind, key, creds),
        }
    }

    // ── Menu ──

    fn handle_menu(&mut self, key: &KeyEvent) -> Option<LoginOutcome> {
        let choice = match key.code {
            KeyCode::Up => {
                self.cursor = (self.cursor + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
                return None;
            }
            KeyCode::Down | KeyCode::Tab => {
                self.cursor = (self.cursor + 1) % MENU_ITEMS.len();
                return None;
            }
            KeyCode::Enter => self.cursor,
            KeyCode::Esc => 3,
            KeyCode::Char(c) => {
                let c = c.to_ascii_uppercase().to_string();
                MENU_ITEMS.iter().position(|(k, _)| *k == c)?
            }
            _ => return None,
        };
        match choice {
            0 => Some(LoginOutcome::Guest),
            1 => {
                self.open_form(FormKind::Login);
                None
            }
            2 => {
                self.open_form(FormKind::Register);
                None
            }
            _ => Some(LoginOutcome::Quit),
        }
    }

    fn open_form(&mut self, kind: FormKind) {
        self.stage = Stage::Form(kind);
        self.username.clear();
        self.password.clear();
        self.focus = Focus::Username;
        self.message.clear();
    }

    // ── Form ──

    fn handle_form(
        &mut self,
        kind: FormKind,
        key: &KeyEvent,
        creds: &mut CredentialStore,
    ) -> Option<LoginOutcome> {
        if matches!(key.code, KeyCode::Tab | KeyCode::Up | KeyCode::Down) {
            self.focus = match self.focus {
                Focus::Username => Focus::Password,
                Focus::Password => Focus::Username,
            };
            return None;
        }

        let field = match self.focus {
            Focus::Username => &mut self.username,
            Focus::Password => &mut self.password,
        };
        match field.handle(key) {
            FieldAction::Edited => {
                self.message.clear();
                None
            }
            FieldAction::Cancel => {
                self.stage = Stage::Menu;
                self.message.clear();
                None
            }
            FieldAction::Submit if self.focus == Focus::Username => {
                self.focus = Focus::Password;
                None
            }
            FieldAction::Submit => self.submit(kind, creds),
            FieldAction::Ignored => None,
        }
    }

    fn submit(&mut self, kind: FormKind, creds: &mut CredentialStore) -> Option<LoginOutcome> {
        let (user, pass) = (self.username.text(), self.password.text());
        match kind {
            FormKind::Login => match creds.verify(user, pass) {
                Ok(id) => return Some(LoginOutcome::User(id)),
                Err(e) => self.message = e.to_string(),
            },
            FormKind::Register => match creds.register(user, pass) {
                Ok(()) => {
                    self.stage = Stage::Menu;
                    self.cursor = 1;
                    self.message = format!("Registered {}. You can log in now.", user.trim());
                    return None;
                }
                Err(e) => self.message = e.to_string(),
            },
        }
        self.password.clear();
        self.focus = Focus::Password;
        None
    }
}
