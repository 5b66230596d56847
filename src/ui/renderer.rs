/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Flush once, then swap front/back
///
/// A push usually changes three board cells and the HUD, so a frame is a
/// handful of writes rather than a full-screen repaint.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::{Tile, Token};
use crate::sim::session::Session;
use crate::ui::login::{Focus, FormKind, LoginFlow, Stage, MENU_ITEMS};

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const ACCENT: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from every real cell, so the next flush repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies one column; overflow is clipped.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Paint a whole row's background, then the text on top.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Board glyphs ──

/// Terminal columns per board cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Two-column glyph and colors for one board cell.
fn glyph(tile: Tile, token: Token) -> ([char; 2], Color, Color) {
    match (tile, token) {
        (_, Token::Player) => {
            let bg = if tile.is_goal() { Color::Rgb { r: 60, g: 50, b: 0 } } else { BASE_BG };
            (['@', ' '], Color::Rgb { r: 100, g: 200, b: 255 }, bg)
        }
        (Tile::Goal, Token::Box) => (['[', ']'], Color::Black, GREEN),
        (_, Token::Box) => (['[', ']'], Color::Black, Color::Rgb { r: 180, g: 120, b: 60 }),
        (Tile::Wall, _) => (['█', '█'], Color::Rgb { r: 120, g: 120, b: 120 }, BASE_BG),
        (Tile::Goal, _) => (['·', '·'], ACCENT, BASE_BG),
        (Tile::Empty, _) => ([' ', ' '], Color::White, BASE_BG),
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(8192, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Drop the previous frame so the next render repaints every cell.
    pub fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))
    }

    pub fn render_game(&mut self, session: &Session, message: &str) -> io::Result<()> {
        self.begin_frame()?;
        if session.is_game_complete() {
            self.compose_game_complete(session);
        } else {
            self.compose_game(session, message);
        }
        self.end_frame()
    }

    pub fn render_login(&mut self, flow: &LoginFlow, catalog_name: &str) -> io::Result<()> {
        self.begin_frame()?;
        self.compose_login(flow, catalog_name);
        self.end_frame()
    }

    // ── Frame lifecycle ──

    fn sync_size(&mut self, force: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if force || tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }
        Ok(())
    }

    fn begin_frame(&mut self) -> io::Result<()> {
        self.sync_size(false)?;
        self.front.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        // Position of the terminal cursor after the last Print, if known.
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: game ──

    fn compose_game(&mut self, s: &Session, message: &str) {
        self.compose_hud(s);

        let (rows, cols) = s.dimensions();
        for r in 0..rows {
            let y = MAP_ROW + r;
            if y >= self.front.height {
                break;
            }
            for c in 0..cols {
                let x = 2 + c * CELL_W;
                let (Some(tile), Some(token)) = (s.terrain_at(r, c), s.token_at(r, c)) else {
                    continue;
                };
                let ([c0, c1], fg, bg) = glyph(tile, token);
                self.front.set(x, y, Cell::new(c0, fg, bg));
                self.front.set(x + 1, y, Cell::new(c1, fg, bg));
            }
        }

        let msg_row = MAP_ROW + rows + 1;
        if !message.is_empty() && msg_row < self.front.height {
            self.front.put_bar(msg_row, &format!(" {message} "), Color::Black, MSG_BG);
        }

        let help_row = msg_row + 2;
        if help_row < self.front.height {
            let help = " ←↑↓→/WASD Move   R Restart   F5/^S Save   F9/^L Load   Q/Esc Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, BASE_BG);
        }
    }

    fn compose_hud(&mut self, s: &Session) {
        let user = s.user().unwrap_or("guest");
        let hud = format!(
            " Level {}/{}  {}   Moves: {:<5}  Player: {}",
            s.current_level_number() + 1,
            s.level_count(),
            s.level_name(),
            s.moves(),
            user,
        );
        self.front.put_bar(HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_game_complete(&mut self, s: &Session) {
        let box_art = [
            "╔══════════════════════════════════╗",
            "║   ★  ALL LEVELS COMPLETE!  ★     ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 3 + i, l, ACCENT, BASE_BG);
        }
        let who = match s.user() {
            Some(u) => format!("Congratulations, {u}!"),
            None => "Congratulations!".to_string(),
        };
        let levels = format!("You solved all {} levels.", s.level_count());
        self.front.put_str(6, 8, &who, Color::White, BASE_BG);
        self.front.put_str(6, 9, &levels, GREEN, BASE_BG);
        self.front.put_str(6, 11, "Press any key to exit", Color::DarkGrey, BASE_BG);
    }

    // ── Compose: login ──

    fn compose_login(&mut self, flow: &LoginFlow, catalog_name: &str) {
        let title = [
            r"  ___       _         _                    ",
            r" / __| ___ | |__ ___ | |_  ___  _ _  _ __  ",
            r" \__ \/ _ \| / // _ \|  _|/ -_)| '_|| '  \ ",
            r" |___/\___/|_\_\\___/ \__|\___||_|  |_|_|_|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, ACCENT, BASE_BG);
        }
        self.front.put_str(4, 6, catalog_name, Color::DarkGrey, BASE_BG);

        let base = 8;
        match flow.stage {
            Stage::Menu => {
                for (i, (key, label)) in MENU_ITEMS.iter().enumerate() {
                    let selected = i == flow.cursor;
                    let marker = if selected { '▸' } else { ' ' };
                    let fg = if selected { GREEN } else { Color::White };
                    let line = format!("{marker} {key}   {label}");
                    self.front.put_str(6, base + i, &line, fg, BASE_BG);
                }
                let hint = "↑↓ choose   ENTER select";
                self.front.put_str(6, base + MENU_ITEMS.len() + 1, hint, Color::DarkGrey, BASE_BG);
            }
            Stage::Form(kind) => {
                let heading = match kind {
                    FormKind::Login => "Log in",
                    FormKind::Register => "Register a new account",
                };
                self.front.put_str(6, base, heading, ACCENT, BASE_BG);

                let fields = [
                    ("Username", flow.username.display(), Focus::Username),
                    ("Password", flow.password.display(), Focus::Password),
                ];
                for (i, (label, value, focus)) in fields.iter().enumerate() {
                    let active = flow.focus == *focus;
                    let cursor = if active { "_" } else { "" };
                    let fg = if active { GREEN } else { Color::White };
                    let line = format!("{label}: {value}{cursor}");
                    self.front.put_str(6, base + 2 + i, &line, fg, BASE_BG);
                }
                let hint = "TAB switch field   ENTER submit   ESC back";
                self.front.put_str(6, base + 5, hint, Color::DarkGrey, BASE_BG);
            }
        }

        if !flow.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            self.front.put_bar(msg_row, &format!(" {} ", flow.message), Color::Black, MSG_BG);
        }
    }
}
