/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Draw the scene into the pixel `Canvas`
///   2. Blit the canvas into the `front` buffer as Braille cells, 2x4
///      pixels per character, then compose text and boxes on top
///   3. Compare each cell with `back` buffer (previous frame)
///   4. Only emit terminal commands for cells that changed
///   5. All commands are batched with `queue!`, flushed once at the end
///   6. Swap front/back
///
/// The canvas is 144x152 pixels, so the scene occupies 72x38 cells.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableFocusChange, EnableFocusChange, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use super::canvas::Canvas;
use super::perspective::{CANVAS_HEIGHT, GRAPHICS_FRAME_HEIGHT, SCREEN_WIDTH};
use super::scene::{SceneRenderer, View};
use crate::domain::rules::format_time;
use crate::sim::world::{GameState, Phase};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps
    /// the inter-row gap on VTE terminals the same color as the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::from_char(' ', Color::White, bg));
            }
        }
    }

    /// Single-line frame with a filled interior.
    fn frame(&mut self, x: usize, y: usize, w: usize, h: usize, fg: Color, bg: Color) {
        if w < 2 || h < 2 {
            return;
        }
        self.fill(x, y, w, h, bg);
        let (right, bottom) = (x + w - 1, y + h - 1);
        for col in x + 1..right {
            self.set(col, y, Cell::from_char('─', fg, bg));
            self.set(col, bottom, Cell::from_char('─', fg, bg));
        }
        for row in y + 1..bottom {
            self.set(x, row, Cell::from_char('│', fg, bg));
            self.set(right, row, Cell::from_char('│', fg, bg));
        }
        self.set(x, y, Cell::from_char('┌', fg, bg));
        self.set(right, y, Cell::from_char('┐', fg, bg));
        self.set(x, bottom, Cell::from_char('└', fg, bg));
        self.set(right, bottom, Cell::from_char('┘', fg, bg));
    }
}

// ── Layout ──

/// Braille dot grid per character.
const DOT_W: i32 = 2;
const DOT_H: i32 = 4;

pub const SCENE_COLS: usize = (SCREEN_WIDTH / DOT_W) as usize;
pub const SCENE_ROWS: usize = (CANVAS_HEIGHT / DOT_H) as usize;
/// First character row of the status bar.
const STATUS_ROW: usize = (GRAPHICS_FRAME_HEIGHT / DOT_H) as usize;

const HUD_ROW: usize = 0;
const SCENE_ROW: usize = 1;

const SCENE_FG: Color = Color::Rgb { r: 225, g: 225, b: 205 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const BOX_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const BOX_FG: Color = Color::Rgb { r: 230, g: 230, b: 230 };
const HI_FG: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const DIM_FG: Color = Color::Rgb { r: 140, g: 140, b: 140 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    canvas: Canvas,
    scene: SceneRenderer,
    /// Terminal reports key releases.
    pub key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            canvas: Canvas::new(SCREEN_WIDTH, CANVAS_HEIGHT),
            scene: SceneRenderer::new(),
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableFocusChange,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.key_release = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.key_release {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableFocusChange,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, state: &GameState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        let phase = state.phase();
        if self.last_phase != Some(phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.clear();

        let in_game = state.views().contains(&Phase::Playing);
        if in_game {
            self.compose_game(state);
        } else {
            self.compose_title(state);
        }

        match phase {
            Phase::MainMenu | Phase::InGameMenu => self.compose_menu(state),
            Phase::Narration => self.compose_narration(state),
            Phase::Message => self.compose_message(state),
            Phase::Playing => {}
        }

        if phase == Phase::Playing && !state.focused {
            self.compose_pause_overlay();
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn scene_origin(&self) -> (usize, usize) {
        (self.front.width.saturating_sub(SCENE_COLS) / 2, SCENE_ROW)
    }

    fn compose_game(&mut self, state: &GameState) {
        let view = View {
            maze: &state.maze,
            position: state.player.position,
            direction: state.player.direction,
        };
        self.scene.draw(&mut self.canvas, &view);

        let (ox, oy) = self.scene_origin();
        for cy in 0..SCENE_ROWS {
            for cx in 0..SCENE_COLS {
                let ch = braille_at(&self.canvas, cx, cy);
                self.front.set(ox + cx, oy + cy, Cell::from_char(ch, SCENE_FG, Cell::BASE_BG));
            }
        }

        // Status text sits in the black strip either side of the compass.
        let row = oy + STATUS_ROW + 1;
        let level = format!("L. {}", state.player.level);
        let time = format_time(u32::from(state.maze.elapsed_seconds()));
        self.front.put_str(ox + 1, row, &level, SCENE_FG, Cell::BASE_BG);
        self.front.put_str(ox + SCENE_COLS - 1 - time.len(), row, &time, SCENE_FG, Cell::BASE_BG);

        let hud = format!(" Points {}   Best {} ", state.player.points, best_time(state));
        self.front.put_str(ox, HUD_ROW, &hud, TITLE_FG, Cell::BASE_BG);

        let help = "↑↓ move  ←→ turn  Enter/M menu  Esc back";
        let help_row = oy + SCENE_ROWS;
        if help_row < self.front.height {
            self.front.put_str(ox, help_row, help, DIM_FG, Cell::BASE_BG);
        }
    }

    fn compose_title(&mut self, state: &GameState) {
        let title = [
            r" __  __                ___                 _           ",
            r"|  \/  | __ _  ___ ___/ __|_ _ __ ___ __ __| | ___ _ _ ",
            r"| |\/| |/ _` ||_ // -_) (__| '_/ _` |\ V  V / |/ -_) '_|",
            r"|_|  |_|\__,_|/__|\___|\___|_| \__,_| \_/\_/|_|\___|_|  ",
        ];
        let tx = self.front.width.saturating_sub(title[1].len()) / 2;
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(tx, 2 + i, line, TITLE_FG, Color::Reset);
        }

        let tagline = "━━━ a first-person labyrinth ━━━";
        let gx = self.front.width.saturating_sub(tagline.chars().count()) / 2;
        self.front.put_str(gx, 7, tagline, DIM_FG, Color::Reset);

        let summary = format!(
            "Level {}   Points {}   Best {}",
            state.player.level,
            state.player.points,
            best_time(state)
        );
        let sx = self.front.width.saturating_sub(summary.len()) / 2;
        let row = self.front.height.saturating_sub(2);
        self.front.put_str(sx, row, &summary, DIM_FG, Color::Reset);
    }

    fn compose_menu(&mut self, state: &GameState) {
        let items = state.menu_items();
        let box_w = 22;
        let box_h = items.len() + 4;
        let (x, y) = self.centered_box(box_w, box_h);
        self.front.frame(x, y, box_w, box_h, BOX_FG, BOX_BG);
        let heading = if state.phase() == Phase::MainMenu { " Main Menu " } else { " Menu " };
        self.front.put_str(x + 2, y, heading, TITLE_FG, BOX_BG);

        for (i, item) in items.iter().enumerate() {
            let selected = i == state.menu_cursor;
            let (marker, fg) = if selected { ("▶ ", HI_FG) } else { ("  ", BOX_FG) };
            let line = format!("{}{}", marker, item.label());
            self.front.put_str(x + 3, y + 2 + i, &line, fg, BOX_BG);
        }
    }

    fn compose_narration(&mut self, state: &GameState) {
        let narration = match &state.narration {
            Some(n) => n,
            None => return,
        };
        let inner = 36;
        let lines = wrap(narration.text(), inner);
        let box_w = inner + 4;
        let box_h = lines.len() + 5;
        let (x, y) = self.centered_box(box_w, box_h);
        self.front.frame(x, y, box_w, box_h, BOX_FG, BOX_BG);
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(x + 2, y + 2 + i, line, BOX_FG, BOX_BG);
        }
        let footer = format!(" {}/{}  Enter ▶ ", narration.page() + 1, narration.page_count());
        let fx = x + box_w - 1 - footer.chars().count();
        self.front.put_str(fx, y + box_h - 1, &footer, DIM_FG, BOX_BG);
    }

    fn compose_message(&mut self, state: &GameState) {
        let inner = 26;
        let lines = wrap(&state.message, inner);
        let box_w = inner + 4;
        let box_h = lines.len() + 4;
        let (x, y) = self.centered_box(box_w, box_h);
        self.front.frame(x, y, box_w, box_h, HI_FG, BOX_BG);
        for (i, line) in lines.iter().enumerate() {
            let lx = x + 2 + inner.saturating_sub(line.chars().count()) / 2;
            self.front.put_str(lx, y + 2 + i, line, BOX_FG, BOX_BG);
        }
    }

    fn compose_pause_overlay(&mut self) {
        let box_w = 24;
        let box_h = 5;
        let (x, y) = self.centered_box(box_w, box_h);
        self.front.frame(x, y, box_w, box_h, TITLE_FG, BOX_BG);
        self.front.put_str(x + 8, y + 1, "PAUSED", TITLE_FG, BOX_BG);
        self.front.put_str(x + 2, y + 3, "focus to resume", DIM_FG, BOX_BG);
    }

    /// Top-left corner that centers a box over the scene area.
    fn centered_box(&self, w: usize, h: usize) -> (usize, usize) {
        let (ox, oy) = self.scene_origin();
        let rows = SCENE_ROWS.min(self.front.height.saturating_sub(oy));
        (
            ox + SCENE_COLS.saturating_sub(w) / 2,
            oy + rows.saturating_sub(h) / 2,
        )
    }
}

fn best_time(state: &GameState) -> String {
    if state.player.has_best_time() {
        format_time(u32::from(state.player.best_time))
    } else {
        "--:--".to_string()
    }
}

/// Braille character for the 2x4 pixel block at character cell (cx, cy).
pub fn braille_at(canvas: &Canvas, cx: usize, cy: usize) -> char {
    // Dot numbering: left column 1,2,3,7; right column 4,5,6,8.
    const BITS: [[u32; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];
    let (px, py) = (cx as i32 * DOT_W, cy as i32 * DOT_H);
    let mut code = 0;
    for (dy, row) in BITS.iter().enumerate() {
        for (dx, bit) in row.iter().enumerate() {
            if canvas.is_white(px + dx as i32, py + dy as i32) {
                code |= bit;
            }
        }
    }
    char::from_u32(0x2800 + code).unwrap_or(' ')
}

/// Greedy word wrap. Explicit newlines and leading indentation are kept.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for para in text.split('\n') {
        let indent = para.len() - para.trim_start_matches(' ').len();
        let mut line = " ".repeat(indent);
        let mut fresh = true;
        for word in para.split(' ').filter(|w| !w.is_empty()) {
            if !fresh && line.chars().count() + 1 + word.chars().count() > width {
                out.push(std::mem::take(&mut line));
                fresh = true;
            }
            if !fresh {
                line.push(' ');
            }
            line.push_str(word);
            fresh = false;
        }
        out.push(line);
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::canvas::{Color as Px, Point, Surface};

    #[test]
    fn scene_fills_seventy_two_by_thirty_eight() {
        assert_eq!((SCENE_COLS, SCENE_ROWS), (72, 38));
        assert_eq!(STATUS_ROW, 34);
    }

    #[test]
    fn braille_dot_order() {
        let mut c = Canvas::new(4, 8);
        assert_eq!(braille_at(&c, 0, 0), '\u{2800}');
        c.set_stroke_color(Px::White);
        c.draw_pixel(Point::new(0, 0));
        assert_eq!(braille_at(&c, 0, 0), '\u{2801}');
        c.draw_pixel(Point::new(1, 3));
        assert_eq!(braille_at(&c, 0, 0), '\u{2881}');
        c.set_fill_color(Px::White);
        c.fill_rect(c.bounds());
        assert_eq!(braille_at(&c, 1, 1), '\u{28FF}');
        // Past the edge reads as unlit.
        assert_eq!(braille_at(&c, 5, 5), '\u{2800}');
    }

    #[test]
    fn wrap_breaks_on_words_and_newlines() {
        let lines = wrap("one two three\nfour", 7);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap("\nNew Best Time!\n00:42", 20), vec!["", "New Best Time!", "00:42"]);
    }

    #[test]
    fn wrap_keeps_a_single_indented_value() {
        assert_eq!(wrap("Points:\n  42", 20), vec!["Points:", "  42"]);
    }
}
