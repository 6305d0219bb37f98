use crate::attempt::FrameView;
use crate::error::GameError;
use crate::grid::Cell as GridCell;
use crate::obstacles;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

pub(crate) const PLAYER_GLYPH: char = '@';
pub(crate) const OBSTACLE_GLYPH: char = '*';
pub(crate) const WALL_GLYPH: char = '#';
pub(crate) const EMPTY_GLYPH: char = ' ';

const FG: Color = Color::White;
const BG: Color = Color::Black;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: FG,
            bg: BG,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
}

/// Alternate-screen raw-mode session with a diffed back buffer.
pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    active: bool,
}

impl Terminal {
    pub(crate) fn begin() -> Result<Self, GameError> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            active: true,
        })
    }

    pub(crate) fn end(&mut self) -> Result<(), GameError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Clears the back buffer, resizing it first if the window changed.
    pub(crate) fn begin_frame(&mut self) -> Result<(), GameError> {
        let (c, r) = terminal::size()?;
        if c != self.cols || r != self.rows {
            self.cols = c;
            self.rows = r;
            self.prev = CellBuffer::new(c, r);
            self.cur = CellBuffer::new(c, r);
            queue!(self.out, Clear(ClearType::All))?;
            self.present_all()?;
        }
        self.cur.clear();
        Ok(())
    }

    pub(crate) fn present(&mut self) -> Result<(), GameError> {
        self.flush(true)
    }

    fn present_all(&mut self) -> Result<(), GameError> {
        self.flush(false)
    }

    fn flush(&mut self, diff_only: bool) -> Result<(), GameError> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg: BG });
    }
}

/// Plain text screen, one line per row from the top-left corner.
pub(crate) fn draw_lines<S: AsRef<str>>(buf: &mut CellBuffer, lines: &[S]) {
    for (y, line) in lines.iter().enumerate() {
        draw_text(buf, 0, y as u16, line.as_ref(), FG);
    }
}

pub(crate) fn glyph(cell: GridCell) -> char {
    match cell {
        GridCell::Wall => WALL_GLYPH,
        GridCell::Obstacle => OBSTACLE_GLYPH,
        GridCell::Empty => EMPTY_GLYPH,
    }
}

fn glyph_color(cell: GridCell) -> Color {
    match cell {
        GridCell::Wall => Color::DarkGrey,
        GridCell::Obstacle => Color::Red,
        GridCell::Empty => FG,
    }
}

/// Arena one character per cell, player on top, status line underneath.
pub(crate) fn draw_arena(buf: &mut CellBuffer, view: &FrameView<'_>) {
    for (y, row) in view.grid.rows().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            buf.set(
                x as u16,
                y as u16,
                Cell {
                    ch: glyph(cell),
                    fg: glyph_color(cell),
                    bg: BG,
                },
            );
        }
    }
    buf.set(
        view.player.x as u16,
        view.player.row() as u16,
        Cell {
            ch: PLAYER_GLYPH,
            fg: Color::Yellow,
            bg: BG,
        },
    );

    let status = format!(
        "stage {:>2}   frames left {:>3}   obstacles {:>2}   <-/-> move   Esc menu",
        view.difficulty.stage,
        view.frames_left(),
        obstacles::count(view.grid)
    );
    draw_text(buf, 0, view.grid.size() as u16, &status, FG);
}
