// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event},
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::{Cell, Intensity};
use crate::frame::Frame;

#[derive(Clone, Copy, Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    intensity: Intensity,
}

/// What the frame loop needs from the outside world: the current size,
/// pending input and somewhere to present frames.
pub trait Screen {
    fn size(&mut self) -> Result<(u16, u16)>;

    /// Next pending event, or `None` when nothing is queued. Never blocks.
    fn next_event(&mut self) -> Result<Option<Event>>;

    fn draw(&mut self, frame: &mut Frame) -> Result<()>;
}

/// Owns the terminal while the rain runs: raw mode, alternate screen and a
/// hidden cursor, all undone on drop.
pub struct Terminal {
    stdout: Stdout,
    last_size: Option<(u16, u16)>,
    run_buf: String,
    row_dirty: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last_size: None,
            run_buf: String::with_capacity(64),
            row_dirty: Vec::new(),
            touched_rows: Vec::new(),
        })
    }

    fn switch_pen(&mut self, pen: &mut Pen, cell: &Cell) -> Result<()> {
        if cell.fg != pen.fg {
            self.stdout
                .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            pen.fg = cell.fg;
        }
        if cell.bg != pen.bg {
            self.stdout
                .queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            pen.bg = cell.bg;
        }
        if cell.intensity != pen.intensity {
            self.stdout.queue(SetAttribute(Attribute::NormalIntensity))?;
            match cell.intensity {
                Intensity::Bold => {
                    self.stdout.queue(SetAttribute(Attribute::Bold))?;
                }
                Intensity::Dim => {
                    self.stdout.queue(SetAttribute(Attribute::Dim))?;
                }
                Intensity::Normal => {}
            }
            pen.intensity = cell.intensity;
        }
        Ok(())
    }

    /// Presents `frame` and flushes once. A geometry change since the last
    /// call clears the screen first so no glyphs from the old layout survive.
    fn draw_frame(&mut self, frame: &mut Frame) -> Result<()> {
        let mut pen = Pen::default();
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;

        let size = (frame.width, frame.height);
        let resized = self.last_size != Some(size);
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last_size = Some(size);
        }

        let total_cells = frame.width as usize * frame.height as usize;
        let dirty_is_large = total_cells > 0 && frame.dirty_indices().len() >= (total_cells / 3);

        if resized || frame.is_dirty_all() || dirty_is_large {
            for y in 0..frame.height {
                self.stdout.queue(cursor::MoveTo(0, y))?;
                for x in 0..frame.width {
                    let idx = y as usize * frame.width as usize + x as usize;
                    let cell = frame.cell_at_index(idx);
                    self.switch_pen(&mut pen, &cell)?;
                    self.stdout.queue(Print(cell.ch))?;
                }
            }
        } else {
            self.draw_dirty_runs(frame, &mut pen)?;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    fn draw_dirty_runs(&mut self, frame: &Frame, pen: &mut Pen) -> Result<()> {
        let width_usize = frame.width as usize;
        let mut cur_pos: Option<(u16, u16)> = None;

        if self.row_dirty.len() != frame.height as usize {
            self.row_dirty = vec![Vec::new(); frame.height as usize];
        }
        for r in &mut self.row_dirty {
            r.clear();
        }
        self.touched_rows.clear();

        for &idx in frame.dirty_indices() {
            let y = (idx / width_usize) as u16;
            if y >= frame.height {
                continue;
            }
            let b = &mut self.row_dirty[y as usize];
            if b.is_empty() {
                self.touched_rows.push(y);
            }
            b.push(idx);
        }
        self.touched_rows.sort_unstable();

        let rows = std::mem::take(&mut self.touched_rows);
        for &y0 in &rows {
            let mut b = std::mem::take(&mut self.row_dirty[y0 as usize]);
            b.sort_unstable();

            let mut i = 0usize;
            while i < b.len() {
                let idx0 = b[i];
                let cell0 = frame.cell_at_index(idx0);
                let x0 = (idx0 % width_usize) as u16;

                self.run_buf.clear();
                self.run_buf.push(cell0.ch);
                let mut run_len: u16 = 1;
                let mut j = i + 1;
                while j < b.len() && b[j] == b[j - 1] + 1 {
                    let cell1 = frame.cell_at_index(b[j]);
                    if cell1.fg != cell0.fg
                        || cell1.bg != cell0.bg
                        || cell1.intensity != cell0.intensity
                    {
                        break;
                    }
                    self.run_buf.push(cell1.ch);
                    run_len = run_len.saturating_add(1);
                    j += 1;
                }

                if cur_pos != Some((x0, y0)) {
                    self.stdout.queue(cursor::MoveTo(x0, y0))?;
                }
                self.switch_pen(pen, &cell0)?;
                self.stdout.queue(Print(self.run_buf.as_str()))?;

                let next_x = x0.saturating_add(run_len);
                cur_pos = (next_x < frame.width).then_some((next_x, y0));
                i = j;
            }

            b.clear();
            self.row_dirty[y0 as usize] = b;
        }
        self.touched_rows = rows;
        Ok(())
    }
}

impl Screen for Terminal {
    fn size(&mut self) -> Result<(u16, u16)> {
        terminal::size()
    }

    fn next_event(&mut self) -> Result<Option<Event>> {
        if event::poll(Duration::ZERO)? {
            event::read().map(Some)
        } else {
            Ok(None)
        }
    }

    fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        self.draw_frame(frame)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.flush();
        restore_terminal_best_effort();
    }
}

/// Puts the terminal back into cooked mode on the main screen. Safe to call
/// more than once and from panic or signal context.
pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
