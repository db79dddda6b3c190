// Terminal display - Character-cell output using crossterm
//
// Each cell is a blank painted with a background color. The display takes
// over the terminal (alternate screen, raw mode, hidden cursor) on open and
// gives it back on close. A shadow grid remembers what every cell shows so
// unchanged cells cost nothing on the next frame.

use super::{ColorClass, DisplaySink};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::{cursor, execute, queue, terminal};
use std::io::{self, BufWriter, Stdout, Write};

/// Terminal color for a color class
pub fn terminal_color(color: ColorClass) -> Color {
    match color {
        ColorClass::None => Color::Reset,
        ColorClass::Red => Color::DarkRed,
        ColorClass::Green => Color::DarkGreen,
        ColorClass::Blue => Color::DarkBlue,
    }
}

/// crossterm-backed display sink
pub struct TerminalDisplay {
    out: BufWriter<Stdout>,
    cols: usize,
    rows: usize,
    shadow: Vec<Option<ColorClass>>,
    active: bool,
}

impl TerminalDisplay {
    /// Take over the terminal
    ///
    /// # Returns
    /// The display, or the I/O error that prevented switching the terminal
    /// into raw mode / the alternate screen
    pub fn open() -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;

        terminal::enable_raw_mode()?;
        let mut out = BufWriter::new(io::stdout());
        if let Err(e) = execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }

        log::debug!("terminal display opened at {}x{} cells", cols, rows);

        Ok(Self {
            out,
            cols: cols as usize,
            rows: rows as usize,
            shadow: vec![None; cols as usize * rows as usize],
            active: true,
        })
    }

    /// Pick up a terminal resize, forgetting everything drawn so far
    fn sync_size(&mut self) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let (cols, rows) = (cols as usize, rows as usize);

        if (cols, rows) != (self.cols, self.rows) {
            self.cols = cols;
            self.rows = rows;
            self.shadow = vec![None; cols * rows];
            queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        }

        Ok(())
    }
}

impl DisplaySink for TerminalDisplay {
    fn set_cell(&mut self, row: usize, col: usize, color: ColorClass) -> io::Result<()> {
        if row >= self.rows || col >= self.cols {
            return Ok(());
        }

        let index = row * self.cols + col;
        if self.shadow[index] == Some(color) {
            return Ok(());
        }

        queue!(
            self.out,
            cursor::MoveTo(col as u16, row as u16),
            SetBackgroundColor(terminal_color(color)),
            Print(' ')
        )?;
        self.shadow[index] = Some(color);

        Ok(())
    }

    fn present(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor)?;
        self.out.flush()?;
        self.sync_size()
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let restored = execute!(
            self.out,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        terminal::disable_raw_mode()?;
        restored
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
