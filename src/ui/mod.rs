//! Character-display UI: the menu state machine and its frames.

pub mod menu;

use core::fmt;

pub use menu::{Menu, MenuView, Screen};

/// Display geometry (HD44780 20x4).
pub const COLS: usize = 20;
pub const ROWS: usize = 4;

pub type Line = heapless::String<COLS>;

/// One full screen of text.  Lines longer than [`COLS`] are truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: [Line; ROWS],
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `row`, truncating to the display width.  Rows past the
    /// bottom are ignored.
    pub fn set(&mut self, row: usize, text: &str) {
        let Some(line) = self.lines.get_mut(row) else {
            return;
        };
        line.clear();
        for ch in text.chars() {
            if line.push(ch).is_err() {
                break;
            }
        }
    }

    /// Format straight into `row`.
    pub fn set_fmt(&mut self, row: usize, args: fmt::Arguments<'_>) {
        self.set(row, &args.to_string());
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", |l| l.as_str())
    }

    pub fn lines(&self) -> &[Line; ROWS] {
        &self.lines
    }

    /// Frame holding a short notice on the first rows.
    pub fn message(rows: &[&str]) -> Self {
        let mut f = Self::new();
        for (i, text) in rows.iter().enumerate() {
            f.set(i, text);
        }
        f
    }
}
