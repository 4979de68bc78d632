/// Progress bar geometry and full-screen frame drawing
use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor},
    terminal::{Clear, ClearType},
};

use crate::config::{Configuration, Rgb};
use crate::timer::Interval;

/// Columns kept free for the `MM:SS Label ┃` prefix and closing border.
pub const RESERVED_COLUMNS: u16 = 30;

/// Used when the terminal size cannot be queried.
pub const FALLBACK_COLUMNS: u16 = 80;

const EMPTY_CELL: Rgb = Rgb::new(0, 0, 0);
const BORDER: &str = "\u{2503}";

/// Current terminal width in columns.
pub fn terminal_columns() -> u16 {
    crossterm::terminal::size()
        .map(|(columns, _)| columns)
        .unwrap_or(FALLBACK_COLUMNS)
}

/// Bar cells that fit beside the reserved prefix, zero on narrow terminals.
pub fn bar_length(columns: u16) -> usize {
    usize::from(columns.saturating_sub(RESERVED_COLUMNS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarCells {
    pub completed: usize,
    pub remaining: usize,
}

/// Splits the bar for a tick.
///
/// Counting `elapsed + 1` makes the first tick of a long interval already
/// paint a cell and the last tick paint the whole bar.
pub fn bar_cells(bar_length: usize, elapsed: u64, total: u64) -> BarCells {
    let completed = if total == 0 {
        bar_length
    } else {
        let filled = bar_length as u64 * (elapsed + 1) / total;
        usize::try_from(filled).map_or(bar_length, |filled| filled.min(bar_length))
    };
    BarCells {
        completed,
        remaining: bar_length - completed,
    }
}

fn plural(count: u64) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn background(color: Rgb) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Clears the screen and redraws the header and bar for one tick.
pub fn draw<W: Write>(
    out: &mut W,
    interval: &Interval,
    elapsed: u64,
    config: &Configuration,
    columns: u16,
) -> io::Result<()> {
    let left = interval.total_seconds.saturating_sub(elapsed);
    let (minutes, seconds) = (left / 60, left % 60);
    let label = interval.phase.label();
    let cells = bar_cells(bar_length(columns), elapsed, interval.total_seconds);

    queue!(
        out,
        MoveTo(0, 0),
        Clear(ClearType::FromCursorDown),
        Print(format!("Session {}\n", interval.session)),
        Print(format!(
            "{label} for {minutes} minute{} {seconds} second{}.\n",
            plural(minutes),
            plural(seconds)
        )),
        Print(format!("\r{minutes:02}:{seconds:02} {label} {BORDER}")),
        SetBackgroundColor(background(interval.phase.color(config))),
        Print(" ".repeat(cells.completed)),
        SetBackgroundColor(background(EMPTY_CELL)),
        Print(" ".repeat(cells.remaining)),
        ResetColor,
        Print(BORDER),
    )?;
    out.flush()
}
