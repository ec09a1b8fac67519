use std::io::{stdout, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use super::{Border, Surface};
use crate::cw::{Symbol, ALPHABET_SIZE};

/// Learned symbols shown per header line
const LEARNED_PER_LINE: usize = 20;

/// Box geometry, in terminal cells
const BOX_TOP: u16 = 4;
const BOX_WIDTH: u16 = 22;
const BOX_HEIGHT: u16 = 9;
const PAUSED_ROW: u16 = BOX_TOP + BOX_HEIGHT + 1;
const HELP_ROW: u16 = PAUSED_ROW + 2;

/// Renders the trainer in the terminal with crossterm
pub struct TerminalSurface {
    out: Stdout,
    lamp: bool,
    border: Border,
    caption: Option<Symbol>,
    paused: bool,
    learned: Vec<Symbol>,
    fresh: bool,
    /// Cleared by `shutdown`; late updates are dropped after that
    active: bool,
}

impl TerminalSurface {
    /// Switch to the alternate screen and draw the empty box
    pub fn new() -> std::io::Result<Self> {
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide)?;

        let mut surface = Self {
            out,
            lamp: false,
            border: Border::Normal,
            caption: None,
            paused: false,
            learned: Vec::new(),
            fresh: false,
            active: true,
        };
        surface.redraw();
        Ok(surface)
    }

    /// Full repaint, e.g. after a resize
    pub fn redraw(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.draw() {
            tracing::warn!(target: "display", "redraw failed: {}", e);
        }
    }

    /// Restore the normal screen
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.out, cursor::Show, LeaveAlternateScreen)
    }

    fn draw(&mut self) -> std::io::Result<()> {
        queue!(self.out, terminal::Clear(ClearType::All))?;
        self.draw_header()?;
        self.draw_box()?;
        self.draw_footer()?;
        self.out.flush()
    }

    fn draw_header(&mut self) -> std::io::Result<()> {
        let count_colour = if self.fresh { Color::Green } else { Color::White };
        queue!(
            self.out,
            cursor::MoveTo(0, 0),
            SetForegroundColor(count_colour),
            Print(format!(
                "Letters learned {}/{}",
                self.learned.len(),
                ALPHABET_SIZE
            )),
            ResetColor
        )?;

        for (row, line) in self.learned.chunks(LEARNED_PER_LINE).take(2).enumerate() {
            let text: Vec<String> = line.iter().map(|s| s.to_string()).collect();
            queue!(
                self.out,
                cursor::MoveTo(0, 1 + row as u16),
                Print(text.join(" "))
            )?;
        }
        Ok(())
    }

    fn draw_box(&mut self) -> std::io::Result<()> {
        // Paused forces the neutral look regardless of what playback last set
        let (border, lamp, caption) = if self.paused {
            (Border::Normal, false, None)
        } else {
            (self.border, self.lamp, self.caption)
        };

        let frame = border_colour(border);
        let fill = if lamp { '█' } else { ' ' };
        let inner_width = (BOX_WIDTH - 2) as usize;

        for row in 0..BOX_HEIGHT {
            queue!(self.out, cursor::MoveTo(0, BOX_TOP + row))?;
            let is_edge = row == 0 || row == BOX_HEIGHT - 1;
            if is_edge {
                queue!(
                    self.out,
                    SetForegroundColor(frame),
                    Print("█".repeat(BOX_WIDTH as usize)),
                    ResetColor
                )?;
                continue;
            }

            let interior: String = std::iter::repeat(fill).take(inner_width).collect();
            queue!(
                self.out,
                SetForegroundColor(frame),
                Print('█'),
                SetForegroundColor(Color::White),
                Print(interior),
                SetForegroundColor(frame),
                Print('█'),
                ResetColor
            )?;
        }

        if let Some(symbol) = caption {
            queue!(
                self.out,
                cursor::MoveTo(BOX_WIDTH / 2, BOX_TOP + BOX_HEIGHT / 2),
                SetForegroundColor(frame),
                Print(symbol.as_char()),
                ResetColor
            )?;
        }
        Ok(())
    }

    fn draw_footer(&mut self) -> std::io::Result<()> {
        let paused = if self.paused { "Paused" } else { "" };
        queue!(
            self.out,
            cursor::MoveTo(BOX_WIDTH / 2 - 3, PAUSED_ROW),
            Print(paused),
            cursor::MoveTo(0, HELP_ROW),
            SetForegroundColor(Color::DarkGrey),
            Print("Type the character you hear | Esc: pause/resume | Ctrl+C: quit"),
            ResetColor
        )?;
        Ok(())
    }
}

impl Surface for TerminalSurface {
    fn set_lamp(&mut self, on: bool) {
        self.lamp = on;
        self.redraw();
    }

    fn set_border(&mut self, border: Border) {
        self.border = border;
        self.redraw();
    }

    fn set_caption(&mut self, caption: Option<Symbol>) {
        self.caption = caption;
        self.redraw();
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.redraw();
    }

    fn set_learned(&mut self, learned: &[Symbol], fresh: bool) {
        self.learned = learned.to_vec();
        self.fresh = fresh;
        self.redraw();
    }

    fn reset(&mut self) {
        self.lamp = false;
        self.border = Border::Normal;
        self.caption = None;
        self.redraw();
    }
}

fn border_colour(border: Border) -> Color {
    match border {
        Border::Normal => Color::White,
        Border::Correct => Color::Green,
        Border::Error => Color::Red,
        Border::TooSlow => Color::DarkYellow,
    }
}
