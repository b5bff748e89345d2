use crate::ui::{restore_terminal, setup_terminal};
use crossterm::event::{self, Event};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use std::io::{self, IsTerminal, Stdout};
use thiserror::Error;

/// Faults that stop the program before the calendar is shown.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("ccal requires an interactive terminal")]
    NoTerminal,
    #[error("could not initialize the terminal: {0}")]
    TerminalInit(#[source] io::Error),
}

/// Character-grid display the event loop draws to and reads input from.
///
/// The frame handed to `draw` carries the current size; writes into its
/// buffer are clipped by the renderer.
pub trait Surface {
    /// Renders one frame and flushes it to the display.
    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()>;
    /// Blocks until the next key press or resize.
    fn next_event(&mut self) -> io::Result<Event>;
    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()>;
}

/// The real terminal: raw mode, alternate screen, crossterm input.
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSurface {
    pub fn new() -> Result<Self, StartupError> {
        if !io::stdout().is_terminal() {
            return Err(StartupError::NoTerminal);
        }
        let mut terminal = setup_terminal().map_err(StartupError::TerminalInit)?;
        if let Err(e) = terminal.hide_cursor() {
            let _ = restore_terminal(&mut terminal);
            return Err(StartupError::TerminalInit(e));
        }
        Ok(TerminalSurface { terminal })
    }

    pub fn restore(&mut self) -> io::Result<()> {
        restore_terminal(&mut self.terminal)
    }
}

impl Surface for TerminalSurface {
    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|f| render(f))?;
        Ok(())
    }

    fn next_event(&mut self) -> io::Result<Event> {
        event::read()
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        if visible {
            self.terminal.show_cursor()
        } else {
            self.terminal.hide_cursor()
        }
    }
}
