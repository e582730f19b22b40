//! Progress reporting for the clean and build pipelines.
//!
//! Pipelines talk to a [`Ui`]; `SilentUi` drops everything (tracing already
//! records it), `UiApp` draws a full-screen load dashboard for `build --tui`.

mod dashboard;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fmt;
use std::io::{self, Stdout};
use std::path::Path;
use std::time::Duration;

use dashboard::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reading,
    Expanding,
    Writing,
    Loading,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Reading => "Reading records",
            Phase::Expanding => "Expanding box ranges",
            Phase::Writing => "Writing cleaned records",
            Phase::Loading => "Loading store",
            Phase::Complete => "Complete",
        })
    }
}

/// Rows committed to the store so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wells: usize,
    pub files: usize,
    pub boxes: usize,
}

pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    /// The record file being processed
    fn set_source(&mut self, path: &Path);
    /// A well finished loading; `done` of `total` wells are through
    fn well_loaded(&mut self, done: usize, total: usize, tally: Tally);
    /// A file (or well) was abandoned
    fn file_failed(&mut self, message: &str);
    fn note(&mut self, message: &str);
}

/// Full-screen dashboard on the alternate screen
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    dashboard: Dashboard,
    restored: bool,
}

impl UiApp {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self {
            terminal,
            dashboard: Dashboard::new(),
            restored: false,
        })
    }

    fn redraw(&mut self) {
        let dashboard = &self.dashboard;
        if let Err(err) = self.terminal.draw(|frame| dashboard.render(frame)) {
            tracing::debug!(error = %err, "dashboard redraw failed");
        }
    }

    /// Show the final summary and keep it up until a key is pressed
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.dashboard.set_phase(Phase::Complete);
        self.dashboard.note(summary);
        self.dashboard.note("Press any key to exit");
        self.redraw();

        loop {
            if !event::poll(Duration::from_millis(200))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
        self.restore()
    }

    /// Give the terminal back without waiting
    pub fn restore(mut self) -> Result<()> {
        self.leave()
    }

    fn leave(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.dashboard.set_phase(phase);
        self.redraw();
    }

    fn set_source(&mut self, path: &Path) {
        self.dashboard.set_source(path.display().to_string());
        self.redraw();
    }

    fn well_loaded(&mut self, done: usize, total: usize, tally: Tally) {
        self.dashboard.well_loaded(done, total, tally);
        self.redraw();
    }

    fn file_failed(&mut self, message: &str) {
        self.dashboard.file_failed(message);
        self.redraw();
    }

    fn note(&mut self, message: &str) {
        self.dashboard.note(message);
        self.redraw();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        self.leave().ok();
    }
}

#[derive(Debug, Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_source(&mut self, _path: &Path) {}
    fn well_loaded(&mut self, _done: usize, _total: usize, _tally: Tally) {}
    fn file_failed(&mut self, _message: &str) {}
    fn note(&mut self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Expanding.to_string(), "Expanding box ranges");
        assert_eq!(Phase::Loading.to_string(), "Loading store");
    }
}
