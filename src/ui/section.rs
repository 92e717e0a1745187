//! Full-screen view of one story section while narrating or listening.
//!
//! Shows the section text, a scrolling input level history, and a footer with
//! the current state and the keys that apply to it.

use crate::recorder::session::{ButtonStates, VisualState};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Sparkline, Wrap},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

/// Level shown at the bottom of the meter.
const METER_RANGE_DB: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionCommand {
    /// No key, or a key with no meaning here
    Continue,
    /// Enter: stop and keep the take
    Confirm,
    /// 'r': discard the take
    Retake,
    /// Escape, 'q' or Ctrl+C
    Cancel,
}

/// Everything drawn in one frame.
pub struct SectionView<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub state: VisualState,
    pub buttons: ButtonStates,
    pub level_db: f32,
    pub elapsed: Duration,
}

pub struct SectionTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    level_history: Vec<u64>,
    last_sample_time: Instant,
    sample_interval: Duration,
    restored: bool,
}

impl SectionTui {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let width = terminal.size()?.width as usize;

        Ok(Self {
            terminal,
            level_history: vec![0; width],
            last_sample_time: Instant::now(),
            sample_interval: Duration::from_millis(50),
            restored: false,
        })
    }

    pub fn render(&mut self, view: &SectionView<'_>) -> Result<()> {
        let width = self.terminal.size()?.width as usize;
        if self.last_sample_time.elapsed() >= self.sample_interval {
            self.level_history.push(level_percent(view.level_db));
            self.last_sample_time = Instant::now();
        }
        resize_history(&mut self.level_history, width);

        let history = &self.level_history;
        self.terminal.draw(|frame| {
            let [text_area, meter_area, footer_area] = Layout::vertical([
                Constraint::Min(3),
                Constraint::Length(6),
                Constraint::Length(1),
            ])
            .areas(frame.area());

            let text = Paragraph::new(view.text)
                .wrap(Wrap { trim: true })
                .block(Block::bordered().title(view.title));
            frame.render_widget(text, text_area);

            let meter = Sparkline::default()
                .data(history)
                .max(100)
                .style(Style::default().fg(Color::Rgb(206, 224, 220)));
            frame.render_widget(meter, meter_area);

            frame.render_widget(Paragraph::new(footer_line(view)), footer_area);
        })?;
        Ok(())
    }

    /// Polls for a key for up to 50 ms.
    pub fn handle_input(&mut self) -> Result<SectionCommand> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Enter => SectionCommand::Confirm,
                    KeyCode::Char('r') => SectionCommand::Retake,
                    KeyCode::Char('q') | KeyCode::Esc => SectionCommand::Cancel,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        SectionCommand::Cancel
                    }
                    _ => SectionCommand::Continue,
                });
            }
        }
        Ok(SectionCommand::Continue)
    }

    /// Leaves the alternate screen and restores the terminal.
    pub fn cleanup(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for SectionTui {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!("Failed to restore terminal: {}", e);
        }
    }
}

/// Maps dBFS onto 0-100 over the top [`METER_RANGE_DB`] decibels.
pub fn level_percent(level_db: f32) -> u64 {
    (((level_db + METER_RANGE_DB) / METER_RANGE_DB) * 100.0).clamp(0.0, 100.0) as u64
}

/// `m:ss`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Keeps the newest `width` entries, left-padding with silence.
fn resize_history(history: &mut Vec<u64>, width: usize) {
    if history.len() > width {
        history.drain(..history.len() - width);
    } else if history.len() < width {
        let mut padded = vec![0; width - history.len()];
        padded.append(history);
        *history = padded;
    }
}

/// Key hints for the actions currently enabled.
pub fn key_hints(state: VisualState, buttons: ButtonStates) -> String {
    let mut hints = Vec::new();
    match state {
        VisualState::Recording => hints.push("Enter save"),
        VisualState::Playing => hints.push("Enter stop"),
        _ => {}
    }
    if state != VisualState::Recording && !buttons.retake_disabled {
        hints.push("r retake");
    }
    hints.push("Esc cancel");
    hints.join("  ")
}

fn footer_line<'a>(view: &SectionView<'_>) -> Line<'a> {
    let indicator = match view.state {
        VisualState::Recording => Span::styled("● ", Style::default().fg(Color::Red)),
        VisualState::Playing => Span::styled("▶ ", Style::default().fg(Color::Green)),
        _ => Span::raw("  "),
    };
    Line::from(vec![
        indicator,
        Span::raw(format_elapsed(view.elapsed)),
        Span::raw(" / "),
        Span::raw(format!("{:.0} dBFS", view.level_db)),
        Span::raw(" / "),
        Span::raw(view.state.label()),
        Span::raw("   "),
        Span::styled(
            key_hints(view.state, view.buttons),
            Style::default().fg(Color::Rgb(185, 207, 212)),
        ),
    ])
}
