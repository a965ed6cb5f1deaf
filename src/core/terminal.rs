//! Terminal setup/teardown, the terminal driver used around child processes, and the
//! main crossterm/ratatui event loop for burrow.
//!
//! The loop reads one key (queued keys first), hands it to the [Session], and redraws.
//! It polls with a short tick so a termination signal is noticed between keys.

use crate::app::{KeypressResult, Session};
use crate::ui;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, error};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(16);

/// Hands the terminal to a child process and takes it back afterwards.
pub trait TerminalDriver {
    fn suspend(&mut self) -> io::Result<()>;
    fn resume(&mut self) -> io::Result<()>;
}

/// Leaves raw mode and the alternate screen while a child runs.
#[derive(Debug, Default)]
pub struct CrosstermDriver;

impl TerminalDriver for CrosstermDriver {
    fn suspend(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, LeaveAlternateScreen, Show)?;
        disable_raw_mode()
    }

    fn resume(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        enable_raw_mode()
    }
}

/// Driver for sessions without a terminal, e.g. in tests.
#[derive(Debug, Default)]
pub struct NullDriver;

impl TerminalDriver for NullDriver {
    fn suspend(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps the terminal suspended for its lifetime. Resuming happens on drop, so it also
/// runs when the child failed or the caller returned early.
pub(crate) struct Suspended<'a> {
    driver: &'a mut dyn TerminalDriver,
}

impl<'a> Suspended<'a> {
    pub(crate) fn new(driver: &'a mut dyn TerminalDriver) -> io::Result<Self> {
        if let Err(e) = driver.suspend() {
            // half-suspended is worse than not suspended at all
            let _ = driver.resume();
            return Err(e);
        }
        Ok(Self { driver })
    }
}

impl Drop for Suspended<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.driver.resume() {
            error!("failed to restore terminal after child process: {}", e);
        }
    }
}

/// Source of key events for the lookahead read after an ambiguous key.
pub trait KeySource {
    /// Returns a key if one is available within `timeout`. A zero timeout never blocks.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Reads keys from the crossterm event queue.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        next_key_press(timeout, |left| {
            if event::poll(left)? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        })
    }
}

/// Waits until `timeout` has passed for a key press.
///
/// Other events are skipped without ending the wait. A resize needs no handling here:
/// every handled key is followed by a draw, and the draw picks up the new size.
fn next_key_press<F>(timeout: Duration, mut next_event: F) -> io::Result<Option<KeyEvent>>
where
    F: FnMut(Duration) -> io::Result<Option<Event>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match next_event(left)? {
            None => return Ok(None),
            Some(Event::Key(key)) if key.kind == KeyEventKind::Press => return Ok(Some(key)),
            Some(other) => debug!("lookahead skipped {:?}", other),
        }
    }
}

/// Initializes the terminal in raw mode and alternate screen and runs the main event loop.
///
/// Blocks until quit. The terminal is restored even when the loop fails.
pub fn run_terminal(session: &mut Session) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session,
) -> io::Result<()> {
    let mut keys = CrosstermKeys;
    terminal.draw(|f| ui::render(f, session))?;

    loop {
        if session.tick() {
            break;
        }

        let key = match session.take_queued_key() {
            Some(key) => key,
            None => {
                if !event::poll(TICK)? {
                    continue;
                }
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => key,
                    Event::Resize(_, _) => {
                        terminal.draw(|f| ui::render(f, session))?;
                        continue;
                    }
                    _ => continue,
                }
            }
        };

        match session.handle_keypress(key, &mut keys) {
            KeypressResult::Quit => break,
            KeypressResult::OpenedChild => {
                // the child may have drawn anything
                terminal.clear()?;
            }
            KeypressResult::Continue | KeypressResult::Consumed => {}
        }
        terminal.draw(|f| ui::render(f, session))?;
    }
    Ok(())
}
