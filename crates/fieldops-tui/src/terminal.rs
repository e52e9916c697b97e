//! Raw-mode terminal session and the input task that feeds the app loop.
//!
//! [`Session`] owns the alternate screen for as long as it lives; dropping
//! it (or panicking) puts the terminal back. [`Input`] spawns a reader that
//! turns crossterm events into [`InputEvent`]s and paces redraws.

use std::io::{Stdout, stdout};
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{Event as TermEvent, EventStream, KeyEvent, KeyEventKind};
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Alternate-screen session. Restores the terminal on drop.
pub struct Session {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Session {
    /// Switch to raw mode and the alternate screen.
    pub fn start() -> Result<Self> {
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        terminal::enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?.execute(cursor::Hide)?;
        terminal.clear()?;
        Ok(Self { terminal })
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        restore();
    }
}

/// Ignores errors: this runs from `Drop` and the panic hook.
fn restore() {
    let _ = terminal::disable_raw_mode();
    let _ = stdout()
        .execute(LeaveAlternateScreen)
        .and_then(|out| out.execute(cursor::Show));
}

/// Install color-eyre hooks that leave the alternate screen before a panic
/// or error report is printed. Call before [`Session::start`].
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    let panic_hook = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        panic_hook(info);
    }));
    Ok(())
}

/// What the input task hands to the app loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// The screen geometry or focus changed; the next frame must redraw.
    Invalidate,
    /// Frame clock. Drives redraws and toast expiry.
    Frame,
}

/// Map a raw terminal event. Key releases and repeats are dropped.
fn translate(event: TermEvent) -> Option<InputEvent> {
    match event {
        TermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(InputEvent::Key(key)),
        TermEvent::Resize(..) | TermEvent::FocusGained => Some(InputEvent::Invalidate),
        _ => None,
    }
}

/// Background terminal reader. Stops when dropped.
pub struct Input {
    rx: mpsc::UnboundedReceiver<InputEvent>,
    cancel: CancellationToken,
}

impl Input {
    pub fn spawn(frame_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(read_terminal(tx, cancel.clone(), frame_interval));
        Self { rx, cancel }
    }

    /// `None` once the reader has stopped.
    pub async fn recv(&mut self) -> Option<InputEvent> {
        self.rx.recv().await
    }
}

impl Drop for Input {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_terminal(
    tx: mpsc::UnboundedSender<InputEvent>,
    cancel: CancellationToken,
    frame_interval: Duration,
) {
    let mut stream = EventStream::new();
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => return,
            _ = frames.tick() => InputEvent::Frame,
            raw = stream.next() => match raw {
                Some(Ok(raw)) => match translate(raw) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(_)) => continue,
                None => return,
            },
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}
