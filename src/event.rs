use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::fs::watcher::ChangeSignal;
use crate::preview::Preview;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event (width, height).
    #[allow(dead_code)]
    Resize(u16, u16),
    /// Filesystem change reported for a watched directory.
    FsChange(ChangeSignal),
    /// A preview worker finished.
    PreviewReady(Preview),
}

/// Outcome of one wait for terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Paused,
    Ready,
    Idle,
}

/// Wait for input with `poll` unless paused.
///
/// The flag is checked again once input is ready, so input arriving after
/// [`EventHandler::pause`] stays queued for the child process.
fn poll_input(paused: &AtomicBool, poll: impl FnOnce() -> bool) -> Readiness {
    if paused.load(Ordering::Acquire) {
        return Readiness::Paused;
    }
    if !poll() {
        return Readiness::Idle;
    }
    if paused.load(Ordering::Acquire) {
        Readiness::Paused
    } else {
        Readiness::Ready
    }
}

/// Async event handler that polls crossterm events and forwards them via a channel.
///
/// Change signals and preview results share the same channel, so the main
/// loop is the only consumer of everything that mutates state.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
    paused: Arc<AtomicBool>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();
        let paused = Arc::new(AtomicBool::new(false));
        let reader_paused = Arc::clone(&paused);

        tokio::spawn(async move {
            loop {
                match poll_input(&reader_paused, || event::poll(tick_rate).unwrap_or(false)) {
                    // A child process owns the terminal; leave its input alone.
                    Readiness::Paused => tokio::time::sleep(tick_rate).await,
                    Readiness::Ready => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if event_tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => {
                            if event_tx.send(Event::Resize(w, h)).is_err() {
                                break;
                            }
                        }
                        _ => {}
                    },
                    Readiness::Idle => {
                        if event_tx.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, tx, paused }
    }

    /// Get a sender clone for the watcher and preview workers.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Stop reading terminal input until [`EventHandler::resume`].
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}
