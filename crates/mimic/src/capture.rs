//! Event capture adapter
//!
//! A platform hook delivers raw input over a channel; a drain thread stamps
//! each event with elapsed seconds since recording start and appends it to
//! the store. Coordinates pass through exactly as the OS reports them.

use crate::error::HookError;
use crate::events::{Button, Event, EventKind, Key, KeyAction, MouseAction};
use crate::store::EventStore;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const CHANNEL_CAPACITY: usize = 4096;
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Raw input reported by a platform hook, before timestamping.
#[derive(Debug, Clone)]
pub enum RawInput {
    MouseMove { x: f64, y: f64 },
    MouseButton { x: f64, y: f64, button: Button, pressed: bool },
    MouseScroll { x: f64, y: f64, dx: i32, dy: i32 },
    Key { key: Key, pressed: bool },
}

impl RawInput {
    fn is_mouse(&self) -> bool {
        !matches!(self, RawInput::Key { .. })
    }
}

/// Hook subscription options.
#[derive(Debug, Clone, Copy)]
pub struct HookOptions {
    /// When false, only keyboard hooks are installed.
    pub mouse: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self { mouse: true }
    }
}

/// External input-hook provider. `subscribe` installs the OS hooks and
/// delivers raw events on `tx` until `stop` is set, typically from a
/// background thread it owns.
pub trait InputHook {
    fn subscribe(
        &self,
        opts: HookOptions,
        tx: Sender<RawInput>,
        stop: Arc<AtomicBool>,
    ) -> Result<(), HookError>;
}

/// Starts capture sessions against an [`EventStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Recorder {
    pub opts: HookOptions,
}

impl Recorder {
    pub fn new(opts: HookOptions) -> Self {
        Self { opts }
    }

    /// Clear the store and start capturing. The returned handle owns the
    /// session; drop without `stop` leaves the hook running.
    pub fn start(
        &self,
        hook: &dyn InputHook,
        store: &EventStore,
    ) -> Result<RecordingHandle, HookError> {
        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));

        store.clear();
        let start = Instant::now();
        hook.subscribe(self.opts, tx, Arc::clone(&stop))?;

        let drain_store = store.clone();
        let drain_stop = Arc::clone(&stop);
        let opts = self.opts;
        let drain = thread::spawn(move || drain_loop(rx, drain_store, start, opts, drain_stop));

        info!(mouse = self.opts.mouse, "recording started");
        Ok(RecordingHandle {
            stop,
            drain,
            store: store.clone(),
        })
    }
}

/// Owns an active capture session.
pub struct RecordingHandle {
    stop: Arc<AtomicBool>,
    drain: thread::JoinHandle<()>,
    store: EventStore,
}

impl RecordingHandle {
    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }

    /// Events captured so far.
    pub fn event_count(&self) -> usize {
        self.store.len()
    }

    /// Unsubscribe the hooks and return the final event count.
    pub fn stop(self) -> usize {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.drain.join();
        let count = self.store.len();
        info!(events = count, "recording stopped");
        count
    }
}

fn drain_loop(
    rx: Receiver<RawInput>,
    store: EventStore,
    start: Instant,
    opts: HookOptions,
    stop: Arc<AtomicBool>,
) {
    loop {
        match rx.recv_timeout(DRAIN_POLL) {
            Ok(raw) => stamp_and_append(raw, &store, start, opts),
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    // Pick up anything still buffered after the stop signal.
    while let Ok(raw) = rx.try_recv() {
        stamp_and_append(raw, &store, start, opts);
    }
    debug!(events = store.len(), "capture drain finished");
}

fn stamp_and_append(raw: RawInput, store: &EventStore, start: Instant, opts: HookOptions) {
    if !opts.mouse && raw.is_mouse() {
        return;
    }
    let time = start.elapsed().as_secs_f64();
    let kind = match raw {
        RawInput::MouseMove { x, y } => EventKind::Mouse(MouseAction::Move { x, y }),
        RawInput::MouseButton {
            x,
            y,
            button,
            pressed,
        } => EventKind::Mouse(MouseAction::Click {
            x,
            y,
            button,
            pressed,
        }),
        RawInput::MouseScroll { x, y, dx, dy } => {
            EventKind::Mouse(MouseAction::Scroll { x, y, dx, dy })
        }
        RawInput::Key { key, pressed } => {
            if pressed {
                EventKind::Key(KeyAction::Press { key })
            } else {
                EventKind::Key(KeyAction::Release { key })
            }
        }
    };
    store.append(Event::new(kind, time));
}
