//! Playback engine
//!
//! A single background worker walks the event sequence, sleeping
//! `(event.time - prev) / speed` between emissions and re-issuing each
//! event through an [`InputSink`]. Coordination with the caller is two
//! shared flags (`paused`, `stop`) polled at a fixed short interval, the
//! same shape the capture side uses. A failed emission is logged and
//! skipped; it never aborts the run.

use crate::error::{PlaybackError, SinkError};
use crate::events::{Button, Event, EventKind, Key, KeyAction, MouseAction};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the worker polls the pause/stop flags.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// External input-synthesis provider. Positions accompany button and
/// scroll calls because most backends post absolute events.
pub trait InputSink: Send + Sync {
    fn move_to(&self, x: f64, y: f64) -> Result<(), SinkError>;
    fn button(&self, x: f64, y: f64, button: &Button, pressed: bool) -> Result<(), SinkError>;
    fn scroll(&self, x: f64, y: f64, dx: i32, dy: i32) -> Result<(), SinkError>;
    fn key(&self, key: &Key, pressed: bool) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackOptions {
    /// Factor dividing all inter-event delays. 2.0 plays twice as fast.
    pub speed: f64,
    /// Restart from the beginning after natural completion, until stopped.
    pub loop_forever: bool,
    /// When false, mouse events are skipped during emission.
    pub play_mouse: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            loop_forever: false,
            play_mouse: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    Idle = 0,
    Running = 1,
    Paused = 2,
    Stopping = 3,
}

impl PlaybackState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => PlaybackState::Running,
            2 => PlaybackState::Paused,
            3 => PlaybackState::Stopping,
            _ => PlaybackState::Idle,
        }
    }
}

/// Per-run emission counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub moves: usize,
    pub clicks: usize,
    pub scrolls: usize,
    pub keys: usize,
    pub errors: usize,
}

struct Shared {
    paused: AtomicBool,
    stop: AtomicBool,
    state: AtomicU8,
}

/// The playback engine. One logical run at a time; starting a second run
/// while one is active is rejected with [`PlaybackError::Busy`].
pub struct Player {
    shared: Arc<Shared>,
    worker: Mutex<Option<thread::JoinHandle<ReplayStats>>>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                paused: AtomicBool::new(false),
                stop: AtomicBool::new(false),
                state: AtomicU8::new(PlaybackState::Idle as u8),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.shared.state.load(Ordering::Relaxed))
    }

    pub fn is_active(&self) -> bool {
        self.state() != PlaybackState::Idle
    }

    /// Start a new playback run on a background worker.
    pub fn play(
        &self,
        events: Vec<Event>,
        opts: PlaybackOptions,
        sink: Arc<dyn InputSink>,
    ) -> Result<(), PlaybackError> {
        if events.is_empty() {
            return Err(PlaybackError::Empty);
        }
        if !(opts.speed > 0.0 && opts.speed.is_finite()) {
            return Err(PlaybackError::InvalidSpeed(opts.speed));
        }

        let mut worker = self.worker.lock();
        if self.is_active() {
            return Err(PlaybackError::Busy);
        }
        // Reap the previous run, if any.
        if let Some(handle) = worker.take() {
            let _ = handle.join();
        }

        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.stop.store(false, Ordering::SeqCst);
        self.shared
            .state
            .store(PlaybackState::Running as u8, Ordering::SeqCst);

        info!(
            events = events.len(),
            speed = opts.speed,
            looping = opts.loop_forever,
            "playback started"
        );
        let shared = Arc::clone(&self.shared);
        *worker = Some(thread::spawn(move || run(events, opts, sink, shared)));
        Ok(())
    }

    /// Suspend emission until `resume` or `stop`. No-op when idle.
    pub fn pause(&self) {
        if self.is_active() {
            self.shared.paused.store(true, Ordering::SeqCst);
            debug!("playback paused");
        }
    }

    /// No-op when idle.
    pub fn resume(&self) {
        if self.is_active() {
            self.shared.paused.store(false, Ordering::SeqCst);
            debug!("playback resumed");
        }
    }

    /// Abort the run without emitting further events. Idempotent; safe to
    /// call when idle.
    pub fn stop(&self) {
        if self.is_active() {
            self.shared
                .state
                .store(PlaybackState::Stopping as u8, Ordering::SeqCst);
        }
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);
    }

    /// Block until the current run finishes and return its stats.
    pub fn wait(&self) -> Option<ReplayStats> {
        let handle = self.worker.lock().take()?;
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                error!("playback worker panicked");
                Some(ReplayStats::default())
            }
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the flags and returns the state to idle when the worker exits,
/// whether it returns or unwinds. A stuck `Running` state would reject
/// every later `play` call.
struct IdleOnExit(Arc<Shared>);

impl Drop for IdleOnExit {
    fn drop(&mut self) {
        self.0.paused.store(false, Ordering::SeqCst);
        self.0
            .state
            .store(PlaybackState::Idle as u8, Ordering::SeqCst);
    }
}

fn run(
    events: Vec<Event>,
    opts: PlaybackOptions,
    sink: Arc<dyn InputSink>,
    shared: Arc<Shared>,
) -> ReplayStats {
    let _idle = IdleOnExit(Arc::clone(&shared));
    let mut stats = ReplayStats::default();

    'run: loop {
        // Relative timing resets at the start of every cycle.
        let mut prev = 0.0_f64;

        for event in &events {
            if shared.stop.load(Ordering::Relaxed) {
                break 'run;
            }

            // Pause suspends indefinitely, polled at a fixed interval,
            // before the delay for this event is computed.
            while shared.paused.load(Ordering::Relaxed) && !shared.stop.load(Ordering::Relaxed) {
                shared
                    .state
                    .store(PlaybackState::Paused as u8, Ordering::Relaxed);
                thread::sleep(POLL_INTERVAL);
            }
            if shared.stop.load(Ordering::Relaxed) {
                break 'run;
            }
            shared
                .state
                .store(PlaybackState::Running as u8, Ordering::Relaxed);

            let delay = (event.time - prev) / opts.speed;
            // Updated whether or not a pause happened above.
            prev = event.time;

            if delay > 0.0 {
                // Loaded files are taken as-is, so the delay may exceed
                // what a Duration can hold; saturate rather than panic.
                // The stop flag still cuts the sleep short.
                let sleep = Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX);
                if !sleep_observing_stop(sleep, &shared) {
                    break 'run;
                }
            }

            if !opts.play_mouse && event.is_mouse() {
                continue;
            }

            if let Err(e) = emit(sink.as_ref(), event, &mut stats) {
                stats.errors += 1;
                warn!(error = %e, time = event.time, "failed to emit event, continuing");
            }
        }

        if !opts.loop_forever {
            break;
        }
    }

    info!(
        moves = stats.moves,
        clicks = stats.clicks,
        scrolls = stats.scrolls,
        keys = stats.keys,
        errors = stats.errors,
        "playback finished"
    );
    stats
}

/// Sleep `total`, waking at poll boundaries to observe the stop flag.
/// Returns false if a stop was observed.
fn sleep_observing_stop(total: Duration, shared: &Shared) -> bool {
    let mut remaining = total;
    while remaining > Duration::ZERO {
        let step = remaining.min(POLL_INTERVAL);
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
        if shared.stop.load(Ordering::Relaxed) {
            return false;
        }
    }
    true
}

fn emit(sink: &dyn InputSink, event: &Event, stats: &mut ReplayStats) -> Result<(), SinkError> {
    match &event.kind {
        EventKind::Mouse(action) => match action {
            MouseAction::Move { x, y } => {
                sink.move_to(*x, *y)?;
                stats.moves += 1;
            }
            MouseAction::Click {
                x,
                y,
                button,
                pressed,
            } => {
                sink.button(*x, *y, button, *pressed)?;
                stats.clicks += 1;
            }
            MouseAction::Scroll { x, y, dx, dy } => {
                sink.scroll(*x, *y, *dx, *dy)?;
                stats.scrolls += 1;
            }
        },
        EventKind::Key(action) => match action {
            KeyAction::Press { key } => {
                sink.key(key, true)?;
                stats.keys += 1;
            }
            KeyAction::Release { key } => {
                sink.key(key, false)?;
                stats.keys += 1;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NamedKey;
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Move(f64, f64),
        Button(Button, bool),
        Scroll(i32, i32),
        Key(Key, bool),
    }

    /// Records calls with timestamps; rejects unknown identifiers the way
    /// a real backend would.
    #[derive(Default)]
    struct MockSink {
        calls: Mutex<Vec<(Instant, Call)>>,
    }

    impl MockSink {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().iter().map(|(_, c)| c.clone()).collect()
        }

        fn timestamps(&self) -> Vec<Instant> {
            self.calls.lock().iter().map(|(t, _)| *t).collect()
        }
    }

    impl InputSink for MockSink {
        fn move_to(&self, x: f64, y: f64) -> Result<(), SinkError> {
            self.calls.lock().push((Instant::now(), Call::Move(x, y)));
            Ok(())
        }

        fn button(&self, _x: f64, _y: f64, button: &Button, pressed: bool) -> Result<(), SinkError> {
            if let Button::Other(name) = button {
                return Err(SinkError::UnknownButton(name.clone()));
            }
            self.calls
                .lock()
                .push((Instant::now(), Call::Button(button.clone(), pressed)));
            Ok(())
        }

        fn scroll(&self, _x: f64, _y: f64, dx: i32, dy: i32) -> Result<(), SinkError> {
            self.calls.lock().push((Instant::now(), Call::Scroll(dx, dy)));
            Ok(())
        }

        fn key(&self, key: &Key, pressed: bool) -> Result<(), SinkError> {
            if let Key::Unknown(name) = key {
                return Err(SinkError::UnknownKey(name.clone()));
            }
            self.calls
                .lock()
                .push((Instant::now(), Call::Key(key.clone(), pressed)));
            Ok(())
        }
    }

    fn mouse_move(x: f64, y: f64, time: f64) -> Event {
        Event::new(EventKind::Mouse(MouseAction::Move { x, y }), time)
    }

    fn click(button: Button, pressed: bool, time: f64) -> Event {
        Event::new(
            EventKind::Mouse(MouseAction::Click {
                x: 10.0,
                y: 10.0,
                button,
                pressed,
            }),
            time,
        )
    }

    fn key_press(key: Key, time: f64) -> Event {
        Event::new(EventKind::Key(KeyAction::Press { key }), time)
    }

    #[test]
    fn empty_sequence_is_rejected_without_emission() {
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        let err = player
            .play(vec![], PlaybackOptions::default(), sink.clone())
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Empty));
        assert!(sink.calls().is_empty());
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn invalid_speed_is_rejected() {
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        let opts = PlaybackOptions {
            speed: 0.0,
            ..Default::default()
        };
        let err = player
            .play(vec![mouse_move(0.0, 0.0, 0.0)], opts, sink)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidSpeed(_)));
    }

    #[test]
    fn speed_divides_inter_event_delays() {
        // Move at 0.0, press at 0.5, release at 0.6, speed 2
        // => press ~0.25s after the move, release ~0.05s after that.
        let events = vec![
            mouse_move(10.0, 10.0, 0.0),
            click(Button::Left, true, 0.5),
            click(Button::Left, false, 0.6),
        ];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        let opts = PlaybackOptions {
            speed: 2.0,
            ..Default::default()
        };
        let started = Instant::now();
        player.play(events, opts, sink.clone()).unwrap();
        let stats = player.wait().unwrap();
        let total = started.elapsed();

        assert_eq!(
            sink.calls(),
            vec![
                Call::Move(10.0, 10.0),
                Call::Button(Button::Left, true),
                Call::Button(Button::Left, false),
            ]
        );
        assert_eq!(stats.moves, 1);
        assert_eq!(stats.clicks, 2);
        assert_eq!(stats.errors, 0);
        // 0.6s of timeline at 2x => ~0.3s wall clock.
        assert!(total >= Duration::from_millis(280), "total {total:?}");
        assert!(total < Duration::from_millis(650), "total {total:?}");

        let stamps = sink.timestamps();
        let gap = stamps[1] - stamps[0];
        assert!(gap >= Duration::from_millis(200), "gap {gap:?}");
        assert!(gap < Duration::from_millis(450), "gap {gap:?}");
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn stop_aborts_without_emitting_remaining_events() {
        let events = vec![mouse_move(0.0, 0.0, 0.0), mouse_move(1.0, 1.0, 10.0)];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        let started = Instant::now();
        player
            .play(events, PlaybackOptions::default(), sink.clone())
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        player.stop();
        player.wait().unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(sink.calls().len(), 1);
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn stop_is_idempotent_and_safe_when_idle() {
        let player = Player::new();
        player.stop();
        player.stop();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.wait().is_none());

        // A later run still works: play resets the flags.
        let sink = Arc::new(MockSink::default());
        player
            .play(
                vec![mouse_move(0.0, 0.0, 0.0)],
                PlaybackOptions::default(),
                sink.clone(),
            )
            .unwrap();
        player.wait().unwrap();
        assert_eq!(sink.calls().len(), 1);
    }

    #[test]
    fn absurd_time_value_does_not_wedge_the_player() {
        // A delay beyond Duration's range saturates instead of panicking
        // the worker, and stop still brings the engine back to idle.
        let events = vec![
            mouse_move(0.0, 0.0, 0.0),
            mouse_move(1.0, 1.0, 1e20),
        ];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        player
            .play(events, PlaybackOptions::default(), sink.clone())
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        player.stop();
        player.wait().unwrap();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(sink.calls().len(), 1);

        // The engine stays usable afterwards.
        player
            .play(
                vec![mouse_move(2.0, 2.0, 0.0)],
                PlaybackOptions::default(),
                sink.clone(),
            )
            .unwrap();
        player.wait().unwrap();
        assert_eq!(sink.calls().len(), 2);
    }

    #[test]
    fn backwards_time_step_plays_immediately() {
        // Loaded files are not validated, so times may go backwards; a
        // negative delta means no delay, and later delays are measured
        // from the backwards value.
        let events = vec![
            mouse_move(0.0, 0.0, 0.2),
            mouse_move(1.0, 1.0, 0.05),
            mouse_move(2.0, 2.0, 0.25),
        ];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        player
            .play(events, PlaybackOptions::default(), sink.clone())
            .unwrap();
        let stats = player.wait().unwrap();

        assert_eq!(stats.moves, 3);
        let stamps = sink.timestamps();
        assert!(
            stamps[1] - stamps[0] < Duration::from_millis(100),
            "backwards step waited {:?}",
            stamps[1] - stamps[0]
        );
        assert!(stamps[2] - stamps[1] >= Duration::from_millis(150));
    }

    #[test]
    fn pause_excludes_time_from_delays() {
        // First event fires at 0.3s; pause while the worker sleeps toward
        // it, so the pause is observed before the second event's delay.
        let events = vec![mouse_move(0.0, 0.0, 0.3), mouse_move(1.0, 1.0, 0.6)];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        player
            .play(events, PlaybackOptions::default(), sink.clone())
            .unwrap();

        thread::sleep(Duration::from_millis(100));
        player.pause();
        // Without the pause the second event would land at ~0.6s.
        thread::sleep(Duration::from_millis(600));
        assert_eq!(sink.calls().len(), 1);
        assert_eq!(player.state(), PlaybackState::Paused);

        player.resume();
        player.wait().unwrap();
        assert_eq!(sink.calls().len(), 2);

        // Paused time is excluded: the inter-event gap still spans the full
        // 0.3s delay on top of the pause.
        let stamps = sink.timestamps();
        let gap = stamps[1] - stamps[0];
        assert!(gap >= Duration::from_millis(650), "gap {gap:?}");
    }

    #[test]
    fn pause_and_resume_are_noops_when_idle() {
        let player = Player::new();
        player.pause();
        player.resume();
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn loop_mode_replays_until_stopped() {
        let events = vec![mouse_move(0.0, 0.0, 0.0), mouse_move(1.0, 1.0, 0.02)];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        let opts = PlaybackOptions {
            loop_forever: true,
            ..Default::default()
        };
        player.play(events, opts, sink.clone()).unwrap();
        thread::sleep(Duration::from_millis(300));
        player.stop();
        let stats = player.wait().unwrap();

        // More emissions than one pass of the sequence.
        assert!(stats.moves > 2, "moves {}", stats.moves);
        assert_eq!(sink.calls().len(), stats.moves);
    }

    #[test]
    fn concurrent_play_is_rejected() {
        let events = vec![mouse_move(0.0, 0.0, 0.0), mouse_move(1.0, 1.0, 5.0)];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        player
            .play(events.clone(), PlaybackOptions::default(), sink.clone())
            .unwrap();
        let err = player
            .play(events, PlaybackOptions::default(), sink)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Busy));
        player.stop();
        player.wait().unwrap();
    }

    #[test]
    fn bad_event_is_skipped_and_playback_continues() {
        let events = vec![
            key_press(Key::Unknown("Key.hyper_mega".into()), 0.0),
            click(Button::Other("button9".into()), true, 0.01),
            key_press(Key::Named(NamedKey::Enter), 0.02),
        ];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        player
            .play(events, PlaybackOptions::default(), sink.clone())
            .unwrap();
        let stats = player.wait().unwrap();

        assert_eq!(stats.errors, 2);
        assert_eq!(
            sink.calls(),
            vec![Call::Key(Key::Named(NamedKey::Enter), true)]
        );
    }

    #[test]
    fn mouse_events_can_be_skipped_during_playback() {
        let events = vec![
            mouse_move(0.0, 0.0, 0.0),
            click(Button::Left, true, 0.01),
            key_press(Key::Char('a'), 0.02),
        ];
        let player = Player::new();
        let sink = Arc::new(MockSink::default());
        let opts = PlaybackOptions {
            play_mouse: false,
            ..Default::default()
        };
        player.play(events, opts, sink.clone()).unwrap();
        let stats = player.wait().unwrap();

        assert_eq!(sink.calls(), vec![Call::Key(Key::Char('a'), true)]);
        assert_eq!(stats.moves, 0);
        assert_eq!(stats.clicks, 0);
        assert_eq!(stats.keys, 1);
    }
}
