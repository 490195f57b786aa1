//! Session object tying capture, playback, and persistence to one store.
//!
//! The control surface (CLI, GUI, whatever) issues commands here and never
//! touches the store directly. The session also makes the shared-resource
//! policy explicit: the store is mutated by capture while recording and by
//! load while nothing else runs, so commands that would overlap are
//! rejected with [`SessionError::Busy`] instead of racing.

use crate::capture::{HookOptions, InputHook, Recorder, RecordingHandle};
use crate::error::SessionError;
use crate::playback::{InputSink, PlaybackOptions, PlaybackState, Player, ReplayStats};
use crate::store::EventStore;
use crate::{storage, StorageError};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Session {
    store: EventStore,
    player: Player,
    recording: Mutex<Option<RecordingHandle>>,
    /// The "capture mouse input" toggle; honored by both capture and
    /// playback, as the original control panel did.
    capture_mouse: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            store: EventStore::new(),
            player: Player::new(),
            recording: Mutex::new(None),
            capture_mouse: AtomicBool::new(true),
        }
    }

    pub fn set_capture_mouse(&self, enabled: bool) {
        self.capture_mouse.store(enabled, Ordering::Relaxed);
    }

    pub fn capture_mouse(&self) -> bool {
        self.capture_mouse.load(Ordering::Relaxed)
    }

    pub fn event_count(&self) -> usize {
        self.store.len()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.lock().is_some()
    }

    // ── Capture ─────────────────────────────────────────────────────────

    pub fn start_capture(&self, hook: &dyn InputHook) -> Result<(), SessionError> {
        let mut recording = self.recording.lock();
        if recording.is_some() {
            return Err(SessionError::Busy("start recording"));
        }
        if self.player.is_active() {
            return Err(SessionError::Busy("record"));
        }
        let recorder = Recorder::new(HookOptions {
            mouse: self.capture_mouse(),
        });
        *recording = Some(recorder.start(hook, &self.store)?);
        Ok(())
    }

    /// Stop recording and return the final event count.
    pub fn stop_capture(&self) -> Result<usize, SessionError> {
        let handle = self
            .recording
            .lock()
            .take()
            .ok_or(SessionError::NotRecording)?;
        Ok(handle.stop())
    }

    // ── Playback ────────────────────────────────────────────────────────

    pub fn play(
        &self,
        sink: Arc<dyn InputSink>,
        loop_forever: bool,
        speed: f64,
    ) -> Result<(), SessionError> {
        // Held until the run has started, so a racing start_capture sees
        // either the recording slot taken or the player already active.
        let recording = self.recording.lock();
        if recording.is_some() {
            return Err(SessionError::Busy("play"));
        }
        let opts = PlaybackOptions {
            speed,
            loop_forever,
            play_mouse: self.capture_mouse(),
        };
        self.player.play(self.store.snapshot(), opts, sink)?;
        Ok(())
    }

    pub fn pause(&self) {
        self.player.pause();
    }

    pub fn resume(&self) {
        self.player.resume();
    }

    pub fn stop_playback(&self) {
        self.player.stop();
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_active()
    }

    /// Block until the current run finishes.
    pub fn wait_playback(&self) -> Option<ReplayStats> {
        self.player.wait()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        storage::save(path, &self.store.snapshot())
    }

    /// Replace the store with the file's contents and return the new event
    /// count. The store is untouched if the load fails.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize, SessionError> {
        if self.is_recording() || self.player.is_active() {
            return Err(SessionError::Busy("load"));
        }
        let events = storage::load(path)?;
        let count = events.len();
        self.store.replace(events);
        Ok(count)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
