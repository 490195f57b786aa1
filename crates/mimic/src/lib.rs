//! mimic - record and replay mouse & keyboard input
//!
//! Capture OS input events with elapsed-time stamps, replay them later with
//! adjustable speed and looping, and persist them as a flat JSON array.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mimic::prelude::*;
//!
//! let session = Session::new();
//!
//! // Record until told otherwise
//! let hook = mimic::platform::default_hook()?;
//! session.start_capture(hook.as_ref())?;
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! let count = session.stop_capture()?;
//! println!("{count} events captured");
//!
//! // Replay at double speed
//! let sink = mimic::platform::default_sink()?;
//! session.play(sink, false, 2.0)?;
//! session.wait_playback();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Platform support
//!
//! - **macOS**: capture via CGEventTap, synthesis via CGEventPost
//! - Other platforms: bring your own [`InputHook`]/[`InputSink`]

pub mod capture;
pub mod error;
pub mod events;
pub mod platform;
pub mod playback;
pub mod session;
pub mod storage;
pub mod store;

pub use capture::{HookOptions, InputHook, RawInput, Recorder, RecordingHandle};
pub use error::{HookError, PlaybackError, SessionError, SinkError, StorageError};
pub use events::{Button, Event, EventKind, Key, KeyAction, MouseAction, NamedKey};
pub use playback::{InputSink, PlaybackOptions, PlaybackState, Player, ReplayStats};
pub use session::Session;
pub use store::EventStore;

pub mod prelude {
    pub use crate::capture::{HookOptions, InputHook, Recorder, RecordingHandle};
    pub use crate::events::{Button, Event, EventKind, Key, KeyAction, MouseAction, NamedKey};
    pub use crate::playback::{InputSink, PlaybackOptions, PlaybackState, Player, ReplayStats};
    pub use crate::session::Session;
    pub use crate::store::EventStore;
}
