//! Platform input providers.
//!
//! macOS is backed by CGEventTap (capture) and CGEventPost (synthesis).
//! Other platforms get an error from the default constructors; the rest of
//! the crate works against the [`InputHook`]/[`InputSink`] traits and does
//! not care.

#[cfg(target_os = "macos")]
pub mod macos;

use crate::capture::InputHook;
use crate::error::{HookError, SinkError};
use crate::playback::InputSink;
use std::sync::Arc;

#[cfg(target_os = "macos")]
pub fn default_hook() -> Result<Box<dyn InputHook>, HookError> {
    Ok(Box::new(macos::EventTapHook::new()))
}

#[cfg(target_os = "macos")]
pub fn default_sink() -> Result<Arc<dyn InputSink>, SinkError> {
    Ok(Arc::new(macos::EventPoster::new()))
}

#[cfg(not(target_os = "macos"))]
pub fn default_hook() -> Result<Box<dyn InputHook>, HookError> {
    Err(HookError::Unsupported(std::env::consts::OS))
}

#[cfg(not(target_os = "macos"))]
pub fn default_sink() -> Result<Arc<dyn InputSink>, SinkError> {
    Err(SinkError::Unsupported(std::env::consts::OS))
}
