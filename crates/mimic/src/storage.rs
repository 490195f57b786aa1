//! Persistence adapter - a recording is a flat JSON array of events.

use crate::error::StorageError;
use crate::events::Event;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Serialize `events` to `path` as a pretty-printed JSON array, creating
/// parent directories as needed.
pub fn save(path: impl AsRef<Path>, events: &[Event]) -> Result<(), StorageError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, events)?;
    w.flush()?;
    info!(events = events.len(), path = %path.display(), "saved recording");
    Ok(())
}

/// Deserialize a JSON array of events. The whole file is parsed before
/// anything is returned, so a failed load leaves the caller's state
/// untouched. No validation beyond JSON shape; non-monotonic or otherwise
/// odd files load as-is.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Event>, StorageError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let events: Vec<Event> = serde_json::from_reader(BufReader::new(file))?;
    info!(events = events.len(), path = %path.display(), "loaded recording");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Button, EventKind, Key, KeyAction, MouseAction, NamedKey};
    use std::fs;

    fn sample() -> Vec<Event> {
        vec![
            Event::new(EventKind::Mouse(MouseAction::Move { x: 10.0, y: 10.0 }), 0.0),
            Event::new(
                EventKind::Mouse(MouseAction::Click {
                    x: 10.0,
                    y: 10.0,
                    button: Button::Left,
                    pressed: true,
                }),
                0.5,
            ),
            Event::new(
                EventKind::Mouse(MouseAction::Scroll {
                    x: 10.0,
                    y: 10.0,
                    dx: 0,
                    dy: -3,
                }),
                0.8,
            ),
            Event::new(
                EventKind::Key(KeyAction::Press {
                    key: Key::Named(NamedKey::Shift),
                }),
                1.0,
            ),
            Event::new(
                EventKind::Key(KeyAction::Release {
                    key: Key::Char('a'),
                }),
                1.5,
            ),
        ]
    }

    #[test]
    fn round_trip_preserves_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let events = sample();
        save(&path, &events).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, events);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("events.json");
        save(&path, &sample()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        save(&path, &sample()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 5);
        assert_eq!(value[0]["type"], "mouse");
        assert_eq!(value[3]["key"], "Key.shift");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[{\"type\": ").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, StorageError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load("/nonexistent/mimic/events.json").unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn non_monotonic_file_loads_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            r#"[
                {"type":"key","subtype":"press","key":"a","time":5.0},
                {"type":"key","subtype":"release","key":"a","time":1.0}
            ]"#,
        )
        .unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].time, 5.0);
        assert_eq!(loaded[1].time, 1.0);
    }
}
