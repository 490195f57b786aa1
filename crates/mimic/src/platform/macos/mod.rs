//! macOS hook and synthesis providers via CGEventTap / CGEventPost.

mod keymap;

use crate::capture::{HookOptions, InputHook, RawInput};
use crate::error::{HookError, SinkError};
use crate::events::{Button, Key};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, warn};

use cidre::cg::event::access as cg_access;
use cidre::{cf, cg};

// Raw FFI for CGEventPost (not exposed by cidre)
#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventPost(tap: u32, event: *const std::ffi::c_void);
}

const HID_EVENT_TAP: u32 = 0;

fn post_event(event: &cg::Event) {
    unsafe {
        CGEventPost(HID_EVENT_TAP, event as *const _ as *const std::ffi::c_void);
    }
}

/// Permission status for capture and synthesis.
#[derive(Debug, Clone)]
pub struct PermissionStatus {
    pub accessibility: bool,
    pub input_monitoring: bool,
}

impl PermissionStatus {
    pub fn all_granted(&self) -> bool {
        self.accessibility && self.input_monitoring
    }
}

pub fn check_permissions() -> PermissionStatus {
    PermissionStatus {
        accessibility: cidre::ax::is_process_trusted(),
        input_monitoring: cg_access::listen_preflight(),
    }
}

pub fn request_permissions() -> PermissionStatus {
    PermissionStatus {
        accessibility: cidre::ax::is_process_trusted_with_prompt(true),
        input_monitoring: cg_access::listen_request(),
    }
}

// ── Capture ─────────────────────────────────────────────────────────────

/// Input hook backed by a session event tap on its own run-loop thread.
#[derive(Debug, Default)]
pub struct EventTapHook;

impl EventTapHook {
    pub fn new() -> Self {
        Self
    }
}

impl InputHook for EventTapHook {
    fn subscribe(
        &self,
        opts: HookOptions,
        tx: Sender<RawInput>,
        stop: Arc<AtomicBool>,
    ) -> Result<(), HookError> {
        if !cg_access::listen_preflight() {
            return Err(HookError::PermissionDenied(
                "Input Monitoring not granted. Enable in System Settings > \
                 Privacy & Security > Input Monitoring"
                    .to_string(),
            ));
        }
        thread::spawn(move || run_event_tap(opts, tx, stop));
        Ok(())
    }
}

struct TapState {
    tx: Sender<RawInput>,
}

fn run_event_tap(opts: HookOptions, tx: Sender<RawInput>, stop: Arc<AtomicBool>) {
    let key_mask = cg::EventType::KEY_DOWN.mask()
        | cg::EventType::KEY_UP.mask()
        | cg::EventType::FLAGS_CHANGED.mask();

    // Only keyboard hooks when mouse capture is off.
    let mask = if opts.mouse {
        key_mask
            | cg::EventType::MOUSE_MOVED.mask()
            | cg::EventType::LEFT_MOUSE_DRAGGED.mask()
            | cg::EventType::RIGHT_MOUSE_DRAGGED.mask()
            | cg::EventType::LEFT_MOUSE_DOWN.mask()
            | cg::EventType::LEFT_MOUSE_UP.mask()
            | cg::EventType::RIGHT_MOUSE_DOWN.mask()
            | cg::EventType::RIGHT_MOUSE_UP.mask()
            | cg::EventType::OHTER_MOUSE_DOWN.mask()
            | cg::EventType::OHTER_MOUSE_UP.mask()
            | cg::EventType::SCROLL_WHEEL.mask()
    } else {
        key_mask
    };

    // The tap callback needs a stable pointer for the life of the run loop.
    let state = Box::leak(Box::new(TapState { tx }));

    let tap = cg::EventTap::new(
        cg::EventTapLocation::Session,
        cg::EventTapPlacement::TailAppend,
        cg::EventTapOpts::LISTEN_ONLY,
        mask,
        tap_callback,
        state as *mut TapState,
    );

    let Some(tap) = tap else {
        error!("failed to create event tap");
        return;
    };

    let Some(src) = cf::MachPort::run_loop_src(&tap, 0) else {
        error!("failed to create run loop source");
        return;
    };

    let rl = cf::RunLoop::current();
    rl.add_src(&src, cf::RunLoopMode::default());

    while !stop.load(Ordering::Relaxed) {
        cf::RunLoop::run_in_mode(cf::RunLoopMode::default(), 0.05, true);
    }

    rl.remove_src(&src, cf::RunLoopMode::default());
}

extern "C" fn tap_callback(
    _proxy: *mut cg::EventTapProxy,
    event_type: cg::EventType,
    event: &mut cg::Event,
    user_info: *mut TapState,
) -> Option<&cg::Event> {
    let state = unsafe { &*user_info };
    let loc = event.location();
    let flags = event.flags().0;

    let raw = match event_type {
        cg::EventType::MOUSE_MOVED
        | cg::EventType::LEFT_MOUSE_DRAGGED
        | cg::EventType::RIGHT_MOUSE_DRAGGED => Some(RawInput::MouseMove { x: loc.x, y: loc.y }),

        cg::EventType::LEFT_MOUSE_DOWN | cg::EventType::LEFT_MOUSE_UP => {
            Some(RawInput::MouseButton {
                x: loc.x,
                y: loc.y,
                button: Button::Left,
                pressed: event_type == cg::EventType::LEFT_MOUSE_DOWN,
            })
        }

        cg::EventType::RIGHT_MOUSE_DOWN | cg::EventType::RIGHT_MOUSE_UP => {
            Some(RawInput::MouseButton {
                x: loc.x,
                y: loc.y,
                button: Button::Right,
                pressed: event_type == cg::EventType::RIGHT_MOUSE_DOWN,
            })
        }

        cg::EventType::OHTER_MOUSE_DOWN | cg::EventType::OHTER_MOUSE_UP => {
            Some(RawInput::MouseButton {
                x: loc.x,
                y: loc.y,
                button: Button::Middle,
                pressed: event_type == cg::EventType::OHTER_MOUSE_DOWN,
            })
        }

        cg::EventType::SCROLL_WHEEL => {
            let dy = event.field_i64(cg::EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS1) as i32;
            let dx = event.field_i64(cg::EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS2) as i32;
            if dx != 0 || dy != 0 {
                Some(RawInput::MouseScroll {
                    x: loc.x,
                    y: loc.y,
                    dx,
                    dy,
                })
            } else {
                None
            }
        }

        cg::EventType::KEY_DOWN | cg::EventType::KEY_UP => {
            let keycode = event.field_i64(cg::EventField::KEYBOARD_EVENT_KEYCODE) as u16;
            let shift = flags & (keymap::FLAG_SHIFT | keymap::FLAG_CAPS) != 0;
            Some(RawInput::Key {
                key: keymap::key_from_keycode(keycode, shift),
                pressed: event_type == cg::EventType::KEY_DOWN,
            })
        }

        // Modifier keys arrive as flag changes, not key down/up.
        cg::EventType::FLAGS_CHANGED => {
            let keycode = event.field_i64(cg::EventField::KEYBOARD_EVENT_KEYCODE) as u16;
            keymap::modifier_from_keycode(keycode).map(|(named, bit)| RawInput::Key {
                key: Key::Named(named),
                pressed: flags & bit != 0,
            })
        }

        _ => None,
    };

    if let Some(raw) = raw {
        let _ = state.tx.try_send(raw);
    }

    Some(event)
}

// ── Synthesis ───────────────────────────────────────────────────────────

/// Input sink posting HID-level events.
#[derive(Debug, Default)]
pub struct EventPoster;

impl EventPoster {
    pub fn new() -> Self {
        Self
    }

    fn post_mouse(
        &self,
        event_type: cg::EventType,
        x: f64,
        y: f64,
        btn: cg::MouseButton,
    ) -> Result<(), SinkError> {
        let pos = cg::Point { x, y };
        match cg::Event::mouse(None, event_type, pos, btn) {
            Some(evt) => {
                post_event(&evt);
                Ok(())
            }
            None => Err(SinkError::Platform("failed to create mouse event".into())),
        }
    }
}

impl crate::playback::InputSink for EventPoster {
    fn move_to(&self, x: f64, y: f64) -> Result<(), SinkError> {
        self.post_mouse(cg::EventType::MOUSE_MOVED, x, y, cg::MouseButton::Left)
    }

    fn button(&self, x: f64, y: f64, button: &Button, pressed: bool) -> Result<(), SinkError> {
        let (down_type, up_type, btn) = match button {
            Button::Left => (
                cg::EventType::LEFT_MOUSE_DOWN,
                cg::EventType::LEFT_MOUSE_UP,
                cg::MouseButton::Left,
            ),
            Button::Right => (
                cg::EventType::RIGHT_MOUSE_DOWN,
                cg::EventType::RIGHT_MOUSE_UP,
                cg::MouseButton::Right,
            ),
            Button::Middle => (
                cg::EventType::OHTER_MOUSE_DOWN,
                cg::EventType::OHTER_MOUSE_UP,
                cg::MouseButton::Center,
            ),
            Button::Other(name) => return Err(SinkError::UnknownButton(name.clone())),
        };
        let event_type = if pressed { down_type } else { up_type };
        self.post_mouse(event_type, x, y, btn)
    }

    fn scroll(&self, x: f64, y: f64, dx: i32, dy: i32) -> Result<(), SinkError> {
        // Scroll lands wherever the pointer is; move there first.
        self.move_to(x, y)?;
        // The wheel parameters are reinterpreted as signed int32 by the OS;
        // wrapping casts keep the sign bit, so direction survives.
        match cg::Event::wheel_2(None, cg::ScrollEventUnit::Line, dy as u32, dx as u32) {
            Some(evt) => {
                post_event(&evt);
                Ok(())
            }
            None => {
                warn!(dx, dy, "failed to create scroll event");
                Err(SinkError::Platform("failed to create scroll event".into()))
            }
        }
    }

    fn key(&self, key: &Key, pressed: bool) -> Result<(), SinkError> {
        let (keycode, shift) =
            keymap::keycode_for_key(key).ok_or_else(|| SinkError::UnknownKey(key.repr()))?;
        match cg::Event::keyboard(None, keycode, pressed) {
            Some(mut evt) => {
                if shift {
                    evt.set_flags(cg::EventFlags(keymap::FLAG_SHIFT));
                }
                post_event(&evt);
                Ok(())
            }
            None => Err(SinkError::Platform("failed to create key event".into())),
        }
    }
}
