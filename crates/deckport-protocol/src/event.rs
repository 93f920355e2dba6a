//! Decoded input events and the sink boundary

use serde::{Deserialize, Serialize};

/// What happened to a key-class control between two frames.
///
/// Discriminants match the wire values delivered to downstream input
/// subsystems (0 release, 1 press, 2 repeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyAction {
    Release = 0,
    Press = 1,
    Repeat = 2,
}

impl KeyAction {
    pub const fn value(self) -> u8 {
        self as u8
    }
}

/// One decoded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Output code assigned by the control map.
    pub code: u16,
    pub action: KeyAction,
}

impl InputEvent {
    pub const fn new(code: u16, action: KeyAction) -> Self {
        Self { code, action }
    }
}

/// Receiver for decoded events.
///
/// The sink owns any mapping onto an operating-system input layer, including
/// the event-type dimension; this boundary only ever carries key-class
/// events. Events arrive in the differ's fixed processing order.
pub trait EventSink {
    fn emit(&mut self, event: InputEvent);
}

impl<F: FnMut(InputEvent)> EventSink for F {
    fn emit(&mut self, event: InputEvent) {
        self(event);
    }
}
