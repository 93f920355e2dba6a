//! Frame protocol and state-diff engine for the DeckPort control surface
//!
//! The control surface emits a fixed 64-byte status frame over a character
//! device. This crate contains everything needed to turn a stream of those
//! frames into discrete key-class input events, with no I/O of its own:
//!
//! ## Features
//! - CRC-16/X-25 frame checksum (compute, validate, build)
//! - Declarative control map describing buttons, selectors, encoders, and
//!   the jog wheel as byte/bit bindings inside the frame payload
//! - Stateful frame differ producing press / release / repeat events
//! - `EventSink` boundary trait for downstream event delivery

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod checksum;
pub mod diff;
pub mod event;
pub mod frame;
pub mod map;

pub use checksum::*;
pub use diff::*;
pub use event::*;
pub use frame::*;
pub use map::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("payload too large: {len} bytes exceeds the {max}-byte capacity")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("{control} offset {byte:#04x} is outside the {limit}-byte payload")]
    OffsetOutOfBounds {
        control: &'static str,
        byte: u8,
        limit: usize,
    },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Total frame length on the wire, checksum trailer included.
pub const FRAME_LEN: usize = 64;

/// Length of the checksum trailer at the end of every frame.
pub const TRAILER_LEN: usize = 2;

/// Bytes available to control state and outbound payloads.
pub const PAYLOAD_LEN: usize = FRAME_LEN - TRAILER_LEN;
