//! Linux character-device driver for the DeckPort control surface
//!
//! The device emits one fixed 64-byte status frame per read, either on
//! demand or paced by a device-side timer. This crate owns the device
//! handle and the session state machine around it:
//!
//! ## Features
//! - Blocking full-frame reads and checksummed writes over the char device
//! - Device-side timer control via ioctl (interval, enable, introspection)
//! - Poll-gated reads while the timer paces the device
//! - Session read cycle: baseline seeding, frame diffing, repeat limiting,
//!   decode-then-validate checksum reporting
//! - Cooperative shutdown flag for the caller's read loop
//!
//! The frame protocol itself lives in `deckport-protocol`; everything here
//! is the thin driver around it.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod channel;
pub mod ioctl;
pub mod limiter;
pub mod session;
pub mod shutdown;
pub mod transport;

pub use channel::*;
pub use limiter::*;
pub use session::*;
pub use shutdown::*;
pub use transport::*;

use deckport_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("failed to open device {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("short write: expected {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },

    #[error("channel is closed")]
    Closed,

    #[error("writes are unavailable while the device timer paces reads")]
    WriteWhilePolled,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChannelResult<T> = Result<T, ChannelError>;
