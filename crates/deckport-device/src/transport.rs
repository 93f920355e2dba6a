//! Transport seam between session logic and the device handle

use crate::ChannelResult;
use deckport_protocol::Frame;

/// Frame-level operations a session needs from the underlying device.
///
/// [`crate::DeckChannel`] is the production implementation; tests drive
/// sessions through scripted implementations instead of hardware.
pub trait FrameTransport {
    /// Read one whole frame.
    ///
    /// Returns `Ok(None)` when a timer-paced wait expired without data;
    /// that is not an error and must not disturb session state.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the transport; the caller must reopen.
    fn read_frame(&mut self) -> ChannelResult<Option<Frame>>;

    /// Checksum and write one payload as a whole frame.
    ///
    /// # Errors
    ///
    /// Rejected without I/O while the device timer paces reads or when the
    /// payload exceeds the checksum reserve; I/O failures are fatal.
    fn write_payload(&mut self, payload: &[u8]) -> ChannelResult<()>;

    /// Program the device timer interval and enable it, switching reads to
    /// timer-paced mode.
    ///
    /// # Errors
    ///
    /// Returns an error when the device rejects the control requests.
    fn start_timer(&mut self, tick_ms: u32) -> ChannelResult<()>;

    /// Disable the device timer, switching back to on-demand reads.
    ///
    /// # Errors
    ///
    /// Returns an error when the device rejects the control request.
    fn stop_timer(&mut self) -> ChannelResult<()>;

    /// # Errors
    ///
    /// Returns an error when the device rejects the control request.
    fn timer_running(&mut self) -> ChannelResult<bool>;

    /// # Errors
    ///
    /// Returns an error when the device rejects the control request.
    fn timer_interval(&mut self) -> ChannelResult<u32>;
}
