//! Session read cycle
//!
//! A session owns the transport plus the two frame snapshots the diff
//! engine works on. One call to [`Session::read_cycle`] performs one full
//! cycle: read a frame, diff it against the previous one, advance the
//! previous snapshot, then validate the checksum. Decoding runs before
//! validation; a mismatch is surfaced in the outcome and already-emitted
//! events are never retracted.

use crate::{ChannelResult, FrameTransport, RepeatLimiter, ShutdownFlag};
use deckport_protocol::{
    ControlMap, EventSink, Frame, InputEvent, diff_frames, frame_checksum, stored_checksum,
    validate,
};
use std::time::Duration;
use tracing::{debug, warn};

/// What one read cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A timer-paced wait expired; nothing was read and no state changed.
    TimedOut,
    /// The first frame of the session seeded the previous-frame snapshot.
    /// No diff runs against it and nothing is emitted, whatever the
    /// hardware's resting bit pattern looks like.
    Baseline,
    /// A frame was diffed against the previous snapshot.
    Decoded {
        /// Events delivered to the sink this pass (after repeat limiting).
        events: usize,
        /// Outcome of the trailer check. Events above were emitted before
        /// validation and stand either way; callers that never want to act
        /// on corrupt frames gate on this field.
        checksum_ok: bool,
    },
}

pub struct Session<T: FrameTransport> {
    transport: T,
    current: Frame,
    previous: Frame,
    baseline_established: bool,
    map: Option<ControlMap>,
    sink: Option<Box<dyn EventSink>>,
    limiter: RepeatLimiter,
}

impl<T: FrameTransport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            current: Frame::zeroed(),
            previous: Frame::zeroed(),
            baseline_established: false,
            map: None,
            sink: None,
            limiter: RepeatLimiter::default(),
        }
    }

    /// Register the control map and the sink that receives decoded events.
    /// Without a registered map, read cycles still maintain the frame
    /// snapshots and checksum reporting but emit nothing.
    pub fn register_map(&mut self, map: ControlMap, sink: impl EventSink + 'static) {
        self.map = Some(map);
        self.sink = Some(Box::new(sink));
    }

    pub fn map(&self) -> Option<&ControlMap> {
        self.map.as_ref()
    }

    /// Minimum spacing between repeat emissions, shared across all controls.
    pub fn set_repeat_interval(&mut self, interval: Duration) {
        self.limiter = RepeatLimiter::new(interval);
    }

    /// Access to the transport for timer control and introspection.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Checksum and send one payload to the device.
    ///
    /// # Errors
    ///
    /// See [`FrameTransport::write_payload`].
    pub fn write(&mut self, payload: &[u8]) -> ChannelResult<()> {
        self.transport.write_payload(payload)
    }

    /// Run one read cycle.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; these are fatal to the underlying
    /// channel. Checksum mismatches are not errors; see
    /// [`CycleOutcome::Decoded`].
    pub fn read_cycle(&mut self) -> ChannelResult<CycleOutcome> {
        let Some(frame) = self.transport.read_frame()? else {
            return Ok(CycleOutcome::TimedOut);
        };
        self.current = frame;

        if !self.baseline_established {
            self.previous = self.current;
            self.baseline_established = true;
            debug!("baseline frame established");
            return Ok(CycleOutcome::Baseline);
        }

        let mut events = 0;
        if let (Some(map), Some(sink)) = (&self.map, &mut self.sink) {
            let mut limited = LimitedSink {
                inner: sink.as_mut(),
                limiter: &mut self.limiter,
                emitted: &mut events,
            };
            diff_frames(map, &self.current, &self.previous, &mut limited);
        }

        self.previous = self.current;

        let checksum_ok = validate(&self.current);
        if !checksum_ok {
            warn!(
                computed = frame_checksum(&self.current),
                stored = stored_checksum(&self.current),
                "frame checksum mismatch"
            );
        }

        Ok(CycleOutcome::Decoded {
            events,
            checksum_ok,
        })
    }

    /// Read until `shutdown` is set or the transport fails.
    ///
    /// The flag is checked between cycles only; a cycle blocked in the
    /// kernel finishes first.
    ///
    /// # Errors
    ///
    /// Propagates the first transport error.
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> ChannelResult<()> {
        while !shutdown.is_set() {
            self.read_cycle()?;
        }
        Ok(())
    }
}

impl Session<crate::DeckChannel> {
    /// Open the control surface at `path` and wrap it in a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChannelError::Open`] when the device node cannot be
    /// opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> ChannelResult<Self> {
        Ok(Self::new(crate::DeckChannel::open(path)?))
    }

    /// Open the control surface at [`crate::DEFAULT_DEVICE_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChannelError::Open`] when the device node cannot be
    /// opened.
    pub fn open_default() -> ChannelResult<Self> {
        Ok(Self::new(crate::DeckChannel::open_default()?))
    }
}

/// Applies the shared repeat limiter in front of the registered sink and
/// counts what actually got through.
struct LimitedSink<'a> {
    inner: &'a mut dyn EventSink,
    limiter: &'a mut RepeatLimiter,
    emitted: &'a mut usize,
}

impl EventSink for LimitedSink<'_> {
    fn emit(&mut self, event: InputEvent) {
        if !self.limiter.allow(event.action) {
            return;
        }
        *self.emitted += 1;
        self.inner.emit(event);
    }
}
