//! Character-device channel
//!
//! Owns the device handle and moves whole frames across it. Reads are
//! either on-demand (one blocking read per call) or paced by the device's
//! frame timer, in which case each read first waits for readability and a
//! timeout yields no frame. A short read or failed write closes the handle;
//! the channel never retries.

use crate::{ChannelError, ChannelResult, FrameTransport, ioctl};
use deckport_protocol::{FRAME_LEN, Frame, frame_for_payload};
use std::fs::OpenOptions;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Device node the control surface registers under.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/subucom_spi2.0";

/// Bounded wait for readability in timer-paced mode.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(5000);

/// How the channel obtains frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Each read issues one blocking full-frame read; writes are allowed.
    Regular,
    /// The device timer produces frames; reads are poll-gated and writes
    /// are rejected because outbound data would race the hardware timer.
    Polled,
}

pub struct DeckChannel {
    device: Option<std::fs::File>,
    path: String,
    mode: ReadMode,
    poll_timeout: Duration,
}

impl DeckChannel {
    /// Open the control surface at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Open`] when the device node cannot be opened
    /// read-write.
    pub fn open(path: impl AsRef<Path>) -> ChannelResult<Self> {
        let path = path.as_ref();
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ChannelError::Open {
                path: path.display().to_string(),
                source,
            })?;

        info!(path = %path.display(), "opened deck control device");

        Ok(Self {
            device: Some(device),
            path: path.display().to_string(),
            mode: ReadMode::Regular,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        })
    }

    /// Open the control surface at [`DEFAULT_DEVICE_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Open`] when the device node cannot be opened.
    pub fn open_default() -> ChannelResult<Self> {
        Self::open(DEFAULT_DEVICE_PATH)
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.device.is_none()
    }

    pub fn set_poll_timeout(&mut self, timeout: Duration) {
        self.poll_timeout = timeout;
    }

    fn fd(&self) -> ChannelResult<RawFd> {
        self.device
            .as_ref()
            .map(AsRawFd::as_raw_fd)
            .ok_or(ChannelError::Closed)
    }

    /// Drop the handle and surface `error`. Called on every fatal I/O
    /// outcome; the caller must reopen to continue.
    fn fail<T>(&mut self, err: ChannelError) -> ChannelResult<T> {
        error!(path = %self.path, %err, "fatal channel error, closing handle");
        self.device = None;
        Err(err)
    }

    fn read_full_frame(&mut self) -> ChannelResult<Frame> {
        let fd = self.fd()?;
        let mut frame = Frame::zeroed();
        let count = unsafe {
            libc::read(
                fd,
                frame.as_mut_bytes().as_mut_ptr().cast::<libc::c_void>(),
                FRAME_LEN,
            )
        };

        if count < 0 {
            let source = std::io::Error::last_os_error();
            return self.fail(ChannelError::Io(source));
        }
        let count = count as usize;
        if count != FRAME_LEN {
            return self.fail(ChannelError::ShortRead {
                expected: FRAME_LEN,
                actual: count,
            });
        }

        Ok(frame)
    }

    /// Wait for readability; `Ok(false)` means the wait timed out.
    fn wait_readable(&mut self) -> ChannelResult<bool> {
        let fd = self.fd()?;
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = self.poll_timeout.as_millis().min(i32::MAX as u128) as i32;

        let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if rc < 0 {
            let source = std::io::Error::last_os_error();
            return self.fail(ChannelError::Io(source));
        }
        Ok(rc > 0 && (pollfd.revents & libc::POLLIN) != 0)
    }
}

impl FrameTransport for DeckChannel {
    fn read_frame(&mut self) -> ChannelResult<Option<Frame>> {
        match self.mode {
            ReadMode::Regular => Ok(Some(self.read_full_frame()?)),
            ReadMode::Polled => {
                if !self.wait_readable()? {
                    debug!(timeout_ms = self.poll_timeout.as_millis() as u64, "timer-paced wait expired");
                    return Ok(None);
                }
                Ok(Some(self.read_full_frame()?))
            }
        }
    }

    fn write_payload(&mut self, payload: &[u8]) -> ChannelResult<()> {
        if self.mode == ReadMode::Polled {
            warn!("write rejected while the device timer paces reads");
            return Err(ChannelError::WriteWhilePolled);
        }

        let frame = frame_for_payload(payload)?;

        let fd = self.fd()?;
        let count = unsafe {
            libc::write(
                fd,
                frame.as_bytes().as_ptr().cast::<libc::c_void>(),
                FRAME_LEN,
            )
        };

        if count < 0 {
            let source = std::io::Error::last_os_error();
            return self.fail(ChannelError::Io(source));
        }
        let count = count as usize;
        if count != FRAME_LEN {
            return self.fail(ChannelError::ShortWrite {
                expected: FRAME_LEN,
                actual: count,
            });
        }

        Ok(())
    }

    fn start_timer(&mut self, tick_ms: u32) -> ChannelResult<()> {
        if self.timer_running()? {
            self.stop_timer()?;
        }

        ioctl::write_timer_interval(self.fd()?, tick_ms)?;
        ioctl::write_timer_status(self.fd()?, true)?;
        self.mode = ReadMode::Polled;
        debug!(tick_ms, "device frame timer started");
        Ok(())
    }

    fn stop_timer(&mut self) -> ChannelResult<()> {
        ioctl::write_timer_status(self.fd()?, false)?;
        self.mode = ReadMode::Regular;
        debug!("device frame timer stopped");
        Ok(())
    }

    fn timer_running(&mut self) -> ChannelResult<bool> {
        Ok(ioctl::read_timer_status(self.fd()?)?)
    }

    fn timer_interval(&mut self) -> ChannelResult<u32> {
        Ok(ioctl::read_timer_interval(self.fd()?)?)
    }
}
