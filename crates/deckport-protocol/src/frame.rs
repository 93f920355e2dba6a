//! Fixed-size status frame

use crate::{FRAME_LEN, PAYLOAD_LEN, ProtocolError, ProtocolResult, TRAILER_LEN};

/// One status snapshot exchanged with the device.
///
/// The last [`TRAILER_LEN`] bytes carry the CRC-16/X-25 checksum of the
/// preceding payload; see [`crate::checksum`] for the trailer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub const fn zeroed() -> Self {
        Self([0; FRAME_LEN])
    }

    pub const fn from_array(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a frame from a byte slice, which must be exactly [`FRAME_LEN`]
    /// bytes long.
    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        let array: [u8; FRAME_LEN] =
            bytes
                .try_into()
                .map_err(|_| ProtocolError::InvalidFrameSize {
                    expected: FRAME_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8; FRAME_LEN] {
        &mut self.0
    }

    /// The checksummed region of the frame.
    pub fn payload(&self) -> &[u8] {
        &self.0[..PAYLOAD_LEN]
    }

    /// The two checksum bytes at the end of the frame.
    pub fn trailer(&self) -> [u8; TRAILER_LEN] {
        [self.0[PAYLOAD_LEN], self.0[PAYLOAD_LEN + 1]]
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
