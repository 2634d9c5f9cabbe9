/// Frame codec for the ANT serial message format shared by every message
/// sent to or received from the USB stick:
///
/// | Offset | Field |
/// |---|---|
/// | 0 | sync (0xA4) |
/// | 1 | payload length |
/// | 2 | message id |
/// | 3.. | payload |
/// | 3 + length | XOR of every preceding byte |
use crate::error::{AntError, DecodeError};
use crate::Result;

pub const MESG_TX_SYNC: u8 = 0xA4;
pub const MESG_SYNC_SIZE: usize = 1;
pub const MESG_SIZE_SIZE: usize = 1;
pub const MESG_ID_SIZE: usize = 1;
pub const MESG_CHECKSUM_SIZE: usize = 1;
pub const MESG_HEADER_SIZE: usize = MESG_SYNC_SIZE + MESG_SIZE_SIZE + MESG_ID_SIZE;
pub const MESG_FRAME_SIZE: usize = MESG_HEADER_SIZE + MESG_CHECKSUM_SIZE;
pub const MESG_MAX_DATA_SIZE: usize = u8::MAX as usize;
pub const MESG_SIZE_OFFSET: usize = MESG_SYNC_SIZE;
pub const MESG_ID_OFFSET: usize = MESG_SYNC_SIZE + MESG_SIZE_SIZE;
pub const MESG_DATA_OFFSET: usize = MESG_HEADER_SIZE;

/// A single validated frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub sync: u8,
    pub length: u8,
    pub message_id: u8,
    pub payload: Vec<u8>,
    pub checksum: u8,
}

impl Frame {
    /// Number of bytes this frame occupies on the wire.
    pub fn wire_len(&self) -> usize {
        MESG_FRAME_SIZE + self.payload.len()
    }
}

/// XOR fold over a byte slice.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Serialize a message id and payload into a complete frame.
pub fn encode(message_id: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MESG_MAX_DATA_SIZE {
        return Err(AntError::PayloadTooLarge(payload.len()));
    }
    let total_size = MESG_HEADER_SIZE + payload.len();
    let mut buf = Vec::with_capacity(total_size + MESG_CHECKSUM_SIZE);
    buf.push(MESG_TX_SYNC);
    buf.push(payload.len() as u8);
    buf.push(message_id);
    buf.extend_from_slice(payload);
    buf.push(checksum(&buf));
    Ok(buf)
}

/// Parse the frame at the start of `bytes`. Anything after the frame's
/// checksum byte is left untouched for the caller.
pub fn decode(bytes: &[u8]) -> std::result::Result<Frame, DecodeError> {
    if bytes.len() < MESG_FRAME_SIZE {
        return Err(DecodeError::TooShort {
            needed: MESG_FRAME_SIZE,
            available: bytes.len(),
        });
    }
    if bytes[0] != MESG_TX_SYNC {
        return Err(DecodeError::BadSync(bytes[0]));
    }
    let length = bytes[MESG_SIZE_OFFSET];
    let end = MESG_HEADER_SIZE + length as usize;
    if bytes.len() < end + MESG_CHECKSUM_SIZE {
        return Err(DecodeError::TooShort {
            needed: end + MESG_CHECKSUM_SIZE,
            available: bytes.len(),
        });
    }
    let expected = checksum(&bytes[..end]);
    if expected != bytes[end] {
        return Err(DecodeError::ChecksumMismatch {
            expected,
            actual: bytes[end],
        });
    }
    Ok(Frame {
        sync: bytes[0],
        length,
        message_id: bytes[MESG_ID_OFFSET],
        payload: bytes[MESG_DATA_OFFSET..end].to_vec(),
        checksum: bytes[end],
    })
}

/// ReadBuffer walks the bytes returned by one bulk read and yields every
/// valid frame in it. Bytes that do not start a valid frame are skipped one
/// at a time until the next sync byte.
pub struct ReadBuffer<'a> {
    index: usize,
    inner: &'a [u8],
}

impl<'a> ReadBuffer<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        ReadBuffer {
            index: 0,
            inner: buffer,
        }
    }
}

impl<'a> Iterator for ReadBuffer<'a> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.inner.len() {
            if self.inner[self.index] == MESG_TX_SYNC {
                match decode(&self.inner[self.index..]) {
                    Ok(frame) => {
                        self.index += frame.wire_len();
                        return Some(frame);
                    }
                    Err(e) => log::trace!("Dropping candidate at {}: {}", self.index, e),
                }
            }
            self.index += 1;
        }
        None
    }
}
