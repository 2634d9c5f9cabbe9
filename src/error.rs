use rusb::Error as USBError;
use thiserror::Error;

use crate::channel::Step;

#[derive(Error, Debug)]
pub enum AntError {
    #[error("{0}")]
    UsbDeviceError(#[from] USBError),
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no ANT+ USB device found (vendor {vendor_id:#06x}, product {product_id:#06x})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },
    /// Payload does not fit the one byte length field of a frame.
    #[error("payload too large ({0} bytes, max 255)")]
    PayloadTooLarge(usize),
    #[error("network key must be 8 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("RF frequency {0} MHz outside 2400-2655 MHz")]
    FrequencyOutOfRange(u16),
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },
    /// A bring-up step could not be written. Nothing is rolled back; a
    /// fresh reset is the only recovery.
    #[error("{step} failed: {source}")]
    Sequence {
        step: Step,
        #[source]
        source: Box<AntError>,
    },
}

/// Reasons a buffer could not be read as a frame. These are expected noise
/// on a shared bulk stream and never leave the receive loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame too short (need {needed} bytes, have {available})")]
    TooShort { needed: usize, available: usize },
    #[error("bad sync byte {0:#04x}")]
    BadSync(u8),
    #[error("checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },
}
