/// Heart rate broadcast data. Every heart rate data page carries the last
/// beat event time, the beat count and the computed heart rate in its final
/// four bytes, so those fields are decoded regardless of the page.
use crate::frame::Frame;
use crate::message::{EXT_MESG_FLAG, MESG_BROADCAST_DATA_ID};
use std::fmt;

// Offsets into the broadcast payload. Byte 0 is the channel number, bytes
// 1..=8 are the eight byte data page.
const CHANNEL_OFFSET: usize = 0;
const DATA_PAGE_OFFSET: usize = 1;
const EVENT_TIME_LSB_OFFSET: usize = 7;
const EVENT_TIME_MSB_OFFSET: usize = 8;
const BEAT_COUNT_OFFSET: usize = 9;
const HEART_RATE_OFFSET: usize = 10;
const EXT_FLAG_OFFSET: usize = 11;

/// Shortest broadcast payload that carries every heart rate field.
pub const MIN_BROADCAST_PAYLOAD: usize = HEART_RATE_OFFSET + 1;

// The most significant bit of the page number toggles every four messages.
const PAGE_TOGGLE_MASK: u8 = 0x7F;

/// Extended data appended by the stick after the standard payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Extension {
    pub flag: u8,
    /// Bytes following the flag byte, kept as received.
    pub data: Vec<u8>,
}

/// One decoded heart rate broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadcastReading {
    pub channel: u8,
    pub data_page: u8,
    /// Beats per minute, 0 when the strap has no valid reading.
    pub heart_rate: u8,
    /// Beat counter, wraps at 256.
    pub beat_count: u8,
    /// Time of the last beat in 1/1024 s, wraps at 65536.
    pub event_time: u16,
    pub extension: Option<Extension>,
}

impl fmt::Display for BroadcastReading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HR: {}\tBeatCount: {}\teventTime: {}",
            self.heart_rate, self.beat_count, self.event_time
        )?;
        if let Some(ext) = &self.extension {
            write!(f, "\tflag {:2x}", ext.flag)?;
        }
        Ok(())
    }
}

/// Decode a broadcast data frame. Any other message, or a broadcast too
/// short to hold the heart rate fields, yields `None`.
pub fn decode_broadcast(frame: &Frame) -> Option<BroadcastReading> {
    if frame.message_id != MESG_BROADCAST_DATA_ID {
        return None;
    }
    let payload = &frame.payload;
    if payload.len() < MIN_BROADCAST_PAYLOAD {
        return None;
    }
    let extension = match payload.get(EXT_FLAG_OFFSET) {
        Some(&flag) if flag == EXT_MESG_FLAG => Some(Extension {
            flag,
            data: payload[EXT_FLAG_OFFSET + 1..].to_vec(),
        }),
        _ => None,
    };
    Some(BroadcastReading {
        channel: payload[CHANNEL_OFFSET],
        data_page: payload[DATA_PAGE_OFFSET] & PAGE_TOGGLE_MASK,
        heart_rate: payload[HEART_RATE_OFFSET],
        beat_count: payload[BEAT_COUNT_OFFSET],
        event_time: u16::from_le_bytes([
            payload[EVENT_TIME_LSB_OFFSET],
            payload[EVENT_TIME_MSB_OFFSET],
        ]),
        extension,
    })
}
