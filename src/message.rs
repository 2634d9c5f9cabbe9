/// Message module provides the catalog of control messages sent to the ANT+
/// USB stick along with a way to classify frames received from it.
use crate::broadcast::{decode_broadcast, BroadcastReading};
use crate::error::AntError;
use crate::frame::{self, Frame};
use crate::Result;
use log::debug;
use std::fmt;

pub const MESG_RESPONSE_EVENT_ID: u8 = 0x40;
pub const MESG_ASSIGN_CHANNEL_ID: u8 = 0x42;
pub const MESG_CHANNEL_RADIO_FREQ_ID: u8 = 0x45;
pub const MESG_NETWORK_KEY_ID: u8 = 0x46;
pub const MESG_RESET: u8 = 0x4A;
pub const MESG_BROADCAST_DATA_ID: u8 = 0x4E;
pub const MESG_CHANNEL_ID_ID: u8 = 0x51;
pub const MESG_OPEN_RX_SCAN_ID: u8 = 0x5B;
pub const MESG_RX_EXT_MESGS_ENABLE_ID: u8 = 0x66;
pub const MESG_LIB_CONFIG_ID: u8 = 0x6E;
pub const MESG_STARTUP_MESG_ID: u8 = 0x6F;

pub const CHANNEL_TYPE_ONEWAY_RECEIVE: u8 = 0x40;

pub const LIB_CONFIG_CHANNEL_ID: u8 = 0x80;
pub const LIB_CONFIG_RSSI: u8 = 0x40;
pub const LIB_CONFIG_RX_TIMESTAMP: u8 = 0x20;

/// Flag byte following the standard payload when every lib config field is
/// enabled.
pub const EXT_MESG_FLAG: u8 = LIB_CONFIG_CHANNEL_ID | LIB_CONFIG_RSSI | LIB_CONFIG_RX_TIMESTAMP;

/// Network number channels are assigned to.
pub const ANT_NETWORK: u8 = 0;
pub const ANT_NETWORK_KEY_SIZE: usize = 8;
pub const ANTPLUS_NETWORK_KEY: [u8; ANT_NETWORK_KEY_SIZE] =
    [0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45];

pub const RF_FREQUENCY_BASE_MHZ: u16 = 2400;

/// A message id and payload pair ready to be framed.
#[derive(Clone, PartialEq)]
pub struct Message {
    pub id: u8,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(id: u8, data: &[u8]) -> Message {
        Message {
            id,
            data: data.to_vec(),
        }
    }

    /// Converts a message into something that can be written out.
    pub fn encode(&self) -> Result<Vec<u8>> {
        frame::encode(self.id, &self.data)
    }

    fn id_as_str(&self) -> &'static str {
        match self.id {
            MESG_RESET => "Reset (0x4A)",
            MESG_NETWORK_KEY_ID => "Set Network Key (0x46)",
            MESG_ASSIGN_CHANNEL_ID => "Assign Channel (0x42)",
            MESG_CHANNEL_ID_ID => "Channel ID (0x51)",
            MESG_CHANNEL_RADIO_FREQ_ID => "Channel RF Frequency (0x45)",
            MESG_RX_EXT_MESGS_ENABLE_ID => "Enable Extended Messages (0x66)",
            MESG_LIB_CONFIG_ID => "Lib Config (0x6E)",
            MESG_OPEN_RX_SCAN_ID => "Open RX Scan Mode (0x5B)",
            MESG_BROADCAST_DATA_ID => "Broadcast Data (0x4E)",
            _ => "Unknown message",
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Message ID: {} DATA: {:02x?}", self.id_as_str(), self.data)
    }
}

pub fn reset() -> Message {
    Message::new(MESG_RESET, &[0])
}

pub fn set_network_key(network_number: u8, key: &[u8]) -> Result<Message> {
    if key.len() != ANT_NETWORK_KEY_SIZE {
        return Err(AntError::InvalidKeyLength(key.len()));
    }
    let mut data = vec![network_number];
    data.extend(key);
    Ok(Message::new(MESG_NETWORK_KEY_ID, &data))
}

pub fn assign_channel(channel: u8, channel_type: u8) -> Message {
    Message::new(MESG_ASSIGN_CHANNEL_ID, &[channel, channel_type, ANT_NETWORK])
}

/// Wildcard channel id: device number, device type and transmission type
/// are all zero so any device matches.
pub fn set_channel_id(channel: u8) -> Message {
    Message::new(MESG_CHANNEL_ID_ID, &[channel, 0, 0, 0, 0])
}

pub fn set_channel_rf_frequency(channel: u8, frequency_mhz: u16) -> Result<Message> {
    let offset = frequency_mhz
        .checked_sub(RF_FREQUENCY_BASE_MHZ)
        .filter(|offset| *offset <= u8::MAX as u16)
        .ok_or(AntError::FrequencyOutOfRange(frequency_mhz))?;
    Ok(Message::new(
        MESG_CHANNEL_RADIO_FREQ_ID,
        &[channel, offset as u8],
    ))
}

pub fn enable_extended_messages(enable: bool) -> Message {
    Message::new(MESG_RX_EXT_MESGS_ENABLE_ID, &[0, enable as u8])
}

/// Requests extra fields appended to every received broadcast.
pub fn lib_config(rx_timestamp: bool, rssi: bool, channel_id: bool) -> Message {
    let mut flags = 0;
    if rx_timestamp {
        flags |= LIB_CONFIG_RX_TIMESTAMP;
    }
    if rssi {
        flags |= LIB_CONFIG_RSSI;
    }
    if channel_id {
        flags |= LIB_CONFIG_CHANNEL_ID;
    }
    Message::new(MESG_LIB_CONFIG_ID, &[0, flags])
}

pub fn open_rx_scan_mode() -> Message {
    Message::new(MESG_OPEN_RX_SCAN_ID, &[])
}

/// Responses that can be received from the ANT+ USB device.
/// Startup is sent once the stick has finished a reset.
/// ChannelEvent acknowledges a configuration message or reports a channel event.
/// BroadcastData is data received from an ANT+ device.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Startup(StartupReason),
    ChannelEvent(ChannelEvent),
    BroadcastData(BroadcastReading),
}

impl Response {
    /// Classify a decoded frame. Frames that are not understood yield `None`.
    pub fn from_frame(frame: &Frame) -> Option<Response> {
        match frame.message_id {
            MESG_STARTUP_MESG_ID => frame
                .payload
                .first()
                .map(|reason| Response::Startup(StartupReason::from(*reason))),
            MESG_RESPONSE_EVENT_ID => match frame.payload.as_slice() {
                [channel, message_id, code, ..] => Some(Response::ChannelEvent(ChannelEvent {
                    channel: *channel,
                    message_id: *message_id,
                    code: ChannelResponseCode::from(*code),
                })),
                _ => None,
            },
            MESG_BROADCAST_DATA_ID => decode_broadcast(frame).map(Response::BroadcastData),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StartupReason {
    PowerOnReset,
    HardwareResetLine,
    WatchDogReset,
    CommandReset,
    SynchronousReset,
    SuspendReset,
    Unknown(u8),
}

impl From<u8> for StartupReason {
    fn from(reason: u8) -> Self {
        match reason {
            0x00 => StartupReason::PowerOnReset,
            0x01 => StartupReason::HardwareResetLine,
            0x02 => StartupReason::WatchDogReset,
            0x20 => StartupReason::CommandReset,
            0x40 => StartupReason::SynchronousReset,
            0x80 => StartupReason::SuspendReset,
            _ => StartupReason::Unknown(reason),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelEvent {
    pub channel: u8,
    /// Id of the message being acknowledged, or 1 for an RF event.
    pub message_id: u8,
    pub code: ChannelResponseCode,
}

impl ChannelEvent {
    pub fn is_rf_event(&self) -> bool {
        self.message_id == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelResponseCode {
    ResponseNoError,
    EventRxSearchTimeout,
    EventRxFail,
    EventTx,
    EventTransferTxCompleted,
    EventTransferTxFailed,
    EventChannelClosed,
    EventRxFailGoToSearch,
    ChannelCollision,
    ChannelInWrongState,
    InvalidMessage,
    Unknown(u8),
}

impl From<u8> for ChannelResponseCode {
    fn from(code: u8) -> Self {
        match code {
            0x00 => ChannelResponseCode::ResponseNoError,
            0x01 => ChannelResponseCode::EventRxSearchTimeout,
            0x02 => ChannelResponseCode::EventRxFail,
            0x03 => ChannelResponseCode::EventTx,
            0x05 => ChannelResponseCode::EventTransferTxCompleted,
            0x06 => ChannelResponseCode::EventTransferTxFailed,
            0x07 => ChannelResponseCode::EventChannelClosed,
            0x08 => ChannelResponseCode::EventRxFailGoToSearch,
            0x09 => ChannelResponseCode::ChannelCollision,
            0x15 => ChannelResponseCode::ChannelInWrongState,
            0x28 => ChannelResponseCode::InvalidMessage,
            _ => {
                debug!("Received ChannelResponseCode: {:x}", code);
                ChannelResponseCode::Unknown(code)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // The following tests test message creation. Since we use constants
    // for the ID, we assert against the literal value of the constant so
    // an accidental change above fails here. These values are part of the
    // ANT message protocol and do not change.
    #[test]
    fn test_reset_message() {
        let mesg = reset();
        // MESG_RESET = 0x4A
        assert_eq!(mesg.id, 0x4A);
        assert_eq!(mesg.data[..], [0]);
    }

    #[test]
    fn test_set_network_key_message() {
        let mesg = set_network_key(0, &ANTPLUS_NETWORK_KEY).unwrap();
        // MESG_NETWORK_KEY_ID = 0x46
        assert_eq!(mesg.id, 0x46);
        assert_eq!(
            mesg.data[..],
            [0, 0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45]
        );
    }

    #[test]
    fn test_set_network_key_invalid_length() {
        match set_network_key(0, &[0; 7]) {
            Err(AntError::InvalidKeyLength(7)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn assign_channel_message() {
        let mesg = assign_channel(0, CHANNEL_TYPE_ONEWAY_RECEIVE);
        // MESG_ASSIGN_CHANNEL_ID = 0x42
        assert_eq!(mesg.id, 0x42);
        assert_eq!(mesg.data[..], [0, 0x40, 0]);
    }

    #[test]
    fn set_channel_id_message() {
        let mesg = set_channel_id(0);
        // MESG_CHANNEL_ID_ID = 0x51
        assert_eq!(mesg.id, 0x51);
        assert_eq!(mesg.data[..], [0, 0, 0, 0, 0]);
    }

    #[test]
    fn set_channel_rf_frequency_message() {
        let mesg = set_channel_rf_frequency(0, 2457).unwrap();
        // MESG_CHANNEL_RADIO_FREQ_ID = 0x45
        assert_eq!(mesg.id, 0x45);
        assert_eq!(mesg.data[..], [0, 57]);
        assert_eq!(set_channel_rf_frequency(1, 2400).unwrap().data[..], [1, 0]);
        assert_eq!(
            set_channel_rf_frequency(1, 2655).unwrap().data[..],
            [1, 255]
        );
    }

    #[test]
    fn set_channel_rf_frequency_out_of_range() {
        for freq in [0u16, 2399, 2656].iter() {
            match set_channel_rf_frequency(0, *freq) {
                Err(AntError::FrequencyOutOfRange(f)) => assert_eq!(f, *freq),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn enable_extended_messages_message() {
        // MESG_RX_EXT_MESGS_ENABLE_ID = 0x66
        assert_eq!(enable_extended_messages(true).id, 0x66);
        assert_eq!(enable_extended_messages(true).data[..], [0, 1]);
        assert_eq!(enable_extended_messages(false).data[..], [0, 0]);
    }

    #[test]
    fn lib_config_message() {
        let mesg = lib_config(true, true, true);
        // MESG_LIB_CONFIG_ID = 0x6E
        assert_eq!(mesg.id, 0x6E);
        assert_eq!(mesg.data[..], [0, 0xE0]);
        assert_eq!(lib_config(true, false, false).data[..], [0, 0x20]);
        assert_eq!(lib_config(false, true, false).data[..], [0, 0x40]);
        assert_eq!(lib_config(false, false, true).data[..], [0, 0x80]);
    }

    #[test]
    fn open_rx_scan_mode_message() {
        let mesg = open_rx_scan_mode();
        // MESG_OPEN_RX_SCAN_ID = 0x5B
        assert_eq!(mesg.id, 0x5B);
        assert!(mesg.data.is_empty());
    }

    #[test]
    fn test_startup_reason() {
        assert_eq!(StartupReason::from(0), StartupReason::PowerOnReset);
        assert_eq!(StartupReason::from(0x01), StartupReason::HardwareResetLine);
        assert_eq!(StartupReason::from(0x02), StartupReason::WatchDogReset);
        assert_eq!(StartupReason::from(0x20), StartupReason::CommandReset);
        assert_eq!(StartupReason::from(0x40), StartupReason::SynchronousReset);
        assert_eq!(StartupReason::from(0x80), StartupReason::SuspendReset);
        assert_eq!(StartupReason::from(0x95), StartupReason::Unknown(0x95));
    }

    #[test]
    fn classify_channel_event() {
        let bytes =
            frame::encode(MESG_RESPONSE_EVENT_ID, &[0, MESG_ASSIGN_CHANNEL_ID, 0x15]).unwrap();
        let frame = frame::decode(&bytes).unwrap();
        assert_eq!(
            Response::from_frame(&frame),
            Some(Response::ChannelEvent(ChannelEvent {
                channel: 0,
                message_id: 0x42,
                code: ChannelResponseCode::ChannelInWrongState,
            }))
        );
    }

    #[test]
    fn classify_unknown_frames() {
        let bytes = frame::encode(0x54, &[8, 3]).unwrap();
        assert_eq!(Response::from_frame(&frame::decode(&bytes).unwrap()), None);
        // Truncated channel response
        let bytes = frame::encode(MESG_RESPONSE_EVENT_ID, &[0, 1]).unwrap();
        assert_eq!(Response::from_frame(&frame::decode(&bytes).unwrap()), None);
        // Unknown codes never panic
        let bytes = frame::encode(MESG_RESPONSE_EVENT_ID, &[0, 1, 0x77]).unwrap();
        match Response::from_frame(&frame::decode(&bytes).unwrap()) {
            Some(Response::ChannelEvent(event)) => {
                assert!(event.is_rf_event());
                assert_eq!(event.code, ChannelResponseCode::Unknown(0x77));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
