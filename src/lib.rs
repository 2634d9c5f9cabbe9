//! Receive ANT+ heart rate broadcasts from an ANT USB stick.
//!
//! The stick is brought up in RX scan mode with a fixed sequence of control
//! messages, after which a receive loop decodes broadcast frames into
//! [`BroadcastReading`]s.
pub mod ant;
pub mod broadcast;
pub mod cancel;
pub mod channel;
pub mod config;
mod error;
pub mod frame;
pub mod message;
pub mod receive;
pub mod transport;
pub mod usb;

pub type Result<T> = std::result::Result<T, error::AntError>;

pub use ant::Ant;
pub use broadcast::{decode_broadcast, BroadcastReading, Extension};
pub use cancel::{cancellation, CancelToken, Canceller};
pub use channel::{initialize_receive_scan, Step};
pub use config::Config;
pub use error::{AntError, DecodeError};
pub use frame::{decode, encode, Frame};
pub use receive::ReceiveLoop;
pub use transport::Transport;
pub use usb::UsbDevice;
