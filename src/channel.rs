/// A channel is a means of communication for an ANT+ device. Before the stick
/// delivers any broadcast data the channel has to be configured in a fixed
/// order: the network key must be set before the channel is assigned, and the
/// channel id and RF frequency must be set before scan mode is opened. The
/// stick owns the channel state once scan mode is open.
use std::fmt;

use log::{debug, info, warn};

use crate::{
    error::AntError,
    message::{self, Message, ANTPLUS_NETWORK_KEY, CHANNEL_TYPE_ONEWAY_RECEIVE},
    transport::Transport,
    Result,
};

/// Bring-up steps for RX scan mode, in the order they are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Reset,
    SetNetworkKey,
    AssignChannel,
    SetChannelId,
    SetChannelRfFrequency,
    EnableExtendedMessages,
    LibConfig,
    OpenRxScanMode,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Reset,
        Step::SetNetworkKey,
        Step::AssignChannel,
        Step::SetChannelId,
        Step::SetChannelRfFrequency,
        Step::EnableExtendedMessages,
        Step::LibConfig,
        Step::OpenRxScanMode,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Step::Reset => "reset",
            Step::SetNetworkKey => "set network key",
            Step::AssignChannel => "assign channel",
            Step::SetChannelId => "set channel id",
            Step::SetChannelRfFrequency => "set channel RF frequency",
            Step::EnableExtendedMessages => "enable extended messages",
            Step::LibConfig => "lib config",
            Step::OpenRxScanMode => "open RX scan mode",
        };
        f.write_str(name)
    }
}

/// ChannelConfig tracks the channel being brought up and which steps have
/// been written to the stick.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelConfig {
    number: u8,
    frequency_mhz: u16,
    sent: Vec<Step>,
}

impl ChannelConfig {
    pub fn new(number: u8, frequency_mhz: u16) -> Self {
        ChannelConfig {
            number,
            frequency_mhz,
            sent: Vec::with_capacity(Step::ALL.len()),
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Steps written so far.
    pub fn sent(&self) -> &[Step] {
        &self.sent
    }

    /// Build the message for a step.
    pub fn message(&self, step: Step) -> Result<Message> {
        match step {
            Step::Reset => Ok(message::reset()),
            Step::SetNetworkKey => message::set_network_key(self.number, &ANTPLUS_NETWORK_KEY),
            Step::AssignChannel => Ok(message::assign_channel(
                self.number,
                CHANNEL_TYPE_ONEWAY_RECEIVE,
            )),
            Step::SetChannelId => Ok(message::set_channel_id(self.number)),
            Step::SetChannelRfFrequency => {
                message::set_channel_rf_frequency(self.number, self.frequency_mhz)
            }
            Step::EnableExtendedMessages => Ok(message::enable_extended_messages(true)),
            Step::LibConfig => Ok(message::lib_config(true, true, true)),
            Step::OpenRxScanMode => Ok(message::open_rx_scan_mode()),
        }
    }

    /// Encode every step up front so a bad argument is rejected before
    /// anything reaches the stick.
    fn plan(&self) -> Result<Vec<(Step, Vec<u8>)>> {
        let mut plan = Vec::with_capacity(Step::ALL.len());
        for step in Step::ALL.iter() {
            plan.push((*step, self.message(*step)?.encode()?));
        }
        Ok(plan)
    }

    fn send<T: Transport>(&mut self, transport: &T, step: Step, frame: &[u8]) -> Result<()> {
        debug!("Sending {} ({:02x?})", step, frame);
        let written = transport.write(frame)?;
        if written != frame.len() {
            return Err(AntError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        self.sent.push(step);
        Ok(())
    }
}

/// Write the RX scan mode bring-up sequence for `channel`. Stops at the
/// first failed write and reports the step; earlier steps are not undone.
pub fn initialize_receive_scan<T: Transport>(
    transport: &T,
    channel: u8,
    frequency_mhz: u16,
) -> Result<()> {
    let mut config = ChannelConfig::new(channel, frequency_mhz);
    for (step, frame) in config.plan()? {
        if let Err(e) = config.send(transport, step, &frame) {
            warn!(
                "Bring-up aborted at {} after {} of {} steps",
                step,
                config.sent().len(),
                Step::ALL.len()
            );
            return Err(AntError::Sequence {
                step,
                source: Box::new(e),
            });
        }
    }
    info!(
        "Channel {} open in RX scan mode at {} MHz",
        config.number(),
        frequency_mhz
    );
    Ok(())
}
