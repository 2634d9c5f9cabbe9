use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};
use log::debug;

use super::Result;
use crate::{
    broadcast::BroadcastReading,
    cancel::CancelToken,
    channel,
    config::Config,
    receive::ReceiveLoop,
    transport::Transport,
    usb::{Context, UsbDevice},
};

/// An RX scan session over one transport. The bring-up writes and the
/// receive thread share the transport handle; nothing else is shared.
pub struct Ant<T: Transport> {
    transport: Arc<T>,
    config: Config,
}

impl Ant<UsbDevice<Context>> {
    /// Open the ANT+ USB stick described by `config`.
    pub fn open_usb(config: Config) -> Result<Self> {
        let device = UsbDevice::open(&config)?;
        Ok(Ant::new(device, config))
    }
}

impl<T: Transport> Ant<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Ant {
            transport: Arc::new(transport),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Write the bring-up sequence for the configured channel and frequency.
    pub fn start_rx_scan(&self) -> Result<()> {
        debug!(
            "Starting RX scan mode on channel {} at {} MHz",
            self.config.channel, self.config.frequency_mhz
        );
        channel::initialize_receive_scan(
            &*self.transport,
            self.config.channel,
            self.config.frequency_mhz,
        )
    }
}

impl<T: Transport + Send + Sync + 'static> Ant<T> {
    /// Run the receive loop on its own thread. Readings arrive on the
    /// returned receiver; the thread's result reports why the loop stopped.
    pub fn spawn_receiver(
        &self,
        cancel: CancelToken,
    ) -> (JoinHandle<Result<()>>, Receiver<BroadcastReading>) {
        let (tx, rx) = unbounded();
        let transport = Arc::clone(&self.transport);
        let read_timeout = self.config.read_timeout;
        let handle = thread::spawn(move || {
            ReceiveLoop::new(transport, cancel, tx, read_timeout).run()
        });
        (handle, rx)
    }
}
