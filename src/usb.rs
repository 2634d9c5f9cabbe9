/// A UsbContext and UsbDevice for interacting with the physical
/// USB device.
use std::time::Duration;

use log::{debug, info};
pub use rusb::{Context, UsbContext};
use rusb::{DeviceHandle, Error};

use crate::{config::Config, error::AntError, transport::Transport, Result};

// TODO ANT settings are hardcoded for the Dynastream sticks (0x1008 and
// 0x1009); other ANT+ USB devices may use different endpoints.
const USB_ANT_CONFIGURATION: u8 = 1;
const USB_ANT_INTERFACE: u8 = 0;
const USB_ANT_EP_IN: u8 = 0x81;
const USB_ANT_EP_OUT: u8 = 0x01;

/// UsbDevice holds the handle to the claimed ANT+ USB stick. Bulk IN and OUT
/// are separate endpoints so reads and writes can happen from different
/// threads.
pub struct UsbDevice<T: UsbContext> {
    handle: DeviceHandle<T>,
    write_timeout: Duration,
}

impl UsbDevice<Context> {
    /// Open the stick described by `config` in a fresh libusb context.
    pub fn open(config: &Config) -> Result<Self> {
        let ctx = Context::new()?;
        Self::init(&ctx, config)
    }
}

impl<T: UsbContext> UsbDevice<T> {
    /// Open and claim the ANT+ device matching the configured vendor and
    /// product ids.
    pub fn init(ctx: &T, config: &Config) -> Result<UsbDevice<T>> {
        let mut handle = ctx
            .open_device_with_vid_pid(config.vendor_id, config.product_id)
            .ok_or(AntError::DeviceNotFound {
                vendor_id: config.vendor_id,
                product_id: config.product_id,
            })?;
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) => debug!("Enabled kernel driver auto-detach"),
            Err(Error::NotSupported) => debug!("Kernel driver auto-detach not supported"),
            Err(e) => return Err(e.into()),
        }
        debug!("Setting configuration {}", USB_ANT_CONFIGURATION);
        match handle.set_active_configuration(USB_ANT_CONFIGURATION) {
            // Another interface of the configuration is in use; keep the
            // current one.
            Ok(()) | Err(Error::Busy) => {}
            Err(e) => return Err(e.into()),
        }
        debug!("Claiming interface {}", USB_ANT_INTERFACE);
        handle.claim_interface(USB_ANT_INTERFACE)?;
        info!(
            "Opened ANT+ stick {:04x}:{:04x}",
            config.vendor_id, config.product_id
        );
        Ok(UsbDevice {
            handle,
            write_timeout: config.write_timeout,
        })
    }
}

impl<T: UsbContext> Transport for UsbDevice<T> {
    fn write(&self, message: &[u8]) -> Result<usize> {
        self.handle
            .write_bulk(USB_ANT_EP_OUT, message, self.write_timeout)
            .map_err(AntError::UsbDeviceError)
    }

    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
        match self.handle.read_bulk(USB_ANT_EP_IN, buf, timeout) {
            Ok(len) => Ok(Some(len)),
            Err(Error::Timeout) => Ok(None),
            Err(e) => Err(AntError::UsbDeviceError(e)),
        }
    }
}
