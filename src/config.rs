use std::num::ParseIntError;
use std::time::Duration;

pub const DEFAULT_VENDOR_ID: u16 = 0x0FCF;
pub const DEFAULT_PRODUCT_ID: u16 = 0x1009;
pub const DEFAULT_FREQUENCY_MHZ: u16 = 2457;

/// Settings for opening the stick and bringing up the scan channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub vendor_id: u16,
    pub product_id: u16,
    pub channel: u8,
    pub frequency_mhz: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            channel: 0,
            frequency_mhz: DEFAULT_FREQUENCY_MHZ,
            read_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    pub fn product_id(mut self, product_id: u16) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn frequency_mhz(mut self, frequency_mhz: u16) -> Self {
        self.frequency_mhz = frequency_mhz;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }
}

/// Parse a USB vendor or product id written in decimal or with a `0x`, `0o`
/// or `0b` prefix.
pub fn parse_id(s: &str) -> Result<u16, ParseIntError> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u16::from_str_radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u16::from_str_radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u16::from_str_radix(bin, 2)
    } else {
        s.parse()
    }
}
