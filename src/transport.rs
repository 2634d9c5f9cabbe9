use std::sync::Arc;
use std::time::Duration;

use crate::Result;

/// Byte transport to the ANT radio. The read and write directions are
/// independent streams, so one reader and one writer may share a handle
/// without further locking.
pub trait Transport {
    /// Write one encoded frame, returning the number of bytes written.
    fn write(&self, bytes: &[u8]) -> Result<usize>;

    /// Block for at most `timeout` waiting for data. `Ok(None)` means the
    /// timeout elapsed with nothing to read.
    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn write(&self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
        (**self).read(buf, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn write(&self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
        (**self).read(buf, timeout)
    }
}
