//! Link abstraction between the driver and the byte transport

use super::SensorError;

/// A duplex, byte-oriented connection to the sensor.
///
/// Implemented by [`SerialPortLink`](super::SerialPortLink) for real hardware and by
/// [`DemoLink`](crate::demo::DemoLink) or test doubles elsewhere. All failures are
/// transport failures; the driver reacts to them by closing and reopening the link.
pub trait SerialLink {
    /// Open (or reopen) the connection, replacing any previous handle
    fn open(&mut self) -> Result<(), SensorError>;

    /// Release the handle. Closing an already closed link is a no-op.
    fn close(&mut self);

    /// Discard bytes already buffered on the receive side
    fn flush(&mut self) -> Result<(), SensorError>;

    /// Blocking read into `buf`; may return fewer bytes than requested
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SensorError>;

    /// Whether a handle is currently held
    fn is_open(&self) -> bool;
}

impl<L: SerialLink + ?Sized> SerialLink for Box<L> {
    fn open(&mut self) -> Result<(), SensorError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn flush(&mut self) -> Result<(), SensorError> {
        (**self).flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        (**self).read(buf)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
