//! PMS7003 Serial Protocol
//!
//! The sensor streams fixed 32-byte frames at 9600 baud with no delimiter other
//! than the start bytes, the length field and a trailing 16-bit sum.

mod error;
pub mod frame;
pub mod link;
pub mod reader;
pub mod serial;

pub use error::SensorError;
pub use frame::{checksum, validate, FrameBuilder};
pub use link::SerialLink;
pub use reader::{read_frame, MAX_EMPTY_READS};
pub use serial::{clear_input, configure_port, list_ports, open_port, PortInfo, SerialPortLink};

/// Default serial device (Raspberry Pi primary UART)
pub const DEFAULT_PORT: &str = "/dev/ttyAMA0";

/// Default baud rate of the sensor
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default per-read deadline in milliseconds.
/// The sensor emits a frame at least once per second in active mode.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Size of one frame on the wire
pub const FRAME_LEN: usize = 32;

/// Start-of-frame bytes ('B', 'M')
pub const START_BYTES: [u8; 2] = [0x42, 0x4D];

/// Value carried by the length field (payload + checksum bytes)
pub const FRAME_LENGTH_FIELD: u16 = 28;
