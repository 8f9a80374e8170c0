//! Sensor errors

use thiserror::Error;

/// Errors that can occur while acquiring a measurement
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serial link is not open")]
    NotConnected,

    #[error("Bad frame header: {found:02x?}")]
    BadHeader { found: [u8; 4] },

    #[error("Incomplete frame: received {received} of {expected} bytes")]
    IncompleteFrame { received: usize, expected: usize },

    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("PM2.5 value {pm25} rejected, deviates from running average {average:.1}")]
    OutlierRejected { pm25: u16, average: f64 },

    #[error("History is empty")]
    EmptyHistory,

    #[error("Sensor unavailable after {attempts} attempts")]
    SensorUnavailable { attempts: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),
}

impl SensorError {
    /// Failure of the serial link itself (open, flush or read)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SensorError::SerialError(_)
                | SensorError::IoError(_)
                | SensorError::NotConnected
                | SensorError::PortNotFound(_)
        )
    }

    /// Protocol-level failure that is recovered by reading another frame
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SensorError::BadHeader { .. }
                | SensorError::IncompleteFrame { .. }
                | SensorError::ChecksumMismatch { .. }
                | SensorError::OutlierRejected { .. }
        )
    }

    /// Framing failure: wrong header/length bytes or a frame that never completed
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            SensorError::BadHeader { .. } | SensorError::IncompleteFrame { .. }
        )
    }
}

impl From<serialport::Error> for SensorError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => SensorError::PortNotFound(e.to_string()),
            serialport::ErrorKind::Io(kind) => {
                SensorError::IoError(std::io::Error::new(kind, e.description))
            }
            _ => SensorError::SerialError(e.to_string()),
        }
    }
}
