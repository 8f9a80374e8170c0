//! Sensor configuration
//!
//! Every field has a default matching the stock wiring (Pi UART, 9600 baud), so an
//! empty JSON object is a valid configuration file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::history::{DEFAULT_HISTORY_SIZE, DEFAULT_MAX_DELTA_PM25};
use crate::protocol::{SensorError, DEFAULT_BAUD_RATE, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};

/// Default number of frame attempts per acquisition
pub const DEFAULT_MAX_RETRY: usize = 10;

/// Acquisition settings for one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Serial device path
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Deadline for a single blocking read in milliseconds
    pub read_timeout_ms: u64,
    /// Frame attempts per acquisition before giving up
    pub max_retry: usize,
    /// Number of accepted PM2.5 values averaged by the outlier filter
    pub history_size: usize,
    /// Maximum PM2.5 deviation from the running average, in μg/m³
    pub max_delta_pm25: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retry: DEFAULT_MAX_RETRY,
            history_size: DEFAULT_HISTORY_SIZE,
            max_delta_pm25: DEFAULT_MAX_DELTA_PM25,
        }
    }
}

impl SensorConfig {
    /// Load and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SensorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SensorError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: SensorConfig = serde_json::from_str(&content).map_err(|e| {
            SensorError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the driver cannot run with
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.port_name.is_empty() {
            return Err(SensorError::InvalidConfig("port_name is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(SensorError::InvalidConfig("baud_rate must be non-zero".into()));
        }
        if self.max_retry == 0 {
            return Err(SensorError::InvalidConfig("max_retry must be at least 1".into()));
        }
        if self.history_size == 0 {
            return Err(SensorError::InvalidConfig(
                "history_size must be at least 1".into(),
            ));
        }
        if !(self.max_delta_pm25 > 0.0) {
            return Err(SensorError::InvalidConfig(format!(
                "max_delta_pm25 must be positive, got {}",
                self.max_delta_pm25
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SensorConfig::default();
        assert_eq!(config.port_name, "/dev/ttyAMA0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.max_retry, 10);
        assert_eq!(config.history_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SensorConfig =
            serde_json::from_str(r#"{"port_name": "/dev/ttyUSB0"}"#).unwrap();
        assert_eq!(config.port_name, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.read_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_rejects_zero_retry() {
        let config = SensorConfig {
            max_retry: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_nan_delta() {
        let config = SensorConfig {
            max_delta_pm25: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
