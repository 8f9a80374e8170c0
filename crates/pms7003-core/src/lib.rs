//! # PMS7003 Core Library
//!
//! Acquisition driver for the Plantower PMS7003 particulate matter sensor.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial link handling for the sensor UART
//! - Frame assembly, header and checksum validation
//! - Outlier rejection against a running PM2.5 average
//! - A retrying acquisition driver with link reopen on I/O failure
//! - A simulated sensor for running without hardware
//!
//! ## Example
//!
//! ```rust,ignore
//! use pms7003_core::{config::SensorConfig, sensor::Pms7003};
//!
//! let mut sensor = Pms7003::open(&SensorConfig::default())?;
//! let reading = sensor.get()?;
//! println!("PM2.5: {} ug/m3, PM10: {} ug/m3", reading.pm25, reading.pm10);
//! sensor.close();
//! ```

pub mod config;
pub mod demo;
pub mod history;
pub mod protocol;
pub mod sensor;
pub mod types;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SensorConfig;
    pub use crate::demo::DemoLink;
    pub use crate::history::{History, OutlierFilter};
    pub use crate::protocol::{SensorError, SerialLink, SerialPortLink};
    pub use crate::sensor::{AcquisitionStats, Pms7003};
    pub use crate::types::Reading;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
