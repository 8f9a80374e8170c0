//! Serial port handling
//!
//! Provides low-level serial port access for the sensor UART.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::Read;
use std::time::Duration;

use super::{SensorError, SerialLink, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};
use crate::config::SensorConfig;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyAMA0" or "/dev/ttyUSB0")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                (Some(usb_info.vid), Some(usb_info.pid), usb_info.product)
            }
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

/// Sort key so that on-board UARTs (ttyAMA*, serial*, ttyS*) come first,
/// then USB adapters (ttyUSB*), then everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let numbered = [("ttyAMA", 0u8), ("serial", 0), ("ttyS", 1), ("ttyUSB", 2)];
    for (prefix, group) in numbered {
        if let Some(rest) = basename.strip_prefix(prefix) {
            if let Ok(num) = rest.parse::<usize>() {
                return (group, num, basename.to_string());
            }
        }
    }
    (3, 0, basename.to_string())
}

/// List available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // The Pi UART aliases are not always reported by the enumeration API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyAMA") || fname.starts_with("serial") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Open a serial port with a read deadline
pub fn open_port(
    name: &str,
    baud_rate: Option<u32>,
    timeout: Option<Duration>,
) -> Result<Box<dyn SerialPort>, SensorError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    let timeout = timeout.unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));

    serialport::new(name, baud)
        .timeout(timeout)
        .open()
        .map_err(SensorError::from)
}

/// Configure a serial port for the sensor (8N1, no flow control)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), SensorError> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;
    Ok(())
}

/// Discard any bytes waiting in the receive buffer
pub fn clear_input(port: &mut dyn SerialPort) -> Result<(), SensorError> {
    port.clear(serialport::ClearBuffer::Input)
        .map_err(SensorError::from)
}

/// [`SerialLink`] backed by a real serial device
pub struct SerialPortLink {
    /// Device path
    port_name: String,
    /// Baud rate
    baud_rate: u32,
    /// Deadline for a single blocking read
    timeout: Duration,
    /// Open handle, if any
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortLink {
    /// Create a link for the given device (not yet opened)
    pub fn new(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    /// Create a link from sensor configuration (not yet opened)
    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(
            config.port_name.clone(),
            config.baud_rate,
            Duration::from_millis(config.read_timeout_ms),
        )
    }

    /// Device path this link opens
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, SensorError> {
        self.port.as_mut().ok_or(SensorError::NotConnected)
    }
}

impl SerialLink for SerialPortLink {
    fn open(&mut self) -> Result<(), SensorError> {
        // Drop the previous handle before opening the device again
        self.port = None;

        let mut port = open_port(&self.port_name, Some(self.baud_rate), Some(self.timeout))?;
        configure_port(port.as_mut())?;
        tracing::debug!(
            port = %self.port_name,
            baud = self.baud_rate,
            timeout_ms = self.timeout.as_millis() as u64,
            "serial link opened"
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.port_name, "serial link closed");
        }
    }

    fn flush(&mut self) -> Result<(), SensorError> {
        let port = self.port_mut()?;
        clear_input(port.as_mut())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        let port = self.port_mut()?;
        // A read deadline expiry surfaces as io::ErrorKind::TimedOut
        port.read(buf).map_err(SensorError::from)
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}
