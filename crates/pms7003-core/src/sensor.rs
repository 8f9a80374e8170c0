//! Acquisition driver
//!
//! Ties the link, frame reader, validator and outlier filter together and owns
//! the retry and reconnect policy.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SensorConfig;
use crate::history::{History, OutlierFilter};
use crate::protocol::{read_frame, validate, SensorError, SerialLink, SerialPortLink, FRAME_LEN};
use crate::types::Reading;

/// Cumulative acquisition counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionStats {
    /// Frame attempts started
    pub attempts: u64,
    /// Complete 32-byte frames assembled
    pub frames_read: u64,
    /// Frames with wrong start bytes or length field
    pub framing_errors: u64,
    /// Frames abandoned because the link stopped delivering bytes
    pub incomplete_frames: u64,
    /// Frames failing the checksum
    pub checksum_errors: u64,
    /// Valid frames whose PM2.5 value was rejected as an outlier
    pub outliers_rejected: u64,
    /// Readings returned to the caller
    pub readings_accepted: u64,
    /// Acquisitions aborted by a link failure
    pub transport_failures: u64,
    /// Successful reopens after a link failure
    pub reopens: u64,
}

/// PMS7003 driver.
///
/// One instance exclusively owns its link, frame buffer and history. `get` takes
/// `&mut self`, so concurrent acquisitions on the same instance cannot happen;
/// move the driver into a worker thread to poll it off the caller's thread.
pub struct Pms7003<L: SerialLink> {
    link: L,
    /// Overwritten on every attempt
    buf: [u8; FRAME_LEN],
    filter: OutlierFilter,
    max_retry: usize,
    stats: AcquisitionStats,
}

impl Pms7003<SerialPortLink> {
    /// Open the serial device named in `config`
    pub fn open(config: &SensorConfig) -> Result<Self, SensorError> {
        config.validate()?;
        Self::with_link(SerialPortLink::from_config(config), config)
    }
}

impl<L: SerialLink> Pms7003<L> {
    /// Wrap an arbitrary link and open it
    pub fn with_link(mut link: L, config: &SensorConfig) -> Result<Self, SensorError> {
        config.validate()?;
        link.open()?;
        info!(
            max_retry = config.max_retry,
            history_size = config.history_size,
            max_delta = config.max_delta_pm25,
            "pms7003 driver ready"
        );
        Ok(Self {
            link,
            buf: [0; FRAME_LEN],
            filter: OutlierFilter::new(config.history_size, config.max_delta_pm25),
            max_retry: config.max_retry,
            stats: AcquisitionStats::default(),
        })
    }

    /// Acquire one validated measurement.
    ///
    /// Bad frames and outliers are retried up to `max_retry` times, after which
    /// [`SensorError::SensorUnavailable`] is returned. A link failure closes and
    /// reopens the link and is returned immediately without further attempts.
    pub fn get(&mut self) -> Result<Reading, SensorError> {
        for attempt in 1..=self.max_retry {
            self.stats.attempts += 1;
            match self.attempt() {
                Ok(reading) => {
                    self.stats.readings_accepted += 1;
                    debug!(attempt, pm25 = reading.pm25, pm10 = reading.pm10, "reading accepted");
                    return Ok(reading);
                }
                Err(e) if e.is_transport() => {
                    self.stats.transport_failures += 1;
                    warn!(attempt, error = %e, "serial link failure, reopening");
                    self.reopen();
                    return Err(e);
                }
                Err(e) if e.is_retryable() => {
                    self.count_rejection(&e);
                    debug!(attempt, error = %e, "frame discarded");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts = self.max_retry, "no valid reading, sensor unavailable");
        Err(SensorError::SensorUnavailable {
            attempts: self.max_retry,
        })
    }

    /// One flush, read, validate and filter pass
    fn attempt(&mut self) -> Result<Reading, SensorError> {
        // Stale bytes would misalign the next frame
        self.link.flush()?;
        read_frame(&mut self.link, &mut self.buf)?;
        self.stats.frames_read += 1;

        let reading = validate(&self.buf)?;
        self.filter.evaluate(reading.pm25)?;
        Ok(reading)
    }

    fn count_rejection(&mut self, e: &SensorError) {
        match e {
            SensorError::BadHeader { .. } => self.stats.framing_errors += 1,
            SensorError::IncompleteFrame { .. } => self.stats.incomplete_frames += 1,
            SensorError::ChecksumMismatch { .. } => self.stats.checksum_errors += 1,
            SensorError::OutlierRejected { .. } => self.stats.outliers_rejected += 1,
            _ => {}
        }
    }

    /// Close and reopen the link. A failed reopen is logged; the next `get`
    /// will fail on the closed link and try again.
    fn reopen(&mut self) {
        self.link.close();
        match self.link.open() {
            Ok(()) => {
                self.stats.reopens += 1;
                info!("serial link reopened");
            }
            Err(e) => warn!(error = %e, "failed to reopen serial link"),
        }
    }

    /// Release the link
    pub fn close(&mut self) {
        self.link.close();
    }

    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    /// Accepted PM2.5 values currently averaged by the outlier filter
    pub fn history(&self) -> &History {
        self.filter.history()
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Give back the link, e.g. to inspect a test double
    pub fn into_link(self) -> L {
        self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoLink;

    #[test]
    fn test_demo_readings() {
        let mut sensor = Pms7003::with_link(DemoLink::new(), &SensorConfig::default()).unwrap();

        let values: Vec<u16> = (0..5).map(|_| sensor.get().unwrap().pm25).collect();
        assert_eq!(values, vec![50, 110, 150, 110, 50]);
        assert_eq!(sensor.history().len(), 5);
        assert_eq!(sensor.stats().readings_accepted, 5);
        assert_eq!(sensor.stats().attempts, 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SensorConfig {
            history_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            Pms7003::with_link(DemoLink::new(), &config),
            Err(SensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_close() {
        let mut sensor = Pms7003::with_link(DemoLink::new(), &SensorConfig::default()).unwrap();
        assert!(sensor.is_open());
        sensor.close();
        assert!(!sensor.is_open());
    }
}
