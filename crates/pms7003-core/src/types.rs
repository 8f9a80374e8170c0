use serde::{Deserialize, Serialize};

/// PMS7003 measurement pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reading {
    /// Mass Concentration PM2.5 [μg/m³]
    pub pm25: u16,
    /// Mass Concentration PM10 [μg/m³]
    pub pm10: u16,
}

impl From<Reading> for (u16, u16) {
    fn from(reading: Reading) -> Self {
        (reading.pm25, reading.pm10)
    }
}
