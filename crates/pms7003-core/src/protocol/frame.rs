//! Frame decoding/encoding
//!
//! Frame format (all multi-byte fields big-endian):
//! - 2 bytes: start bytes 0x42 0x4D
//! - 2 bytes: frame length, always 28
//! - 26 bytes: data words (PM2.5 at offset 6, PM10 at offset 8)
//! - 2 bytes: checksum, 16-bit sum of bytes 0..=28

use byteorder::{BigEndian, ByteOrder};

use super::{SensorError, FRAME_LEN, FRAME_LENGTH_FIELD, START_BYTES};
use crate::types::Reading;

/// Offset of the PM2.5 word
const PM25_OFFSET: usize = 6;
/// Offset of the PM10 word
const PM10_OFFSET: usize = 8;
/// Number of leading bytes covered by the checksum
const CHECKSUM_COVERAGE: usize = 29;
/// Offset of the checksum word
const CHECKSUM_OFFSET: usize = 30;

/// 16-bit wrapping sum of the bytes the checksum covers
pub fn checksum(frame: &[u8; FRAME_LEN]) -> u16 {
    frame[..CHECKSUM_COVERAGE]
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

/// Check header, length and checksum of a complete frame and extract the reading
pub fn validate(frame: &[u8; FRAME_LEN]) -> Result<Reading, SensorError> {
    let header_ok = frame[0] == START_BYTES[0]
        && frame[1] == START_BYTES[1]
        && BigEndian::read_u16(&frame[2..4]) == FRAME_LENGTH_FIELD;
    if !header_ok {
        return Err(SensorError::BadHeader {
            found: [frame[0], frame[1], frame[2], frame[3]],
        });
    }

    let expected = checksum(frame);
    let actual = BigEndian::read_u16(&frame[CHECKSUM_OFFSET..FRAME_LEN]);
    if expected != actual {
        return Err(SensorError::ChecksumMismatch { expected, actual });
    }

    Ok(Reading {
        pm25: BigEndian::read_u16(&frame[PM25_OFFSET..PM25_OFFSET + 2]),
        pm10: BigEndian::read_u16(&frame[PM10_OFFSET..PM10_OFFSET + 2]),
    })
}

/// Builder for well-formed frames, used by the demo link and tests
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame: [u8; FRAME_LEN],
}

impl FrameBuilder {
    /// Start from an all-zero payload with valid header and length
    pub fn new() -> Self {
        let mut frame = [0u8; FRAME_LEN];
        frame[..2].copy_from_slice(&START_BYTES);
        BigEndian::write_u16(&mut frame[2..4], FRAME_LENGTH_FIELD);
        Self { frame }
    }

    /// Set the PM2.5 word
    pub fn pm25(mut self, value: u16) -> Self {
        BigEndian::write_u16(&mut self.frame[PM25_OFFSET..PM25_OFFSET + 2], value);
        self
    }

    /// Set the PM10 word
    pub fn pm10(mut self, value: u16) -> Self {
        BigEndian::write_u16(&mut self.frame[PM10_OFFSET..PM10_OFFSET + 2], value);
        self
    }

    /// Set an arbitrary data word at `offset` (4..=26)
    pub fn word(mut self, offset: usize, value: u16) -> Self {
        BigEndian::write_u16(&mut self.frame[offset..offset + 2], value);
        self
    }

    /// Seal the frame with a correct checksum
    pub fn build(mut self) -> [u8; FRAME_LEN] {
        let sum = checksum(&self.frame);
        BigEndian::write_u16(&mut self.frame[CHECKSUM_OFFSET..FRAME_LEN], sum);
        self.frame
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Reading> for FrameBuilder {
    fn from(reading: Reading) -> Self {
        Self::new().pm25(reading.pm25).pm10(reading.pm10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_output_validates() {
        let frame = FrameBuilder::new().pm25(150).pm10(210).build();
        let reading = validate(&frame).expect("Should validate successfully");

        assert_eq!(reading, Reading { pm25: 150, pm10: 210 });
    }

    #[test]
    fn test_checksum_sums_first_29_bytes() {
        let mut frame = [0xFFu8; FRAME_LEN];
        assert_eq!(checksum(&frame), 29 * 255);
        frame[..CHECKSUM_COVERAGE].fill(0);
        assert_eq!(checksum(&frame), 0);
    }

    #[test]
    fn test_byte_29_not_covered() {
        let a = FrameBuilder::new().pm25(10).build();
        let mut b = a;
        b[29] = 0xAA;
        assert_eq!(checksum(&a), checksum(&b));
        assert!(validate(&b).is_ok());
    }

    #[test]
    fn test_single_header_byte_mismatch_rejected() {
        // Each of the four header bytes alone must be enough to reject the frame
        for idx in 0..4 {
            let mut frame = FrameBuilder::new().pm25(42).build();
            frame[idx] ^= 0x01;
            assert!(
                matches!(validate(&frame), Err(SensorError::BadHeader { .. })),
                "corrupting byte {} should fail the header check",
                idx
            );
        }
    }

    #[test]
    fn test_corrupted_payload_fails_checksum() {
        let mut frame = FrameBuilder::new().pm25(35).pm10(40).build();
        frame[PM25_OFFSET + 1] ^= 0xFF;

        assert!(matches!(
            validate(&frame),
            Err(SensorError::ChecksumMismatch { .. })
        ));
    }
}
