//! Demo Mode - Simulated PMS7003 for testing without hardware
//!
//! `DemoLink` streams well-formed frames cycling through a fixed PM sequence,
//! handed out in small chunks the way a UART delivers them. Corruption can be
//! switched on to exercise the retry path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::protocol::{FrameBuilder, SensorError, SerialLink, FRAME_LEN};

/// PM values the demo sensor cycles through (μg/m³)
pub const DEMO_SEQUENCE: [u16; 5] = [50, 110, 150, 110, 50];

/// Default number of bytes handed out per read
const DEFAULT_CHUNK: usize = 7;

/// Simulated sensor implementing [`SerialLink`]
pub struct DemoLink {
    /// Values emitted, one per frame
    sequence: Vec<u16>,
    /// Index of the next value in `sequence`
    cursor: usize,
    /// Bytes of the frame currently being delivered
    pending: [u8; FRAME_LEN],
    /// Read position within `pending`; `FRAME_LEN` means nothing pending
    pos: usize,
    /// Maximum bytes returned by a single read
    chunk: usize,
    open: bool,
    /// Probability that a frame has its checksum broken
    corrupt_rate: f64,
    rng: StdRng,
    frames_emitted: u64,
}

impl Default for DemoLink {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoLink {
    /// Create a demo link emitting [`DEMO_SEQUENCE`]
    pub fn new() -> Self {
        Self::with_sequence(DEMO_SEQUENCE.to_vec())
    }

    /// Create a demo link emitting a custom sequence (must not be empty)
    pub fn with_sequence(sequence: Vec<u16>) -> Self {
        assert!(!sequence.is_empty(), "demo sequence must not be empty");
        Self {
            sequence,
            cursor: 0,
            pending: [0; FRAME_LEN],
            pos: FRAME_LEN,
            chunk: DEFAULT_CHUNK,
            open: false,
            corrupt_rate: 0.0,
            rng: StdRng::seed_from_u64(0),
            frames_emitted: 0,
        }
    }

    /// Break the checksum of a fraction of frames, reproducibly from `seed`
    pub fn with_corruption(mut self, seed: u64, rate: f64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.corrupt_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Limit how many bytes a single read returns
    pub fn with_chunk_size(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Number of frames started so far
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    fn next_frame(&mut self) {
        let value = self.sequence[self.cursor];
        self.cursor = (self.cursor + 1) % self.sequence.len();

        self.pending = FrameBuilder::new().pm25(value).pm10(value).build();
        if self.corrupt_rate > 0.0 && self.rng.gen_bool(self.corrupt_rate) {
            self.pending[FRAME_LEN - 1] ^= 0x5A;
        }
        self.pos = 0;
        self.frames_emitted += 1;
    }
}

impl SerialLink for DemoLink {
    fn open(&mut self) -> Result<(), SensorError> {
        self.open = true;
        self.pos = FRAME_LEN;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn flush(&mut self) -> Result<(), SensorError> {
        if !self.open {
            return Err(SensorError::NotConnected);
        }
        // Drop whatever is left of a partially delivered frame
        self.pos = FRAME_LEN;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        if !self.open {
            return Err(SensorError::NotConnected);
        }
        if self.pos == FRAME_LEN {
            self.next_frame();
        }
        let n = buf.len().min(self.chunk).min(FRAME_LEN - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
