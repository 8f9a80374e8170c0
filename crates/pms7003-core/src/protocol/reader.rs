//! Frame assembly from a byte stream

use super::{SensorError, SerialLink, FRAME_LEN};

/// Number of consecutive zero-byte reads tolerated before a frame is abandoned
pub const MAX_EMPTY_READS: usize = 8;

/// Fill `buf` with one frame's worth of bytes.
///
/// Short reads are continued from the current offset. Link errors are returned
/// unchanged; a link that keeps returning zero bytes yields
/// [`SensorError::IncompleteFrame`] after [`MAX_EMPTY_READS`] attempts.
pub fn read_frame<L: SerialLink + ?Sized>(
    link: &mut L,
    buf: &mut [u8; FRAME_LEN],
) -> Result<(), SensorError> {
    let mut filled = 0;
    let mut empty_reads = 0;

    while filled < FRAME_LEN {
        let n = link.read(&mut buf[filled..])?;
        if n == 0 {
            empty_reads += 1;
            if empty_reads >= MAX_EMPTY_READS {
                return Err(SensorError::IncompleteFrame {
                    received: filled,
                    expected: FRAME_LEN,
                });
            }
            continue;
        }
        empty_reads = 0;
        filled += n.min(FRAME_LEN - filled);
    }

    tracing::trace!(frame = ?&buf[..], "frame assembled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Replays scripted read results
    struct ScriptedLink {
        script: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
        reads: usize,
    }

    impl ScriptedLink {
        fn new(script: Vec<Result<Vec<u8>, io::ErrorKind>>) -> Self {
            Self {
                script: script.into(),
                reads: 0,
            }
        }
    }

    impl SerialLink for ScriptedLink {
        fn open(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn close(&mut self) {}

        fn flush(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
            self.reads += 1;
            match self.script.pop_front() {
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
                Some(Err(kind)) => Err(io::Error::new(kind, "scripted failure").into()),
                None => Ok(0),
            }
        }

        fn is_open(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_short_reads_are_assembled() {
        let bytes: Vec<u8> = (0..32).collect();
        let mut link = ScriptedLink::new(vec![
            Ok(bytes[..5].to_vec()),
            Ok(bytes[5..6].to_vec()),
            Ok(bytes[6..20].to_vec()),
            Ok(bytes[20..].to_vec()),
        ]);
        let mut buf = [0u8; FRAME_LEN];

        read_frame(&mut link, &mut buf).expect("Should assemble frame");
        assert_eq!(buf.to_vec(), bytes);
        assert_eq!(link.reads, 4);
    }

    #[test]
    fn test_zero_reads_are_bounded() {
        let mut link = ScriptedLink::new(vec![Ok(vec![0x42; 10])]);
        let mut buf = [0u8; FRAME_LEN];

        let err = read_frame(&mut link, &mut buf).expect_err("stalled link must not complete");
        assert!(matches!(
            err,
            SensorError::IncompleteFrame {
                received: 10,
                expected: FRAME_LEN
            }
        ));
        assert_eq!(link.reads, 1 + MAX_EMPTY_READS);
    }

    #[test]
    fn test_zero_read_counter_resets_on_progress() {
        let mut script = Vec::new();
        for _ in 0..4 {
            for _ in 0..MAX_EMPTY_READS - 1 {
                script.push(Ok(Vec::new()));
            }
            script.push(Ok(vec![0u8; 8]));
        }
        let mut link = ScriptedLink::new(script);
        let mut buf = [0u8; FRAME_LEN];

        assert!(read_frame(&mut link, &mut buf).is_ok());
    }

    #[test]
    fn test_io_error_propagates() {
        let mut link = ScriptedLink::new(vec![
            Ok(vec![0x42, 0x4D]),
            Err(io::ErrorKind::TimedOut),
        ]);
        let mut buf = [0u8; FRAME_LEN];

        let err = read_frame(&mut link, &mut buf).expect_err("read failure must propagate");
        assert!(err.is_transport());
        match err {
            SensorError::IoError(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
