use std::io::Write;

use crate::presence::domain::signal::Signal;
use crate::presence::domain::signal_sink::SignalSink;

/// Writes one signal per `\n`-terminated line and flushes after each.
pub struct LineSignalWriter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> LineSignalWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LineSignalWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> SignalSink for LineSignalWriter<W> {
    fn emit(&mut self, signal: &Signal) -> std::io::Result<()> {
        writeln!(self.out, "{signal}")?;
        self.out.flush()?;
        log::debug!("Emitted {signal}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::domain::signal::ErrorReason;
    use std::io;

    #[test]
    fn test_emits_newline_terminated_lines() {
        let mut writer = LineSignalWriter::new(Vec::new());
        writer.emit(&Signal::Ready).unwrap();
        writer.emit(&Signal::FaceDetected).unwrap();
        writer.emit(&Signal::FaceLost).unwrap();
        writer
            .emit(&Signal::Error(ErrorReason::CameraFail))
            .unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "READY\nFACE_DETECTED\nFACE_LOST\nERROR:CAMERA_FAIL\n");
    }

    /// Buffers writes and only counts them as delivered on flush.
    #[derive(Default)]
    struct FlushTracking {
        pending: Vec<u8>,
        flushed: Vec<u8>,
    }

    impl Write for FlushTracking {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.pending.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed.append(&mut self.pending);
            Ok(())
        }
    }

    #[test]
    fn test_each_signal_is_flushed() {
        let mut writer = LineSignalWriter::new(FlushTracking::default());
        writer.emit(&Signal::Ready).unwrap();
        writer.emit(&Signal::FaceDetected).unwrap();

        let inner = writer.into_inner();
        assert!(inner.pending.is_empty());
        assert_eq!(inner.flushed, b"READY\nFACE_DETECTED\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "consumer gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut writer = LineSignalWriter::new(BrokenPipe);
        let err = writer.emit(&Signal::Ready).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
