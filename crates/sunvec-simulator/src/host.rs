//! Host bindings for the core's time and byte-sink seams.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use sunvec_core::sampling::MonotonicClock;

/// Wall-clock time since the clock was created.
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for StdClock {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Blocks the calling thread.
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Debug)]
pub struct HostIoError(pub io::Error);

impl fmt::Display for HostIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl core::error::Error for HostIoError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for HostIoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind as Kind;
        match self.0.kind() {
            io::ErrorKind::NotFound => Kind::NotFound,
            io::ErrorKind::PermissionDenied => Kind::PermissionDenied,
            io::ErrorKind::AlreadyExists => Kind::AlreadyExists,
            io::ErrorKind::InvalidInput => Kind::InvalidInput,
            io::ErrorKind::InvalidData => Kind::InvalidData,
            io::ErrorKind::TimedOut => Kind::TimedOut,
            io::ErrorKind::Interrupted => Kind::Interrupted,
            io::ErrorKind::Unsupported => Kind::Unsupported,
            io::ErrorKind::OutOfMemory => Kind::OutOfMemory,
            io::ErrorKind::WriteZero => Kind::WriteZero,
            _ => Kind::Other,
        }
    }
}

/// Buffered output file exposed as an `embedded_io` writer.
pub struct FileWriter {
    inner: BufWriter<File>,
}

impl FileWriter {
    /// Create or truncate `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            inner: BufWriter::new(File::create(path)?),
        })
    }
}

impl embedded_io::ErrorType for FileWriter {
    type Error = HostIoError;
}

impl embedded_io::Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.inner.write(buf).map_err(HostIoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush().map_err(HostIoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Write as _;

    #[test]
    fn test_file_writer_round_trip() {
        let path = std::env::temp_dir().join(format!("sunvec-host-{}.txt", std::process::id()));
        let mut writer = FileWriter::create(&path).unwrap();
        writer.write_all(b"Time,X\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Time,X\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_csv_rows_on_disk_before_close() {
        use sunvec_core::estimation::{AnglePair, DirectionVector};
        use sunvec_core::storage::{CSV_HEADER, CsvSink, Record, RecordSink};

        let path = std::env::temp_dir().join(format!("sunvec-rows-{}.csv", std::process::id()));
        let mut sink = CsvSink::new(FileWriter::create(&path).unwrap());
        sink.open().unwrap();
        let record = Record::new(1.5, DirectionVector::new(0.0, 0.0, 1.0), AnglePair::default());
        sink.append(&record).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        drop(sink);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(text, format!("{}\n1.5,0,0,1,0,0\n", CSV_HEADER));
    }

    #[test]
    fn test_io_error_kinds_map_across() {
        let err = HostIoError(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(
            embedded_io::Error::kind(&err),
            embedded_io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = StdClock::new();
        let first = clock.now_micros();
        StdDelay.delay_ms(2);
        assert!(clock.now_micros() >= first + 2_000);
    }
}
