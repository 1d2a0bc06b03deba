//! Time-ordered record streams.
//!
//! The sample loop owns a [`RecordSink`] for one run: `open` once, `append`
//! one [`Record`] per cycle, `close` on every exit path. Two sinks are
//! provided, both writing through `embedded-io`:
//!
//! - [`CsvSink`]: a header row followed by one text row per record
//! - [`PostcardSink`]: postcard-encoded, COBS-framed binary records

mod binary;
mod csv;

pub use binary::*;
pub use csv::*;

use log::error;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::estimation::{AnglePair, DirectionVector};

/// One sampling cycle's output. Never modified after creation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// Seconds since the run started.
    pub elapsed_secs: f64,
    pub vector: DirectionVector,
    pub angles: AnglePair,
}

impl Record {
    pub const fn new(elapsed_secs: f64, vector: DirectionVector, angles: AnglePair) -> Self {
        Self {
            elapsed_secs,
            vector,
            angles,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("record sink write failed: {0:?}")]
    Write(embedded_io::ErrorKind),
    #[error("record sink flush failed: {0:?}")]
    Flush(embedded_io::ErrorKind),
    #[error("record encoding failed")]
    Encode,
    #[error("CSV row exceeds {0} bytes")]
    RowOverflow(usize),
}

impl StorageError {
    fn write<E: embedded_io::Error>(e: E) -> Self {
        error!("Record sink write failed: {:?}", e);
        Self::Write(e.kind())
    }

    fn flush<E: embedded_io::Error>(e: E) -> Self {
        error!("Record sink flush failed: {:?}", e);
        Self::Flush(e.kind())
    }
}

/// Append-only destination for the records of one run.
pub trait RecordSink {
    /// Called once before the first record.
    fn open(&mut self) -> Result<(), StorageError>;

    fn append(&mut self, record: &Record) -> Result<(), StorageError>;

    /// Called exactly once when the run ends, successfully or not.
    fn close(&mut self) -> Result<(), StorageError>;
}
