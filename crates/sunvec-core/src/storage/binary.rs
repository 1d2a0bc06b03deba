use embedded_io::Write;
use log::error;

use super::{Record, RecordSink, StorageError};

/// Upper bound on one encoded frame: six f64 fields plus COBS overhead.
pub const MAX_FRAME_LEN: usize = 64;

/// Writes each record as a postcard-encoded, COBS-framed message.
///
/// Frames end with `0x00`, so a reader can resynchronise after a torn write
/// by skipping to the next zero byte. There is no header. Each frame is
/// flushed as soon as it is written.
pub struct PostcardSink<W> {
    writer: W,
    frames: usize,
}

impl<W: Write> PostcardSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for PostcardSink<W> {
    fn open(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let frame = postcard::to_slice_cobs(record, &mut buffer).map_err(|e| {
            error!("Failed to encode record: {:?}", e);
            StorageError::Encode
        })?;
        self.writer.write_all(frame).map_err(StorageError::write)?;
        self.frames += 1;
        self.writer.flush().map_err(StorageError::flush)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.writer.flush().map_err(StorageError::flush)
    }
}

/// Decode one COBS frame in place, terminator included or not.
pub fn decode_frame(frame: &mut [u8]) -> Result<Record, StorageError> {
    postcard::from_bytes_cobs(frame).map_err(|e| {
        error!("Failed to decode record frame: {:?}", e);
        StorageError::Encode
    })
}
