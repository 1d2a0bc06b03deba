use core::fmt::Write as _;

use embedded_io::Write;

use super::{Record, RecordSink, StorageError};

pub const CSV_HEADER: &str = "Time,X,Y,Z,Zenith Angle,Azimuth Angle";

/// Rows are rendered in plain decimal, never exponent form, so extreme
/// magnitudes can exceed this and are rejected.
pub const CSV_ROW_CAPACITY: usize = 256;

/// Render one record as a CSV row, newline included.
pub fn format_row(record: &Record) -> Result<heapless::String<CSV_ROW_CAPACITY>, StorageError> {
    let mut row = heapless::String::new();
    writeln!(
        row,
        "{},{},{},{},{},{}",
        record.elapsed_secs,
        record.vector.x,
        record.vector.y,
        record.vector.z,
        record.angles.zenith_deg,
        record.angles.azimuth_deg,
    )
    .map_err(|_| StorageError::RowOverflow(CSV_ROW_CAPACITY))?;
    Ok(row)
}

/// Writes a header row on open and one text row per record. Every row is
/// flushed as soon as it is written.
pub struct CsvSink<W> {
    writer: W,
    rows: usize,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn open(&mut self) -> Result<(), StorageError> {
        self.writer
            .write_all(CSV_HEADER.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(StorageError::write)?;
        self.writer.flush().map_err(StorageError::flush)
    }

    fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        let row = format_row(record)?;
        self.writer
            .write_all(row.as_bytes())
            .map_err(StorageError::write)?;
        self.rows += 1;
        self.writer.flush().map_err(StorageError::flush)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.writer.flush().map_err(StorageError::flush)
    }
}
