//! CSV response bodies.

use crate::error::DecodeError;
use crate::types::PartitionHeader;
use ::csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::io::Cursor;
use tracing::debug;

/// A CSV partition: metadata row plus unread data rows
#[derive(Debug)]
pub struct CsvPartition {
    header: PartitionHeader,
    rows: CsvRows,
}

impl CsvPartition {
    /// Parse the metadata row and position the reader on the first data row
    pub fn parse(text: String) -> Result<Self, DecodeError> {
        // Escaped quotes come in pairs, so an odd count means a cut-off field.
        if text.bytes().filter(|&b| b == b'"').count() % 2 == 1 {
            return Err(DecodeError::UnterminatedQuote);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(Cursor::new(text.into_bytes()));

        let mut first = StringRecord::new();
        if !reader.read_record(&mut first)? {
            return Err(DecodeError::Empty);
        }
        debug!(header = ?first, "header info");
        let fields: Vec<&str> = first.iter().collect();
        let header = PartitionHeader::from_fields(&fields)?;

        Ok(Self {
            header,
            rows: CsvRows(reader.into_records()),
        })
    }

    /// Partition metadata
    pub fn header(&self) -> &PartitionHeader {
        &self.header
    }

    /// Consume the partition, yielding data rows in order
    pub fn into_rows(self) -> CsvRows {
        self.rows
    }
}

/// Single-pass iterator over the data rows of a CSV partition
pub struct CsvRows(StringRecordsIntoIter<Cursor<Vec<u8>>>);

impl std::fmt::Debug for CsvRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRows").finish_non_exhaustive()
    }
}

impl Iterator for CsvRows {
    type Item = Result<StringRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|row| row.map_err(DecodeError::from))
    }
}
