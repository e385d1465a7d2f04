//! Response decoding.
//!
//! Both formats carry partition metadata ahead of the data:
//! - [`csv`]: the first row is `lastUpdateDate,count,divideNumber,divideSize`
//! - [`xml`]: the first four children of the root hold the same values
//!
//! Data records are exposed as single-pass iterators and are never buffered
//! into a collection by the decoder.

pub mod csv;
pub mod xml;

pub use self::csv::{CsvPartition, CsvRows};
pub use self::xml::{XmlPartition, XmlRecords};

use crate::error::DecodeError;
use crate::types::{OutputFormat, PartitionHeader};

/// A decoded partition in either format
#[derive(Debug)]
pub enum DecodedResponse {
    /// CSV body
    Csv(CsvPartition),
    /// XML body
    Xml(XmlPartition),
}

impl DecodedResponse {
    /// Partition metadata of this response
    pub fn header(&self) -> &PartitionHeader {
        match self {
            DecodedResponse::Csv(partition) => partition.header(),
            DecodedResponse::Xml(partition) => partition.header(),
        }
    }
}

/// Decode a response body for the requested format
pub fn decode(body: &[u8], format: OutputFormat) -> Result<DecodedResponse, DecodeError> {
    let text = decode_text(body, format)?;
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    if format.is_csv() {
        CsvPartition::parse(text).map(DecodedResponse::Csv)
    } else {
        XmlPartition::parse(&text).map(DecodedResponse::Xml)
    }
}

/// Decode body bytes with the encoding of the format, dropping a BOM
pub fn decode_text(body: &[u8], format: OutputFormat) -> Result<String, DecodeError> {
    let encoding = format.encoding();
    let (text, had_errors) = encoding.decode_with_bom_removal(body);
    if had_errors {
        return Err(DecodeError::Encoding {
            encoding: encoding.name(),
        });
    }
    Ok(text.into_owned())
}
