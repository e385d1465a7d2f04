//! Output files.
//!
//! One file per partition, named
//! `result_{discriminator}_{partition}_{hash}.{ext}`. CSV output always starts
//! with the fixed column header of [`RECORD_COLUMNS`], followed by the data
//! rows exactly as received.

use crate::decode::{CsvRows, DecodedResponse, XmlPartition};
use crate::error::{DecodeError, Error, Result};
use crate::query::Query;
use crate::types::{OutputFormat, RECORD_COLUMNS, ResultRecord};
use crate::utils::sanitize_file_component;
use csv::{StringRecord, Terminator, WriterBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A file produced for one partition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenFile {
    /// Location of the file
    pub path: PathBuf,
    /// Number of data records written (excluding the header)
    pub records: usize,
}

/// Writes decoded partitions into an output directory
#[derive(Clone, Debug)]
pub struct OutputWriter {
    output_dir: PathBuf,
    xml_to_csv: bool,
}

impl OutputWriter {
    /// Create a writer for a directory (created on first write)
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            xml_to_csv: false,
        }
    }

    /// Write XML responses as CSV with the fixed header instead of XML
    pub fn with_xml_to_csv(mut self, enabled: bool) -> Self {
        self.xml_to_csv = enabled;
        self
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extension used for a format
    fn extension(&self, format: OutputFormat) -> &'static str {
        if self.xml_to_csv && format == OutputFormat::Xml {
            "csv"
        } else {
            format.extension()
        }
    }

    /// Filename for a partition of a query
    pub fn file_name(&self, query: &Query, partition: u32) -> String {
        format!(
            "result_{}_{}_{}.{}",
            sanitize_file_component(&query.discriminator()),
            partition,
            query.argument_hash(),
            self.extension(query.format)
        )
    }

    /// Write one decoded partition
    ///
    /// # Errors
    /// Returns a decode error if a data row is malformed, or a write error if
    /// the directory or file cannot be created.
    pub async fn write(
        &self,
        query: &Query,
        partition: u32,
        response: DecodedResponse,
    ) -> Result<WrittenFile> {
        let (bytes, records) = match response {
            DecodedResponse::Csv(csv) => {
                let (text, records) = render_csv_rows(csv.into_rows())?;
                (encode_output(&text, query.format), records)
            }
            DecodedResponse::Xml(xml) if self.xml_to_csv => {
                let (text, records) = render_xml_as_csv(&xml)?;
                (text.into_bytes(), records)
            }
            DecodedResponse::Xml(xml) => {
                let records = xml.records().count();
                (xml.document().as_bytes().to_vec(), records)
            }
        };

        let path = self.output_dir.join(self.file_name(query, partition));
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| Error::Write {
                path: self.output_dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), records, "saved partition {}", partition);
        Ok(WrittenFile { path, records })
    }
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| DecodeError::Encoding { encoding: "UTF-8" }.into())
}

/// Fixed header followed by the rows verbatim
fn render_csv_rows(rows: CsvRows) -> Result<(String, usize)> {
    let mut writer = csv_writer();
    writer.write_record(RECORD_COLUMNS)?;

    let mut records = 0;
    for row in rows {
        writer.write_record(&row?)?;
        records += 1;
    }
    Ok((finish(writer)?, records))
}

/// Fixed header followed by one row per XML record, in column order
fn render_xml_as_csv(xml: &XmlPartition) -> Result<(String, usize)> {
    let mut writer = csv_writer();
    writer.write_record(RECORD_COLUMNS)?;

    let mut records = 0;
    for record in xml.records() {
        writer.write_record(record?.values())?;
        records += 1;
    }
    Ok((finish(writer)?, records))
}

/// Encode output text for the file encoding of a format
fn encode_output(text: &str, format: OutputFormat) -> Vec<u8> {
    let encoding = format.encoding();
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        warn!(
            encoding = encoding.name(),
            "output contains characters outside the file encoding; written as numeric character references"
        );
    }
    bytes.into_owned()
}

/// Read a produced CSV file back: the header row and the typed records
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid in the encoding of
/// `format`, or a row does not match the record schema.
pub fn read_csv_output(
    path: &Path,
    format: OutputFormat,
) -> Result<(StringRecord, Vec<ResultRecord>)> {
    let bytes = std::fs::read(path)?;
    let text = crate::decode::decode_text(&bytes, format)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = reader.headers()?.clone();
    let records = reader
        .deserialize::<ResultRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((header, records))
}
