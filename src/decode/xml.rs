//! XML response bodies.
//!
//! The root element holds four metadata children followed by one child per
//! corporation:
//!
//! ```xml
//! <corporations>
//!   <lastUpdateDate>2020-05-07</lastUpdateDate>
//!   <count>2</count>
//!   <divideNumber>1</divideNumber>
//!   <divideSize>1</divideSize>
//!   <corporation>...</corporation>
//! </corporations>
//! ```

use crate::error::DecodeError;
use crate::types::{PartitionHeader, ResultRecord};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use tracing::debug;

/// Number of metadata children ahead of the records
pub const HEADER_ELEMENTS: usize = 4;

/// Indent width of re-serialized documents
const INDENT: usize = 3;

/// An XML partition, re-serialized with consistent indentation
#[derive(Debug)]
pub struct XmlPartition {
    header: PartitionHeader,
    document: String,
}

impl XmlPartition {
    /// Parse the header and re-serialize the document
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let header = read_header(text)?;
        let document = pretty_print(text)?;
        Ok(Self { header, document })
    }

    /// Partition metadata
    pub fn header(&self) -> &PartitionHeader {
        &self.header
    }

    /// Indented document text, UTF-8, with an XML declaration
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Iterate the corporation records of the document
    pub fn records(&self) -> XmlRecords<'_> {
        XmlRecords::new(&self.document)
    }
}

fn reader(text: &str) -> Reader<&[u8]> {
    Reader::from_str(text)
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

/// Read the text of the first four root children
fn read_header(text: &str) -> Result<PartitionHeader, DecodeError> {
    let mut reader = reader(text);
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut fields: Vec<String> = Vec::with_capacity(HEADER_ELEMENTS);
    let mut current: Option<String> = None;

    while fields.len() < HEADER_ELEMENTS {
        match reader.read_event()? {
            Event::Start(_) => {
                depth += 1;
                match depth {
                    1 => seen_root = true,
                    2 => current = Some(String::new()),
                    _ => {}
                }
            }
            Event::Empty(_) => match depth {
                0 => {
                    seen_root = true;
                    break;
                }
                1 => fields.push(String::new()),
                _ => {}
            },
            Event::Text(t) if depth == 2 => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) if depth == 2 => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 2
                    && let Some(value) = current.take()
                {
                    fields.push(value.trim().to_string());
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Event::Eof if depth > 0 => return Err(DecodeError::Truncated { open: depth }),
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(DecodeError::MissingRoot);
    }
    debug!(header = ?fields, "header info");
    PartitionHeader::from_fields(&fields)
}

/// Re-serialize a document with 3-space indentation
///
/// Whitespace-only text between elements is dropped and re-generated; text
/// inside leaf elements is kept as is. Empty elements are written in
/// self-closing form, and a UTF-8 declaration is added when the source has
/// none. Input that ends with elements still open is rejected.
pub fn pretty_print(text: &str) -> Result<String, DecodeError> {
    let mut reader = reader(text);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    let mut declared = false;
    let mut depth = 0usize;
    let mut root_closed = false;
    // Start tag held back one event so `<a></a>` becomes `<a/>`, together with
    // any whitespace-only text that directly follows it.
    let mut pending: Option<BytesStart<'_>> = None;
    let mut pending_blank: Option<BytesText<'_>> = None;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof if depth > 0 => return Err(DecodeError::Truncated { open: depth }),
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                root_closed |= depth == 0;
            }
            Event::Empty(_) => root_closed |= depth == 0,
            _ => {}
        }

        if let Event::Text(t) = &event
            && is_blank(t)
        {
            if pending.is_some() && pending_blank.is_none() {
                pending_blank = Some(t.clone().into_owned());
            }
            continue;
        }

        if !declared {
            declared = true;
            if !matches!(event, Event::Decl(_)) {
                write(
                    &mut writer,
                    Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
                )?;
            }
        }

        if let Some(start) = pending.take() {
            let blank = pending_blank.take();
            if matches!(event, Event::End(_)) {
                match blank {
                    Some(text) => {
                        write(&mut writer, Event::Start(start))?;
                        write(&mut writer, Event::Text(text))?;
                        write(&mut writer, event)?;
                    }
                    None => write(&mut writer, Event::Empty(start))?,
                }
                continue;
            }
            write(&mut writer, Event::Start(start))?;
        }

        match event {
            Event::Start(start) => pending = Some(start),
            other => write(&mut writer, other)?,
        }
    }

    if !root_closed {
        return Err(DecodeError::MissingRoot);
    }

    let mut document = String::from_utf8(writer.into_inner())
        .map_err(|_| DecodeError::Encoding { encoding: "UTF-8" })?;
    document.push('\n');
    Ok(document)
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DecodeError> {
    writer
        .write_event(event)
        .map_err(|e| DecodeError::XmlWrite(e.to_string()))
}

/// Single-pass iterator over the corporation records of a document
pub struct XmlRecords<'a> {
    reader: Reader<&'a [u8]>,
    depth: usize,
    children: usize,
    current: Option<ResultRecord>,
    field: Option<String>,
    text: String,
    done: bool,
}

impl std::fmt::Debug for XmlRecords<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlRecords")
            .field("depth", &self.depth)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

impl<'a> XmlRecords<'a> {
    /// Iterate the records of a document
    pub fn new(document: &'a str) -> Self {
        Self {
            reader: reader(document),
            depth: 0,
            children: 0,
            current: None,
            field: None,
            text: String::new(),
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<ResultRecord>, DecodeError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(start) => {
                    self.depth += 1;
                    match self.depth {
                        2 => {
                            self.children += 1;
                            if self.children > HEADER_ELEMENTS {
                                self.current = Some(ResultRecord::default());
                            }
                        }
                        3 => {
                            self.field = Some(local_name(&start));
                            self.text.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(_) if self.depth == 1 => {
                    self.children += 1;
                    if self.children > HEADER_ELEMENTS {
                        return Ok(Some(ResultRecord::default()));
                    }
                }
                Event::Text(t) if self.depth == 3 => self.text.push_str(&t.unescape()?),
                Event::CData(c) if self.depth == 3 => {
                    self.text.push_str(&String::from_utf8_lossy(&c));
                }
                Event::End(_) => {
                    let closing = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    match closing {
                        3 => {
                            if let (Some(record), Some(field)) =
                                (self.current.as_mut(), self.field.take())
                                && let Some(slot) = record.field_mut(&field)
                            {
                                *slot = std::mem::take(&mut self.text);
                            }
                        }
                        2 => {
                            if let Some(record) = self.current.take() {
                                return Ok(Some(record));
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for XmlRecords<'_> {
    type Item = Result<ResultRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
