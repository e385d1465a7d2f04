//! Core types for corpno-dl

use crate::error::{DecodeError, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column names of a corporate record, in API order
///
/// Written verbatim as the header row of every CSV output file.
pub const RECORD_COLUMNS: [&str; 30] = [
    "sequenceNumber",
    "corporateNumber",
    "process",
    "correct",
    "updateDate",
    "changeDate",
    "name",
    "nameImageId",
    "kind",
    "prefectureName",
    "cityName",
    "streetNumber",
    "addressImageId",
    "prefectureCode",
    "cityCode",
    "postCode",
    "addressOutside",
    "addressOutsideImageId",
    "closeDate",
    "closeCause",
    "successorCorporateNumber",
    "changeCause",
    "assignmentDate",
    "latest",
    "enName",
    "enPrefectureName",
    "enCityName",
    "enAddressOutside",
    "furigana",
    "hihyoji",
];

/// Response and output file format
///
/// The API encodes the format as a two-digit `type` code. The same choice
/// selects how the response is decoded and how the output file is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// CSV encoded as Shift-JIS (`01`)
    CsvShiftJis,
    /// CSV encoded as UTF-8 (`02`)
    #[default]
    CsvUtf8,
    /// XML encoded as UTF-8 (`12`)
    Xml,
}

impl OutputFormat {
    /// Wire code sent as the `type` parameter
    pub fn code(&self) -> &'static str {
        match self {
            OutputFormat::CsvShiftJis => "01",
            OutputFormat::CsvUtf8 => "02",
            OutputFormat::Xml => "12",
        }
    }

    /// Output file extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::CsvShiftJis | OutputFormat::CsvUtf8 => "csv",
            OutputFormat::Xml => "xml",
        }
    }

    /// Whether responses in this format are CSV
    pub fn is_csv(&self) -> bool {
        !matches!(self, OutputFormat::Xml)
    }

    /// Text encoding of both the response body and the output file
    pub fn encoding(&self) -> &'static encoding_rs::Encoding {
        match self {
            OutputFormat::CsvShiftJis => encoding_rs::SHIFT_JIS,
            OutputFormat::CsvUtf8 | OutputFormat::Xml => encoding_rs::UTF_8,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "01" => Ok(OutputFormat::CsvShiftJis),
            "02" => Ok(OutputFormat::CsvUtf8),
            "12" => Ok(OutputFormat::Xml),
            other => Err(ValidationError::UnknownFormat {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::CsvShiftJis => "CSV-ShiftJIS",
            OutputFormat::CsvUtf8 => "CSV-UTF8",
            OutputFormat::Xml => "XML",
        };
        f.write_str(name)
    }
}

/// Corporate kind filter (`kind` parameter)
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CorporateKind {
    /// National government agency (`01`)
    GovernmentAgency,
    /// Local government (`02`)
    LocalGovernment,
    /// Registered corporation (`03`)
    Corporation,
    /// Any other kind (`04`)
    Other,
}

impl CorporateKind {
    /// All kinds, the default filter set
    pub const ALL: [CorporateKind; 4] = [
        CorporateKind::GovernmentAgency,
        CorporateKind::LocalGovernment,
        CorporateKind::Corporation,
        CorporateKind::Other,
    ];

    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            CorporateKind::GovernmentAgency => "01",
            CorporateKind::LocalGovernment => "02",
            CorporateKind::Corporation => "03",
            CorporateKind::Other => "04",
        }
    }
}

impl FromStr for CorporateKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "01" => Ok(CorporateKind::GovernmentAgency),
            "02" => Ok(CorporateKind::LocalGovernment),
            "03" => Ok(CorporateKind::Corporation),
            "04" => Ok(CorporateKind::Other),
            other => Err(ValidationError::UnknownOption {
                option: "kind",
                value: other.to_string(),
                expected: "01, 02, 03, 04",
            }),
        }
    }
}

/// Name matching mode (`mode` parameter)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// Prefix match (`1`)
    #[default]
    Prefix,
    /// Partial match (`2`)
    Partial,
}

impl SearchMode {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            SearchMode::Prefix => "1",
            SearchMode::Partial => "2",
        }
    }
}

impl FromStr for SearchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(SearchMode::Prefix),
            "2" => Ok(SearchMode::Partial),
            other => Err(ValidationError::UnknownOption {
                option: "mode",
                value: other.to_string(),
                expected: "1, 2",
            }),
        }
    }
}

/// Name search target (`target` parameter)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchTarget {
    /// Fuzzy search (`1`)
    #[default]
    Fuzzy,
    /// Exact match (`2`)
    Exact,
    /// English name (`3`)
    English,
}

impl SearchTarget {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            SearchTarget::Fuzzy => "1",
            SearchTarget::Exact => "2",
            SearchTarget::English => "3",
        }
    }
}

impl FromStr for SearchTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(SearchTarget::Fuzzy),
            "2" => Ok(SearchTarget::Exact),
            "3" => Ok(SearchTarget::English),
            other => Err(ValidationError::UnknownOption {
                option: "target",
                value: other.to_string(),
                expected: "1, 2, 3",
            }),
        }
    }
}

/// A 13-digit corporate number
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorporateNumber(String);

impl CorporateNumber {
    /// Number of digits in a corporate number
    pub const LEN: usize = 13;

    /// Get the digits as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CorporateNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ValidationError::InvalidCorporateNumber {
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for CorporateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 2-digit prefecture code or 5-digit city code (`address` parameter)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaCode(String);

impl AreaCode {
    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AreaCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if matches!(s.len(), 2 | 5) && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ValidationError::InvalidAreaCode {
                value: s.to_string(),
            })
        }
    }
}

/// Parse a strict ISO calendar date (`YYYY-MM-DD`, zero padded)
///
/// chrono accepts unpadded months and days, so the shape is checked first.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        value: s.to_string(),
    };

    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

/// An inclusive date range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting a start after the end
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two ISO date strings
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }
}

/// Partition metadata from the first row or first elements of a response
///
/// Positions follow the API: last update date, total record count,
/// partition index (`divideNumber`) and partition count (`divideSize`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionHeader {
    /// Date the data set was last updated, as sent
    pub last_update_date: String,
    /// Total number of matching records, as sent
    pub count: String,
    /// Index of this partition (1-based)
    pub partition_index: u32,
    /// Number of partitions in the result set
    pub partition_count: u32,
}

impl PartitionHeader {
    /// Position of the partition index in the header
    pub const INDEX_POSITION: usize = 2;
    /// Position of the partition count in the header
    pub const COUNT_POSITION: usize = 3;

    /// Build a header from its raw fields
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, DecodeError> {
        let field = |position: usize| {
            fields
                .get(position)
                .map(|f| f.as_ref().trim().to_string())
                .ok_or(DecodeError::MissingHeaderField { position })
        };
        let number = |position: usize, name: &'static str| {
            let value = field(position)?;
            value
                .parse::<u32>()
                .map_err(|_| DecodeError::InvalidHeaderField { field: name, value })
        };

        Ok(Self {
            last_update_date: field(0).unwrap_or_default(),
            count: field(1).unwrap_or_default(),
            partition_index: number(Self::INDEX_POSITION, "divideNumber")?,
            partition_count: number(Self::COUNT_POSITION, "divideSize")?,
        })
    }
}

/// One corporate record with the fixed fields of the API contract
///
/// Serde names match [`RECORD_COLUMNS`] so a produced CSV file can be read back
/// with `csv::Reader::deserialize`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ResultRecord {
    pub sequence_number: String,
    pub corporate_number: String,
    pub process: String,
    pub correct: String,
    pub update_date: String,
    pub change_date: String,
    pub name: String,
    pub name_image_id: String,
    pub kind: String,
    pub prefecture_name: String,
    pub city_name: String,
    pub street_number: String,
    pub address_image_id: String,
    pub prefecture_code: String,
    pub city_code: String,
    pub post_code: String,
    pub address_outside: String,
    pub address_outside_image_id: String,
    pub close_date: String,
    pub close_cause: String,
    pub successor_corporate_number: String,
    pub change_cause: String,
    pub assignment_date: String,
    pub latest: String,
    pub en_name: String,
    pub en_prefecture_name: String,
    pub en_city_name: String,
    pub en_address_outside: String,
    pub furigana: String,
    pub hihyoji: String,
}

impl ResultRecord {
    /// Mutable slot for a column, `None` for names outside the contract
    pub fn field_mut(&mut self, column: &str) -> Option<&mut String> {
        let slot = match column {
            "sequenceNumber" => &mut self.sequence_number,
            "corporateNumber" => &mut self.corporate_number,
            "process" => &mut self.process,
            "correct" => &mut self.correct,
            "updateDate" => &mut self.update_date,
            "changeDate" => &mut self.change_date,
            "name" => &mut self.name,
            "nameImageId" => &mut self.name_image_id,
            "kind" => &mut self.kind,
            "prefectureName" => &mut self.prefecture_name,
            "cityName" => &mut self.city_name,
            "streetNumber" => &mut self.street_number,
            "addressImageId" => &mut self.address_image_id,
            "prefectureCode" => &mut self.prefecture_code,
            "cityCode" => &mut self.city_code,
            "postCode" => &mut self.post_code,
            "addressOutside" => &mut self.address_outside,
            "addressOutsideImageId" => &mut self.address_outside_image_id,
            "closeDate" => &mut self.close_date,
            "closeCause" => &mut self.close_cause,
            "successorCorporateNumber" => &mut self.successor_corporate_number,
            "changeCause" => &mut self.change_cause,
            "assignmentDate" => &mut self.assignment_date,
            "latest" => &mut self.latest,
            "enName" => &mut self.en_name,
            "enPrefectureName" => &mut self.en_prefecture_name,
            "enCityName" => &mut self.en_city_name,
            "enAddressOutside" => &mut self.en_address_outside,
            "furigana" => &mut self.furigana,
            "hihyoji" => &mut self.hihyoji,
            _ => return None,
        };
        Some(slot)
    }

    /// Field values in [`RECORD_COLUMNS`] order
    pub fn values(&self) -> [&str; 30] {
        [
            self.sequence_number.as_str(),
            self.corporate_number.as_str(),
            self.process.as_str(),
            self.correct.as_str(),
            self.update_date.as_str(),
            self.change_date.as_str(),
            self.name.as_str(),
            self.name_image_id.as_str(),
            self.kind.as_str(),
            self.prefecture_name.as_str(),
            self.city_name.as_str(),
            self.street_number.as_str(),
            self.address_image_id.as_str(),
            self.prefecture_code.as_str(),
            self.city_code.as_str(),
            self.post_code.as_str(),
            self.address_outside.as_str(),
            self.address_outside_image_id.as_str(),
            self.close_date.as_str(),
            self.close_cause.as_str(),
            self.successor_corporate_number.as_str(),
            self.change_cause.as_str(),
            self.assignment_date.as_str(),
            self.latest.as_str(),
            self.en_name.as_str(),
            self.en_prefecture_name.as_str(),
            self.en_city_name.as_str(),
            self.en_address_outside.as_str(),
            self.furigana.as_str(),
            self.hihyoji.as_str(),
        ]
    }
}
