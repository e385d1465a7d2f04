//! Error types for corpno-dl
//!
//! Every failure in a run is fatal. The variants group into the classes the
//! binary reports on exit:
//! - validation of user input (before any request is sent)
//! - transport failures (non-2xx responses and network errors)
//! - decoding of response bodies
//! - configuration and local I/O

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for corpno-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for corpno-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid query arguments
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_key")
        key: Option<String>,
    },

    /// The API answered with a non-success status
    #[error("HTTP error: status code {status}; response: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as text (lossy)
        body: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration file could not be parsed
    #[error("failed to parse configuration file {path}: {source}")]
    ConfigParse {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },

    /// Writing an output file failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path of the output file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error while building an output file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error was raised before any request reached the network
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Config { .. } | Error::ConfigParse { .. }
        )
    }

    /// Whether this error came from talking to the API
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Status { .. } | Error::Network(_))
    }

    /// Process exit code for this error
    ///
    /// Validation and configuration errors exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        if self.is_validation() { 2 } else { 1 }
    }
}

/// Invalid arguments detected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Corporate number is not exactly 13 decimal digits
    #[error("corporate number must be a 13-digit integer, got {value:?}")]
    InvalidCorporateNumber {
        /// The rejected input
        value: String,
    },

    /// Date is not a strict ISO calendar date
    #[error("date must be in ISO format (YYYY-MM-DD), got {value:?}")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// Start date is after end date
    #[error("start date {start} is after end date {end}")]
    InvertedRange {
        /// Start of the range
        start: String,
        /// End of the range
        end: String,
    },

    /// Area code is not a 2-digit prefecture or 5-digit city code
    #[error("area code must be a 2-digit or 5-digit integer, got {value:?}")]
    InvalidAreaCode {
        /// The rejected input
        value: String,
    },

    /// Unknown output format code
    #[error("invalid encoding type: {value:?}. it must be \"01\", \"02\" or \"12\"")]
    UnknownFormat {
        /// The rejected input
        value: String,
    },

    /// Unknown code for an enumerated option
    #[error("invalid value {value:?} for --{option}; expected one of {expected}")]
    UnknownOption {
        /// Option name without leading dashes
        option: &'static str,
        /// The rejected input
        value: String,
        /// Human-readable list of accepted values
        expected: &'static str,
    },

    /// Search name is empty
    #[error("corporate name must not be empty")]
    EmptyName,

    /// Kind filter set is empty
    #[error("at least one corporate kind must be selected")]
    EmptyKinds,

    /// Partition pin is zero
    #[error("partition number must be 1 or greater")]
    InvalidPartition,

    /// A partition was pinned for a query that is never partitioned
    #[error("--divide cannot be used with a corporate number lookup")]
    PartitionNotSupported,

    /// None or several of the exclusive query selectors were given
    #[error("exactly one of --corpno, --date, --period or --name must be set")]
    QuerySelector,
}

/// Malformed response bodies
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Response body is empty
    #[error("response body is empty")]
    Empty,

    /// A header field is missing
    #[error("response header has no field at position {position}")]
    MissingHeaderField {
        /// Zero-based position of the field
        position: usize,
    },

    /// A header field is not a number
    #[error("response header field {field} is not a number: {value:?}")]
    InvalidHeaderField {
        /// Field name in the API contract
        field: &'static str,
        /// The raw value
        value: String,
    },

    /// Body is not valid text in the expected encoding
    #[error("response body is not valid {encoding}")]
    Encoding {
        /// Name of the expected encoding
        encoding: &'static str,
    },

    /// CSV body could not be parsed
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// XML body could not be parsed
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML document could not be re-serialized
    #[error("failed to re-serialize XML: {0}")]
    XmlWrite(String),

    /// XML document has no root element
    #[error("XML document has no root element")]
    MissingRoot,

    /// XML document ends before all elements are closed
    #[error("XML document ends with {open} unclosed element(s)")]
    Truncated {
        /// Elements still open at end of input
        open: usize,
    },

    /// CSV body ends inside a quoted field
    #[error("malformed CSV: quoted field is not terminated")]
    UnterminatedQuote,
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Decode(DecodeError::Xml(e))
    }
}
