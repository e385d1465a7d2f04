//! # corpno-dl
//!
//! Downloader for the corporate number publication Web-API.
//!
//! ## Overview
//!
//! A query selects records by corporate number, change date, change period or
//! corporate name. Large result sets come back split into partitions; the
//! downloader requests them one after another with a fixed pause in between
//! and writes each partition to its own file:
//!
//! - **CSV** (Shift-JIS or UTF-8): a fixed column header followed by the data
//!   rows as received
//! - **XML**: the response re-indented
//!
//! ## Quick Start
//!
//! ```no_run
//! use corpno_dl::{Config, CorpNoDownloader, OutputFormat, Query, QueryMode, QueryOptions};
//! use corpno_dl::types::parse_iso_date;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.api_key = "your-application-id".to_string();
//!
//!     let query = Query::new(
//!         QueryMode::ByDate(parse_iso_date("2020-05-07")?),
//!         QueryOptions::default(),
//!         OutputFormat::CsvUtf8,
//!     );
//!
//!     let downloader = CorpNoDownloader::new(&config)?;
//!     let summary = downloader.download(&query).await?;
//!     for file in &summary.files {
//!         println!("{}", file.path.display());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Command line arguments
pub mod cli;
/// HTTP client for the Web-API
pub mod client;
/// Configuration types
pub mod config;
/// Response decoding (CSV and XML)
pub mod decode;
/// Partition paging
pub mod downloader;
/// Error types
pub mod error;
/// Log subscriber setup
pub mod logging;
/// Query building
pub mod query;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Output files
pub mod writer;

// Re-export commonly used types
pub use client::{ApiClient, ApiResponse, RegistryApi};
pub use config::Config;
pub use downloader::{CorpNoDownloader, DownloadSummary};
pub use error::{DecodeError, Error, Result, ValidationError};
pub use query::{ApiRequest, Query, QueryMode, QueryOptions};
pub use types::{OutputFormat, PartitionHeader, ResultRecord};
pub use writer::{OutputWriter, WrittenFile};
