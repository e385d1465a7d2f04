//! Partition paging: fetch, decode and write until the result set is complete.
//!
//! A run moves through these states:
//!
//! ```text
//! Init -> Fetching(1) -> Writing(1) -> [delay] -> Fetching(2) -> ... -> Done
//!              \______________\________________________________________> Failed
//! ```
//!
//! The number of partitions is taken from the first response. A pinned
//! partition is fetched on its own and never continues to the next one. Any
//! error ends the run; files written so far stay on disk.

use crate::client::{ApiClient, RegistryApi};
use crate::config::Config;
use crate::decode::{self, DecodedResponse};
use crate::error::Result;
use crate::query::Query;
use crate::types::PartitionHeader;
use crate::writer::{OutputWriter, WrittenFile};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of a completed run
#[derive(Clone, Debug, Default)]
pub struct DownloadSummary {
    /// Files written, in request order
    pub files: Vec<WrittenFile>,
    /// Partition count reported by the first response
    pub partition_count: u32,
    /// Header of the last response
    pub last_header: Option<PartitionHeader>,
}

impl DownloadSummary {
    /// Number of partitions fetched
    pub fn partitions_fetched(&self) -> usize {
        self.files.len()
    }

    /// Total records written across all files
    pub fn records(&self) -> usize {
        self.files.iter().map(|f| f.records).sum()
    }
}

enum State {
    Init,
    Fetching { partition: u32 },
    Writing { partition: u32, response: DecodedResponse },
    Done,
}

/// Decide which partition follows `current`
///
/// `None` when a partition was pinned or `current` is the last one.
pub fn next_partition(pinned: Option<u32>, current: u32, partition_count: u32) -> Option<u32> {
    if pinned.is_some() || current >= partition_count {
        None
    } else {
        Some(current + 1)
    }
}

/// Drives one query from the first request to the last written file
pub struct CorpNoDownloader {
    api: Arc<dyn RegistryApi>,
    writer: OutputWriter,
    partition_delay: Duration,
}

impl std::fmt::Debug for CorpNoDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpNoDownloader")
            .field("writer", &self.writer)
            .field("partition_delay", &self.partition_delay)
            .finish_non_exhaustive()
    }
}

impl CorpNoDownloader {
    /// Create a downloader talking to the configured API
    ///
    /// # Errors
    /// Returns an error if the configuration is incomplete or the HTTP client
    /// cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::new(&config.api)?;
        Ok(Self::with_api(
            Arc::new(api),
            OutputWriter::new(&config.output.output_dir),
            config.pagination.partition_delay,
        ))
    }

    /// Create a downloader from its parts
    pub fn with_api(
        api: Arc<dyn RegistryApi>,
        writer: OutputWriter,
        partition_delay: Duration,
    ) -> Self {
        Self {
            api,
            writer,
            partition_delay,
        }
    }

    /// Replace the output writer (e.g. to enable XML to CSV conversion)
    pub fn set_writer(&mut self, writer: OutputWriter) {
        self.writer = writer;
    }

    /// Pause between partition requests
    pub fn partition_delay(&self) -> Duration {
        self.partition_delay
    }

    /// Fetch and write every partition of a query
    ///
    /// # Errors
    /// Returns the first validation, transport, decode or write error.
    pub async fn download(&self, query: &Query) -> Result<DownloadSummary> {
        query.validate()?;

        let mut summary = DownloadSummary::default();
        let mut state = State::Init;

        loop {
            state = match state {
                State::Init => State::Fetching {
                    partition: query.first_partition(),
                },
                State::Fetching { partition } => match self.fetch(query, partition).await {
                    Ok(response) => State::Writing {
                        partition,
                        response,
                    },
                    Err(e) => {
                        error!(partition, error = %e, "download failed");
                        return Err(e);
                    }
                },
                State::Writing {
                    partition,
                    response,
                } => {
                    let header = response.header().clone();
                    if summary.files.is_empty() {
                        summary.partition_count = header.partition_count;
                    } else if header.partition_count != summary.partition_count {
                        warn!(
                            expected = summary.partition_count,
                            reported = header.partition_count,
                            "partition count changed between requests"
                        );
                    }

                    let file = match self.writer.write(query, partition, response).await {
                        Ok(file) => file,
                        Err(e) => {
                            error!(partition, error = %e, "download failed");
                            return Err(e);
                        }
                    };
                    summary.files.push(file);
                    summary.last_header = Some(header);

                    match next_partition(query.partition, partition, summary.partition_count) {
                        Some(next) => {
                            debug!(
                                delay_ms = self.partition_delay.as_millis() as u64,
                                next, "waiting before next partition"
                            );
                            tokio::time::sleep(self.partition_delay).await;
                            State::Fetching { partition: next }
                        }
                        None => State::Done,
                    }
                }
                State::Done => {
                    info!(
                        partitions = summary.partitions_fetched(),
                        records = summary.records(),
                        "download complete"
                    );
                    return Ok(summary);
                }
            };
        }
    }

    async fn fetch(&self, query: &Query, partition: u32) -> Result<DecodedResponse> {
        let request = query.request(partition);
        debug!(
            endpoint = request.endpoint.path(),
            payload = ?request.params.pairs(),
            "fetching partition {}",
            partition
        );
        let response = self.api.fetch(&request).await?;
        let decoded = decode::decode(&response.body, query.format)?;
        debug!(header = ?decoded.header(), "decoded partition {}", partition);
        Ok(decoded)
    }
}
