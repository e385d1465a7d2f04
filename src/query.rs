//! Request building for the three search endpoints.
//!
//! A [`Query`] is resolved once from user input and never re-inspected for
//! "which selector was given": the [`QueryMode`] variant decides the endpoint
//! and the parameter family, and [`QueryOptions`] only contributes the fields
//! that belong to that variant.

use crate::error::ValidationError;
use crate::types::{
    AreaCode, CorporateKind, CorporateNumber, DateRange, OutputFormat, SearchMode, SearchTarget,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Search endpoint of the API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Lookup by corporate number
    Num,
    /// Changes within a date range
    Diff,
    /// Search by corporate name
    Name,
}

impl Endpoint {
    /// Path segment relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Num => "num",
            Endpoint::Diff => "diff",
            Endpoint::Name => "name",
        }
    }
}

/// Which records to retrieve
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum QueryMode {
    /// A single corporation by number
    ByNumber(CorporateNumber),
    /// Changes on a single day
    ByDate(NaiveDate),
    /// Changes within a period
    ByPeriod(DateRange),
    /// Corporations matching a name
    ByName(String),
}

impl QueryMode {
    /// Endpoint serving this mode
    pub fn endpoint(&self) -> Endpoint {
        match self {
            QueryMode::ByNumber(_) => Endpoint::Num,
            QueryMode::ByDate(_) | QueryMode::ByPeriod(_) => Endpoint::Diff,
            QueryMode::ByName(_) => Endpoint::Name,
        }
    }

    /// Whether the endpoint for this mode pages its results
    pub fn is_partitioned(&self) -> bool {
        !matches!(self, QueryMode::ByNumber(_))
    }
}

/// Per-mode auxiliary options
///
/// Fields that do not apply to the selected [`QueryMode`] are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryOptions {
    /// Include historical information (number lookup)
    pub history: bool,
    /// Restrict to a prefecture or city (date, period and name search)
    pub area: Option<AreaCode>,
    /// Corporate kinds to include (date, period and name search)
    pub kinds: BTreeSet<CorporateKind>,
    /// Prefix or partial match (name search)
    pub mode: SearchMode,
    /// Name field searched (name search)
    pub target: SearchTarget,
    /// Also match former names (name search)
    pub change: bool,
    /// Include closed corporations (name search)
    pub close: bool,
    /// Restrict the name search to changes within a period
    pub name_range: Option<DateRange>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            history: false,
            area: None,
            kinds: CorporateKind::ALL.into_iter().collect(),
            mode: SearchMode::default(),
            target: SearchTarget::default(),
            change: false,
            close: true,
            name_range: None,
        }
    }
}

/// Flat, ordered request parameters
///
/// Multi-valued parameters (`kind`) appear once per value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    /// Append a parameter
    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.0.push((key, value.into()));
    }

    /// First value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for a key, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| *k == key)
    }

    /// Parameters as key/value pairs
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// A built request: endpoint plus parameters, without credentials
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    /// Endpoint to call
    pub endpoint: Endpoint,
    /// Query parameters
    pub params: QueryParams,
}

/// A fully validated download request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    /// Selected search
    pub mode: QueryMode,
    /// Auxiliary options
    pub options: QueryOptions,
    /// Response and output format
    pub format: OutputFormat,
    /// Fetch only this partition instead of paging through all of them
    pub partition: Option<u32>,
}

/// Arguments that identify a result set; the partition pin is left out so every
/// partition of one run shares the same hash.
#[derive(Serialize)]
struct ArgumentSet<'a> {
    mode: &'a QueryMode,
    options: &'a QueryOptions,
    format: &'a str,
}

impl Query {
    /// Create a query that pages through all partitions
    pub fn new(mode: QueryMode, options: QueryOptions, format: OutputFormat) -> Self {
        Self {
            mode,
            options,
            format,
            partition: None,
        }
    }

    /// Pin the query to a single partition
    pub fn with_partition(mut self, partition: u32) -> Result<Self, ValidationError> {
        if partition == 0 {
            return Err(ValidationError::InvalidPartition);
        }
        self.partition = Some(partition);
        Ok(self)
    }

    /// Check option combinations that cannot be expressed by the types alone
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.partition.is_some() && !self.mode.is_partitioned() {
            return Err(ValidationError::PartitionNotSupported);
        }
        match &self.mode {
            QueryMode::ByName(name) if name.trim().is_empty() => {
                return Err(ValidationError::EmptyName);
            }
            QueryMode::ByNumber(_) => return Ok(()),
            _ => {}
        }
        if self.options.kinds.is_empty() {
            return Err(ValidationError::EmptyKinds);
        }
        Ok(())
    }

    /// Partition requested first
    pub fn first_partition(&self) -> u32 {
        self.partition.unwrap_or(1)
    }

    /// Build the request for a partition
    pub fn request(&self, partition: u32) -> ApiRequest {
        ApiRequest {
            endpoint: self.mode.endpoint(),
            params: self.params(partition),
        }
    }

    /// Build the parameter set for a partition
    pub fn params(&self, partition: u32) -> QueryParams {
        let opts = &self.options;
        let mut params = QueryParams::default();
        params.push("type", self.format.code());

        match &self.mode {
            QueryMode::ByNumber(number) => {
                params.push("number", number.as_str());
                params.push("history", flag(opts.history));
            }
            QueryMode::ByDate(date) => {
                params.push("from", date.to_string());
                params.push("to", date.to_string());
                self.push_kinds(&mut params);
                params.push("divide", partition.to_string());
                self.push_area(&mut params);
            }
            QueryMode::ByPeriod(range) => {
                params.push("from", range.start.to_string());
                params.push("to", range.end.to_string());
                self.push_kinds(&mut params);
                params.push("divide", partition.to_string());
                self.push_area(&mut params);
            }
            QueryMode::ByName(name) => {
                params.push("name", name.as_str());
                params.push("mode", opts.mode.code());
                params.push("target", opts.target.code());
                self.push_kinds(&mut params);
                params.push("change", flag(opts.change));
                params.push("close", flag(opts.close));
                params.push("divide", partition.to_string());
                if let Some(range) = &opts.name_range {
                    params.push("from", range.start.to_string());
                    params.push("to", range.end.to_string());
                }
                self.push_area(&mut params);
            }
        }

        params
    }

    fn push_kinds(&self, params: &mut QueryParams) {
        for kind in &self.options.kinds {
            params.push("kind", kind.code());
        }
    }

    fn push_area(&self, params: &mut QueryParams) {
        if let Some(area) = &self.options.area {
            params.push("address", area.as_str());
        }
    }

    /// Human-readable part of output filenames
    ///
    /// Corporate number, compact date, compact date range or the raw name.
    pub fn discriminator(&self) -> String {
        match &self.mode {
            QueryMode::ByNumber(number) => number.to_string(),
            QueryMode::ByDate(date) => compact(date),
            QueryMode::ByPeriod(range) => {
                format!("{}-{}", compact(&range.start), compact(&range.end))
            }
            QueryMode::ByName(name) => name.clone(),
        }
    }

    /// MD5 of every argument except the partition pin, as lowercase hex
    pub fn argument_hash(&self) -> String {
        let args = ArgumentSet {
            mode: &self.mode,
            options: &self.options,
            format: self.format.code(),
        };
        // Serializing plain data into a String cannot fail.
        let canonical = serde_json::to_string(&args).unwrap_or_default();
        format!("{:x}", md5::compute(canonical.as_bytes()))
    }
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn compact(date: &NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
