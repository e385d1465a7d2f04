//! Command line arguments.
//!
//! Exactly one of `--corpno`, `--date`, `--period` or `--name` selects the
//! search. Everything is parsed as text by clap and validated in
//! [`Args::to_query`], so bad values surface as [`ValidationError`]s before
//! any request is made.

use crate::config::{Config, DEFAULT_PROFILE};
use crate::error::ValidationError;
use crate::query::{Query, QueryMode, QueryOptions};
use crate::types::{
    AreaCode, CorporateKind, CorporateNumber, DateRange, OutputFormat, SearchMode, SearchTarget,
    parse_iso_date,
};
use clap::{ArgAction, ArgGroup, Parser};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Download corporate records from the corporate number Web-API
#[derive(Debug, Parser)]
#[command(name = "corpno-dl", version, about)]
#[command(group(
    ArgGroup::new("query")
        .required(true)
        .args(["corpno", "date", "period", "name"])
))]
pub struct Args {
    /// Look up a single 13-digit corporate number
    #[arg(short = 'c', long, value_name = "NUMBER")]
    pub corpno: Option<String>,

    /// Records changed on one date (YYYY-MM-DD)
    #[arg(short = 'd', long, value_name = "DATE")]
    pub date: Option<String>,

    /// Records changed between two dates, inclusive
    #[arg(short = 'p', long, num_args = 2, value_names = ["START", "END"])]
    pub period: Option<Vec<String>>,

    /// Search by corporate name
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Response format: 01 CSV Shift-JIS, 02 CSV UTF-8, 12 XML
    #[arg(long = "type", value_name = "CODE", default_value = "02")]
    pub format: String,

    /// Fetch only this partition
    #[arg(long, value_name = "N")]
    pub divide: Option<u32>,

    /// Include change history (corporate number search): 0 or 1
    #[arg(long, value_name = "0|1", default_value = "0")]
    pub history: String,

    /// Prefecture (2 digits) or city (5 digits) code
    #[arg(long, value_name = "CODE")]
    pub address: Option<String>,

    /// Corporate kinds to include
    #[arg(long, num_args = 1.., value_name = "CODE", default_values = ["01", "02", "03", "04"])]
    pub kind: Vec<String>,

    /// Restrict a name search to records changed in this period
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub fromto: Option<Vec<String>>,

    /// Name matching: 1 prefix, 2 partial
    #[arg(long, value_name = "1|2", default_value = "1")]
    pub mode: String,

    /// Name search target: 1 fuzzy, 2 exact, 3 English
    #[arg(long, value_name = "1|2|3", default_value = "1")]
    pub target: String,

    /// Search previous names too: 0 or 1
    #[arg(long, value_name = "0|1", default_value = "0")]
    pub change: String,

    /// Include closed corporations: 0 or 1
    #[arg(long, value_name = "0|1", default_value = "1")]
    pub close: String,

    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = "./conf/config.yml")]
    pub config: PathBuf,

    /// Configuration profile
    #[arg(long, value_name = "NAME", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the pause between partition requests
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,

    /// Write XML responses as CSV
    #[arg(long)]
    pub xml_to_csv: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log filter, e.g. `debug` or `corpno_dl=trace`
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Resolve the arguments into a validated query
    ///
    /// # Errors
    /// Returns the first invalid value found.
    pub fn to_query(&self) -> Result<Query, ValidationError> {
        let format: OutputFormat = self.format.parse()?;
        let mode = self.query_mode()?;

        let kinds = self
            .kind
            .iter()
            .map(|k| k.parse::<CorporateKind>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let options = QueryOptions {
            history: parse_flag("history", &self.history)?,
            area: self.address.as_deref().map(str::parse::<AreaCode>).transpose()?,
            kinds,
            mode: self.mode.parse::<SearchMode>()?,
            target: self.target.parse::<SearchTarget>()?,
            change: parse_flag("change", &self.change)?,
            close: parse_flag("close", &self.close)?,
            name_range: self.fromto.as_deref().map(date_pair).transpose()?,
        };

        let mut query = Query::new(mode, options, format);
        if let Some(partition) = self.divide {
            query = query.with_partition(partition)?;
        }
        query.validate()?;
        Ok(query)
    }

    fn query_mode(&self) -> Result<QueryMode, ValidationError> {
        match (&self.corpno, &self.date, &self.period, &self.name) {
            (Some(number), None, None, None) => {
                Ok(QueryMode::ByNumber(number.parse::<CorporateNumber>()?))
            }
            (None, Some(date), None, None) => Ok(QueryMode::ByDate(parse_iso_date(date)?)),
            (None, None, Some(period), None) => Ok(QueryMode::ByPeriod(date_pair(period)?)),
            (None, None, None, Some(name)) => Ok(QueryMode::ByName(name.clone())),
            _ => Err(ValidationError::QuerySelector),
        }
    }

    /// Apply `--output-dir` and `--delay` on top of the loaded configuration
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(secs) = self.delay {
            config.pagination.partition_delay = Duration::from_secs(secs);
        }
    }

    /// Log filter requested on the command line, if any
    ///
    /// `--log-level` wins over `-v`.
    pub fn log_filter(&self) -> Option<String> {
        if let Some(level) = &self.log_level {
            return Some(level.clone());
        }
        match self.verbose {
            0 => None,
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }
}

fn parse_flag(option: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ValidationError::UnknownOption {
            option,
            value: other.to_string(),
            expected: "0, 1",
        }),
    }
}

fn date_pair(values: &[String]) -> Result<DateRange, ValidationError> {
    match values {
        [start, end] => DateRange::parse(start, end),
        _ => Err(ValidationError::InvalidDate {
            value: values.join(" "),
        }),
    }
}
