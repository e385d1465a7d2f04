//! Log output.
//!
//! Filter priority:
//!
//! 1. `--log-level` or `-v` on the command line
//! 2. `RUST_LOG`
//! 3. `info`
//!
//! Logs go to stderr so stdout stays free for the run summary.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";

/// Pick the filter directive to use
pub fn filter_directive(explicit: Option<&str>, env: Option<&str>) -> String {
    let given = |d: &&str| !d.trim().is_empty();
    explicit
        .filter(given)
        .or(env.filter(given))
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global subscriber
///
/// Calling this more than once is a no-op. An unparsable directive falls back
/// to `info`.
pub fn init_logging(explicit: Option<&str>) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(explicit, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_timer(SystemTime),
        )
        .try_init()
        .ok();
}
