//! Configuration helpers pointing the downloader at a mock server

use corpno_dl::Config;
use std::path::Path;
use std::time::Duration;

/// Application ID the mock server expects
pub const TEST_API_KEY: &str = "test-application-id";

/// Pause between partitions in tests
pub const TEST_DELAY: Duration = Duration::from_millis(20);

/// Configuration for a wiremock server with output going to `output_dir`
pub fn test_config(server_uri: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.api_url = format!("{server_uri}/4/");
    config.api.api_key = TEST_API_KEY.to_string();
    config.api.timeout = Duration::from_secs(5);
    config.output.output_dir = output_dir.to_path_buf();
    config.pagination.partition_delay = TEST_DELAY;
    config
}
