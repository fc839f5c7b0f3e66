//! Goose load test binary for the user API
//!
//! Simulates virtual users that create a user and read it back, or hit the health check,
//! waiting 1-5 seconds between tasks.
//!
//! # Usage
//!
//! ```bash
//! # Run against a local API
//! cargo run --release --bin user-api-loadtest -- \
//!   --host http://localhost:8080 \
//!   --users 50 \
//!   --hatch-rate 10 \
//!   --run-time 5m \
//!   --report-file load-test-report.html
//!
//! # Short test for CI
//! LOADTEST_LOG_FORMAT=json \
//! cargo run --release --bin user-api-loadtest -- \
//!   --host http://localhost:8080 \
//!   -u10 -r2 -t30s
//! ```
//!
//! Goose parses the command line; everything specific to the user API
//! (`LOADTEST_API_KEY`, `LOADTEST_BASE_PATH`, ...) comes from the environment.

use std::sync::Arc;

use goose::prelude::*;
use tracing::info;

use user_api_loadtest::config::LoadTestConfig;
use user_api_loadtest::goose_user;
use user_api_loadtest::logging::{self, redact_secret, LogConfig};

/// Host used when `--host` is not given.
const DEFAULT_HOST: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line before environment: `--help` exits here
    let attack = GooseAttack::initialize()?;
    let _log_guard = logging::init_logging_with_config(&LogConfig::from_env())?;

    let config = LoadTestConfig::from_env();
    config.validate()?;
    info!(
        base_path = %config.base_path,
        api_key = %redact_secret(&config.api_key),
        wait_min_secs = config.wait.min().as_secs(),
        wait_max_secs = config.wait.max().as_secs(),
        create_weight = config.weights.create_and_get_user,
        health_weight = config.weights.health_check,
        "starting load test"
    );

    attack
        .set_default(GooseDefault::Host, DEFAULT_HOST)?
        .register_scenario(goose_user::scenario(Arc::new(config))?)
        .execute()
        .await?;

    info!("load test finished");
    Ok(())
}
