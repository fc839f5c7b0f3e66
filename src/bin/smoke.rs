//! Smoke check for the user API
//!
//! Runs the load test's tasks once (or a few weighted times) against a target, without
//! concurrency or waits, and prints what each request ended up as. Exits non-zero when
//! any request failed.
//!
//! ```bash
//! cargo run --bin user-api-smoke -- --host http://localhost:8080
//! cargo run --bin user-api-smoke -- --host http://localhost:8080 --iterations 20 --seed 7
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use user_api_loadtest::config::LoadTestConfig;
use user_api_loadtest::logging::{self, LogConfig};
use user_api_loadtest::smoke::{run_smoke, SmokePlan};

/// Smoke-test a user API deployment with the load test's tasks
#[derive(Parser, Debug)]
#[command(name = "user-api-smoke", version, about, long_about = None)]
struct Args {
    /// Target host, e.g. https://api.example.com
    #[arg(long, env = "LOADTEST_HOST", default_value = "http://localhost:8080")]
    host: String,

    /// Draw this many tasks by weight instead of running each task once
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Seed for the weighted draw
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = LoadTestConfig::from_env();
    config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let plan = match args.iterations {
        Some(iterations) => SmokePlan::Weighted {
            iterations,
            seed: args.seed,
        },
        None => SmokePlan::Each,
    };

    let report = run_smoke(client, &args.host, &config, plan).await?;
    print!("{}", report);
    Ok(report.is_clean())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = match logging::init_logging_with_config(&LogConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{:#}", e), "smoke run failed");
            ExitCode::FAILURE
        }
    }
}
