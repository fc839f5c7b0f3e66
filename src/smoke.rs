//! # Smoke Runner
//!
//! Runs the virtual user's tasks a handful of times against a real target, without goose,
//! without waits and without concurrency. Useful to check host, base path and API key
//! before committing to a full attack.
//!
//! [`ReqwestHarness`] applies the same default verdict goose does (transport errors and
//! non-2xx statuses fail) to every request the behavior leaves unclassified.
//!
//! ```no_run
//! use user_api_loadtest::config::LoadTestConfig;
//! use user_api_loadtest::smoke::{run_smoke, SmokePlan};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let report = run_smoke(
//!     reqwest::Client::new(),
//!     "http://localhost:8080",
//!     &LoadTestConfig::from_env(),
//!     SmokePlan::Each,
//! )
//! .await?;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use url::Url;

use crate::api::{ApiRequest, ApiResponse};
use crate::behavior::{Harness, Signal, TaskOutcome, VirtualUser};
use crate::config::LoadTestConfig;
use crate::task::TaskKind;

/// Error that aborts a smoke task.
#[derive(Debug)]
pub enum SmokeError {
    /// The request path could not be joined onto the host
    InvalidUrl(url::ParseError),
    /// The request never produced a response
    Transport(reqwest::Error),
}

impl fmt::Display for SmokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmokeError::InvalidUrl(e) => write!(f, "invalid request URL: {}", e),
            SmokeError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for SmokeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SmokeError::InvalidUrl(e) => Some(e),
            SmokeError::Transport(e) => Some(e),
        }
    }
}

/// One request the smoke harness sent and the verdict it ended up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub method: String,
    pub path: String,
    pub status: Option<u16>,
    pub signal: Signal,
}

/// [`Harness`] over a plain `reqwest::Client`.
pub struct ReqwestHarness {
    client: reqwest::Client,
    host: Url,
    exchanges: Vec<Exchange>,
}

impl ReqwestHarness {
    pub fn new(client: reqwest::Client, host: Url) -> Self {
        Self {
            client,
            host,
            exchanges: Vec::new(),
        }
    }

    /// Every request sent so far, oldest first.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Drain the recorded exchanges.
    pub fn take_exchanges(&mut self) -> Vec<Exchange> {
        std::mem::take(&mut self.exchanges)
    }

    fn override_last(&mut self, signal: Signal) {
        if let Some(last) = self.exchanges.last_mut() {
            last.signal = signal;
        }
    }
}

impl Harness for ReqwestHarness {
    type Error = SmokeError;

    async fn send(&mut self, request: ApiRequest) -> Result<ApiResponse, SmokeError> {
        let url = self
            .host
            .join(&request.path)
            .map_err(SmokeError::InvalidUrl)?;
        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let mut exchange = Exchange {
            method: request.method.to_string(),
            path: request.path,
            status: None,
            signal: Signal::Success,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                exchange.signal = Signal::Failure(format!("transport error: {}", e));
                self.exchanges.push(exchange);
                return Err(SmokeError::Transport(e));
            }
        };
        let status = response.status().as_u16();
        exchange.status = Some(status);
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                exchange.signal = Signal::Failure(format!("transport error: {}", e));
                self.exchanges.push(exchange);
                return Err(SmokeError::Transport(e));
            }
        };

        let response = ApiResponse { status, body };
        if !response.is_success() {
            exchange.signal = Signal::Failure(format!("HTTP status {}", status));
        }
        self.exchanges.push(exchange);
        Ok(response)
    }

    fn mark_success(&mut self) -> Result<(), SmokeError> {
        self.override_last(Signal::Success);
        Ok(())
    }

    fn mark_failure(&mut self, message: &str) -> Result<(), SmokeError> {
        self.override_last(Signal::Failure(message.to_string()));
        Ok(())
    }
}

/// Which tasks a smoke run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokePlan {
    /// Every enabled task once, in [`TaskKind::ALL`] order
    Each,
    /// `iterations` tasks drawn by weight from an RNG seeded with `seed`
    Weighted { iterations: usize, seed: u64 },
}

/// Tallies for one task kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskTally {
    /// Task invocations
    pub runs: usize,
    /// Requests that ended successful
    pub successes: usize,
    /// Failure messages of requests that ended failed, transport errors included
    pub failures: Vec<String>,
    /// Invocations aborted because a request got no response
    pub aborted: usize,
}

/// Result of a smoke run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmokeReport {
    pub tasks: BTreeMap<&'static str, TaskTally>,
    pub exchanges: Vec<Exchange>,
}

impl SmokeReport {
    pub fn tally(&self, kind: TaskKind) -> Option<&TaskTally> {
        self.tasks.get(kind.name())
    }

    pub fn failure_count(&self) -> usize {
        self.tasks.values().map(|t| t.failures.len()).sum()
    }

    /// No request failed and no task was aborted.
    pub fn is_clean(&self) -> bool {
        self.tasks
            .values()
            .all(|t| t.failures.is_empty() && t.aborted == 0)
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<32} {:>6} {:>9} {:>8} {:>8}",
            "task", "runs", "successes", "failures", "aborted"
        )?;
        for (name, tally) in &self.tasks {
            writeln!(
                f,
                "{:<32} {:>6} {:>9} {:>8} {:>8}",
                name,
                tally.runs,
                tally.successes,
                tally.failures.len(),
                tally.aborted
            )?;
            for failure in &tally.failures {
                writeln!(f, "    {}", failure)?;
            }
        }
        Ok(())
    }
}

/// Run a smoke plan against `host` and report what every request ended up as.
///
/// Task failures never abort the run; only an unusable `host` is an error.
pub async fn run_smoke(
    client: reqwest::Client,
    host: &str,
    config: &LoadTestConfig,
    plan: SmokePlan,
) -> Result<SmokeReport> {
    let host = Url::parse(host).with_context(|| format!("invalid host '{}'", host))?;
    info!(host = %host, ?plan, "starting smoke run");

    let mut rng = match plan {
        SmokePlan::Each => StdRng::from_entropy(),
        SmokePlan::Weighted { seed, .. } => StdRng::seed_from_u64(seed),
    };
    let schedule: Vec<TaskKind> = match plan {
        SmokePlan::Each => config.weights.enabled().map(|(kind, _)| kind).collect(),
        SmokePlan::Weighted { iterations, .. } => (0..iterations)
            .filter_map(|_| config.weights.choose(&mut rng))
            .collect(),
    };

    let mut harness = ReqwestHarness::new(client, host);
    let mut user = VirtualUser::new();
    user.on_session_start();
    let mut report = SmokeReport::default();

    for kind in schedule {
        let result = user.run(kind, &mut harness, config, &mut rng).await;
        let exchanges = harness.take_exchanges();
        let tally = report.tasks.entry(kind.name()).or_default();
        tally.runs += 1;

        match result {
            Ok(TaskOutcome::Rejected(failure)) => {
                warn!(task = %kind, error = %failure, "task rejected");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(task = %kind, error = %e, "task aborted");
                tally.aborted += 1;
            }
        }
        for exchange in &exchanges {
            match &exchange.signal {
                Signal::Success => tally.successes += 1,
                Signal::Failure(message) => tally
                    .failures
                    .push(format!("{} {}: {}", exchange.method, exchange.path, message)),
            }
        }
        report.exchanges.extend(exchanges);
    }

    info!(
        failures = report.failure_count(),
        requests = report.exchanges.len(),
        "smoke run finished"
    );
    Ok(report)
}
