//! Structured logging setup
//!
//! Both binaries log through `tracing`. This module installs the subscriber:
//! - JSON output for CI and log shipping, pretty output for a terminal
//! - Sampling of per-request debug/info events, which grow with the user count
//! - Optional non-blocking writer so logging never stalls a virtual user
//!
//! Goose itself logs through the `log` crate; `try_init` installs the `log` bridge, so its
//! records end up in the same output.
//!
//! ## Environment Variables
//!
//! - `LOADTEST_LOG_LEVEL`: trace/debug/info/warn/error (default: info); `RUST_LOG` wins when set
//! - `LOADTEST_LOG_FORMAT`: json/pretty (default: pretty)
//! - `LOADTEST_LOG_SAMPLING_MODE`: all/error-only/sampled (default: all)
//! - `LOADTEST_LOG_SAMPLING_RATE`: 0.0-1.0 for sampled mode (default: 0.1)
//! - `LOADTEST_LOG_ASYNC`: true/false (default: false)
//! - `LOADTEST_LOG_TARGET_FILTER`: extra comma-separated filter directives

use anyhow::{Context, Result};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;
use tracing::{Event, Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for CI, pretty-print for a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Sampling mode: how to decide which logs to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Log everything
    All,
    /// Log only WARN and ERROR levels
    ErrorOnly,
    /// Sample below WARN, log all warnings and errors
    Sampled,
}

impl SamplingMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            "sampled" => SamplingMode::Sampled,
            _ => SamplingMode::All,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Sampling mode: all/error-only/sampled
    pub sampling_mode: SamplingMode,
    /// Sampling rate (0.0-1.0) for Sampled mode
    pub sampling_rate: f64,
    /// Write through a background thread
    pub async_logging: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("LOADTEST_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: LogFormat::parse(
                &lookup("LOADTEST_LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            ),
            sampling_mode: SamplingMode::parse(
                &lookup("LOADTEST_LOG_SAMPLING_MODE").unwrap_or_else(|| "all".to_string()),
            ),
            sampling_rate: lookup("LOADTEST_LOG_SAMPLING_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
            async_logging: lookup("LOADTEST_LOG_ASYNC")
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            target_filter: lookup("LOADTEST_LOG_TARGET_FILTER"),
        }
    }

    /// Verbose configuration for local debugging
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            sampling_mode: SamplingMode::All,
            sampling_rate: 1.0,
            async_logging: false,
            target_filter: None,
        }
    }

    /// Configuration for long attacks with many users
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            sampling_mode: SamplingMode::Sampled,
            sampling_rate: 0.1,
            async_logging: true,
            target_filter: None,
        }
    }
}

/// Mask a credential for logging: first four characters, then `***`.
///
/// Values of four characters or fewer are masked entirely.
pub fn redact_secret(value: &str) -> String {
    match value.char_indices().nth(4) {
        Some((cut, _)) => format!("{}***", &value[..cut]),
        None => "<REDACTED>".to_string(),
    }
}

/// Sampling layer: decides whether to emit a log based on sampling rules
pub struct SamplingLayer {
    mode: SamplingMode,
    sampling_rate: f64,
    counter: AtomicU64,
}

impl SamplingLayer {
    pub fn new(mode: SamplingMode, sampling_rate: f64) -> Self {
        Self {
            mode,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            counter: AtomicU64::new(0),
        }
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => {
                matches!(metadata.level(), &Level::WARN | &Level::ERROR)
            }
            SamplingMode::Sampled => {
                if matches!(metadata.level(), &Level::WARN | &Level::ERROR) {
                    return true;
                }
                if self.sampling_rate <= 0.0 {
                    return false;
                }

                let count = self.counter.fetch_add(1, Ordering::Relaxed);
                let sample_interval = (1.0 / self.sampling_rate) as u64;
                sample_interval > 0 && count % sample_interval == 0
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        // Spans pass through; only events are thinned
        !metadata.is_event() || self.should_sample(metadata)
    }

    fn on_event(&self, _event: &Event<'_>, _ctx: LayerContext<'_, S>) {}
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let level = parse_level(&config.log_level);
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // Connection-level chatter from the HTTP stack drowns out task logs under load
    for directive in ["hyper=warn", "hyper_util=warn", "reqwest=warn"] {
        env_filter = env_filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("invalid built-in directive {}", directive))?,
        );
    }

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {}", filter),
            }
        }
    }

    Ok(env_filter)
}

/// Initialize logging with a complete configuration
///
/// With `async_logging` the returned guard flushes the background writer when dropped;
/// keep it alive until the process exits.
///
/// # Example
///
/// ```no_run
/// use user_api_loadtest::logging::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env())
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = build_filter(config)?;
    let sampling_layer = SamplingLayer::new(config.sampling_mode, config.sampling_rate);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sampling_layer);

    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout),
            None,
        )
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
