//! # Load Test Configuration
//!
//! Environment-variable configuration for the simulated user behavior.
//!
//! The target host is not part of this configuration: it belongs to the harness
//! invocation (`--host` for both binaries). Everything the virtual user itself needs
//! to build requests and to be scheduled lives here.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `LOADTEST_API_KEY` | `ecs-secret-key` | value sent in the `x-api-key` header |
//! | `LOADTEST_BASE_PATH` | `/dev/api/v1` | prefix of every endpoint |
//! | `LOADTEST_WAIT_MIN_SECS` | `1` | lower bound of the wait between tasks |
//! | `LOADTEST_WAIT_MAX_SECS` | `5` | upper bound of the wait between tasks |
//! | `LOADTEST_CREATE_WEIGHT` | `1` | weight of the create-and-get-user task |
//! | `LOADTEST_HEALTH_WEIGHT` | `1` | weight of the health-check task |
//!
//! Numeric values that fail to parse fall back to their defaults.
//!
//! ## Usage
//!
//! ```rust
//! use user_api_loadtest::config::LoadTestConfig;
//!
//! let config = LoadTestConfig::from_env();
//! config.validate().expect("invalid load test configuration");
//! ```

use std::env;
use std::fmt;
use std::time::Duration;

use crate::task::{TaskWeights, WaitPolicy};

/// API key historically baked into the load test; used when none is configured.
pub const DEFAULT_API_KEY: &str = "ecs-secret-key";

/// Base path of the user API behind its API gateway stage.
pub const DEFAULT_BASE_PATH: &str = "/dev/api/v1";

const DEFAULT_WAIT_MIN_SECS: u64 = 1;
const DEFAULT_WAIT_MAX_SECS: u64 = 5;

/// Configuration shared by every virtual user of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTestConfig {
    /// Credential sent as `x-api-key` on user endpoints
    pub api_key: String,
    /// Endpoint prefix, always starting with `/` and never ending with one
    pub base_path: String,
    /// Pause drawn between two tasks of the same virtual user
    pub wait: WaitPolicy,
    /// Relative task weights
    pub weights: TaskWeights,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            wait: WaitPolicy::new(
                Duration::from_secs(DEFAULT_WAIT_MIN_SECS),
                Duration::from_secs(DEFAULT_WAIT_MAX_SECS),
            ),
            weights: TaskWeights::default(),
        }
    }
}

impl LoadTestConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// [`LoadTestConfig::from_env`] is this function over the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TaskWeights::default();
        let number = |name: &str, default: u64| -> u64 {
            lookup(name)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            api_key: lookup("LOADTEST_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            base_path: normalize_base_path(
                &lookup("LOADTEST_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            ),
            wait: WaitPolicy::new(
                Duration::from_secs(number("LOADTEST_WAIT_MIN_SECS", DEFAULT_WAIT_MIN_SECS)),
                Duration::from_secs(number("LOADTEST_WAIT_MAX_SECS", DEFAULT_WAIT_MAX_SECS)),
            ),
            weights: TaskWeights {
                create_and_get_user: number(
                    "LOADTEST_CREATE_WEIGHT",
                    defaults.create_and_get_user as u64,
                ) as usize,
                health_check: number("LOADTEST_HEALTH_WEIGHT", defaults.health_check as u64)
                    as usize,
            },
        }
    }

    /// Reject configurations no virtual user could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::RelativeBasePath {
                base_path: self.base_path.clone(),
            });
        }
        if self.wait.min() > self.wait.max() {
            return Err(ConfigError::InvertedWaitBounds {
                min: self.wait.min(),
                max: self.wait.max(),
            });
        }
        if self.weights.total() == 0 {
            return Err(ConfigError::NoTasksEnabled);
        }
        Ok(())
    }

    /// Join an endpoint path (starting with `/`) onto the base path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }
}

/// Strip trailing slashes so endpoint joining never produces `//`.
fn normalize_base_path(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Configuration error
///
/// Returned by [`LoadTestConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `LOADTEST_API_KEY` was set to an empty value
    EmptyApiKey,
    /// The base path does not start with `/`
    RelativeBasePath {
        /// The rejected base path
        base_path: String,
    },
    /// The minimum wait is longer than the maximum wait
    InvertedWaitBounds {
        /// Configured lower bound
        min: Duration,
        /// Configured upper bound
        max: Duration,
    },
    /// Every task weight is zero
    NoTasksEnabled,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyApiKey => {
                write!(f, "load test configuration error: API key must not be empty")
            }
            ConfigError::RelativeBasePath { base_path } => write!(
                f,
                "load test configuration error: base path '{}' must start with '/'",
                base_path
            ),
            ConfigError::InvertedWaitBounds { min, max } => write!(
                f,
                "load test configuration error: minimum wait {}s exceeds maximum wait {}s",
                min.as_secs(),
                max.as_secs()
            ),
            ConfigError::NoTasksEnabled => write!(
                f,
                "load test configuration error: at least one task weight must be non-zero"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
