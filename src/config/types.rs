//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and for configuring a scenario run programmatically.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::config::constants::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_REDIRECT_HOPS, DEFAULT_MAX_TIME_TO_CONSISTENCY,
    DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_REQUIRED_CONSECUTIVE_SUCCESSES,
    DEFAULT_USER_AGENT,
};
use crate::error_handling::ConfigurationError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Scheme used to reach the gateway listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayScheme {
    /// Plain-text HTTP listener
    Http,
    /// TLS-terminated HTTPS listener
    Https,
}

impl GatewayScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayScheme::Http => "http",
            GatewayScheme::Https => "https",
        }
    }
}

impl std::fmt::Display for GatewayScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing knobs for one scenario run.
///
/// All values are supplied explicitly to the poller and the executor; nothing in
/// the engine falls back to a global default once a `TimeoutConfig` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutConfig {
    /// Delay between two attempts for the same case.
    pub poll_interval: Duration,
    /// Overall budget for a case to reach the consecutive-match threshold.
    pub max_time_to_consistency: Duration,
    /// Back-to-back matching observations required before declaring success.
    pub required_consecutive_successes: u32,
    /// Budget for one round trip, independent of the overall budget.
    pub request_timeout: Duration,
    /// Maximum redirect hops followed for requests that follow redirects.
    pub max_redirect_hops: usize,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_time_to_consistency: DEFAULT_MAX_TIME_TO_CONSISTENCY,
            required_consecutive_successes: DEFAULT_REQUIRED_CONSECUTIVE_SUCCESSES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
        }
    }
}

impl TimeoutConfig {
    /// Rejects configurations the poller cannot make progress with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeoutConfig` when a duration is zero or
    /// the consecutive-match threshold is zero.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let reason = if self.required_consecutive_successes == 0 {
            "required_consecutive_successes must be at least 1"
        } else if self.poll_interval.is_zero() {
            "poll_interval must be greater than zero"
        } else if self.max_time_to_consistency.is_zero() {
            "max_time_to_consistency must be greater than zero"
        } else if self.request_timeout.is_zero() {
            "request_timeout must be greater than zero"
        } else {
            return Ok(());
        };
        Err(ConfigurationError::InvalidTimeoutConfig(reason.to_string()))
    }
}

/// Command-line configuration for the `gateway_conformance` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gateway_conformance",
    version,
    about = "Checks that a gateway applies HTTPRoute redirect rules, polling until responses settle."
)]
pub struct Config {
    /// Gateway address as host:port
    pub gateway: String,

    /// Scheme used to reach the gateway listener
    #[arg(long, value_enum, default_value_t = GatewayScheme::Http)]
    pub scheme: GatewayScheme,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Delay between polling attempts, in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    pub poll_interval_ms: u64,

    /// Overall time budget for each case to become consistent, in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_TIME_TO_CONSISTENCY.as_secs())]
    pub max_time_to_consistency_secs: u64,

    /// Consecutive matching responses required before a case passes
    #[arg(long, default_value_t = DEFAULT_REQUIRED_CONSECUTIVE_SUCCESSES)]
    pub required_consecutive_successes: u32,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub request_timeout_secs: u64,

    /// Maximum redirect hops to follow for requests that follow redirects
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECT_HOPS)]
    pub max_redirect_hops: usize,

    /// Maximum number of cases polled concurrently
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Accept invalid TLS certificates from the gateway
    #[arg(long)]
    pub insecure: bool,

    /// Print the final report as JSON instead of a colored summary
    #[arg(long)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: "127.0.0.1:80".to_string(),
            scheme: GatewayScheme::Http,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_time_to_consistency_secs: DEFAULT_MAX_TIME_TO_CONSISTENCY.as_secs(),
            required_consecutive_successes: DEFAULT_REQUIRED_CONSECUTIVE_SUCCESSES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            insecure: false,
            json: false,
        }
    }
}

impl Config {
    /// Builds the per-scenario timing configuration from the CLI options.
    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_time_to_consistency: Duration::from_secs(self.max_time_to_consistency_secs),
            required_consecutive_successes: self.required_consecutive_successes,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_redirect_hops: self.max_redirect_hops,
        }
    }
}
