//! gateway_conformance library: eventually-consistent HTTP assertions
//!
//! This library checks that a gateway applies its HTTP routing rules by sending
//! requests to the gateway's data plane and polling until responses settle. A
//! route that was just accepted is not yet propagated, so each case must match
//! its expectation several times in a row, within a time budget, before it
//! passes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gateway_conformance::config::TimeoutConfig;
//! use gateway_conformance::fetch::HttpRoundTripper;
//! use gateway_conformance::models::GatewayAddress;
//! use gateway_conformance::scenario::ScenarioRunner;
//! use gateway_conformance::scenarios::http_route_redirect_scheme;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let timeouts = TimeoutConfig::default();
//! let transport = HttpRoundTripper::from_config(&timeouts, "conformance", false)?;
//! let gateway = GatewayAddress::parse("10.0.0.5:80")?;
//!
//! let runner = ScenarioRunner::new(Arc::new(transport), gateway, timeouts)?;
//! let report = runner.run(&http_route_redirect_scheme()?).await;
//! println!("{} of {} cases passed", report.passed, report.cases.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

mod app;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod poll;
pub mod scenario;
pub mod scenarios;
#[cfg(test)]
mod testing;

// Re-export public API
pub use app::{cancel_on_ctrl_c, format_summary, print_report, shutdown_gracefully};
pub use config::{Config, LogFormat, LogLevel, TimeoutConfig};
pub use error_handling::{ConfigurationError, ConsistencyTimeoutError, FailureSignature};
pub use run::run_conformance;
pub use scenario::{CaseOutcome, CaseReport, Scenario, ScenarioReport, ScenarioRunner};

// Internal run module (wires configuration to the runner)
mod run {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use tokio_util::sync::CancellationToken;

    use crate::config::Config;
    use crate::fetch::HttpRoundTripper;
    use crate::models::GatewayAddress;
    use crate::scenario::{ScenarioReport, ScenarioRunner};
    use crate::scenarios::builtin_scenarios;

    /// Runs every built-in scenario against the configured gateway.
    ///
    /// Scenarios run one after another; the cases inside each run concurrently.
    /// Once `cancel` fires, the current scenario reports its unfinished cases as
    /// cancelled and the remaining scenarios are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot
    /// be built. Failing cases are not errors; they are reported in the result.
    pub async fn run_conformance(
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<Vec<ScenarioReport>> {
        let timeouts = config.timeout_config();
        timeouts
            .validate()
            .context("Invalid timing configuration")?;

        let gateway = GatewayAddress::with_scheme(&config.gateway, config.scheme)
            .context("Invalid gateway address")?;
        let transport =
            HttpRoundTripper::from_config(&timeouts, &config.user_agent, config.insecure)
                .context("Failed to initialize HTTP client")?;
        let scenarios = builtin_scenarios().context("Invalid built-in scenario")?;

        let runner = ScenarioRunner::new(Arc::new(transport), gateway, timeouts)?
            .with_max_concurrency(config.max_concurrency)
            .with_cancellation(cancel.clone());

        info!(
            "Polling every {:?}, {} consecutive matches within {:?} required",
            timeouts.poll_interval,
            timeouts.required_consecutive_successes,
            timeouts.max_time_to_consistency
        );

        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            if cancel.is_cancelled() {
                info!("Skipping {}: run cancelled", scenario.short_name());
                continue;
            }
            reports.push(runner.run(scenario).await);
        }
        Ok(reports)
    }
}
