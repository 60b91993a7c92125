//! Scenario runner.
//!
//! Runs every case of a scenario as its own tokio task, bounded by a semaphore,
//! and reports each one independently. A failing, cancelled or panicking case
//! never affects the verdict of another.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::{TimeoutConfig, DEFAULT_MAX_CONCURRENCY};
use crate::error_handling::{ConfigurationError, ConsistencyTimeoutError};
use crate::fetch::RoundTripper;
use crate::models::{GatewayAddress, RequestDescriptor, ResponseExpectation, TestCase};
use crate::poll::{expect_eventually_consistent, PollError};

/// A named, ordered group of cases checked against one gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    short_name: String,
    description: String,
    cases: Vec<TestCase>,
}

impl Scenario {
    pub fn new(short_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            description: description.into(),
            cases: Vec::new(),
        }
    }

    /// Appends a case, naming it after its position in the scenario.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the request or expectation is invalid.
    pub fn with_case(
        mut self,
        request: RequestDescriptor,
        expectation: ResponseExpectation,
    ) -> Result<Self, ConfigurationError> {
        let case = TestCase::new(self.cases.len(), request, expectation)?;
        self.cases.push(case);
        Ok(self)
    }

    /// Appends an already-built case as is.
    pub fn with_test_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

/// Verdict for a single case.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The required consecutive matches were observed.
    Passed { attempts: u32, elapsed: Duration },
    /// The case did not settle within its budget.
    Failed(Box<ConsistencyTimeoutError>),
    /// The scenario was cancelled before the case finished.
    Cancelled { attempts: u32, elapsed: Duration },
    /// The task running the case panicked or was aborted.
    Aborted { message: String },
}

impl CaseOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseOutcome::Passed { .. } => "PASS",
            CaseOutcome::Failed(_) => "FAIL",
            CaseOutcome::Cancelled { .. } => "CANCELLED",
            CaseOutcome::Aborted { .. } => "ABORTED",
        }
    }
}

/// One case and its verdict.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    /// Position of the case within its scenario
    pub index: usize,
    pub name: String,
    pub outcome: CaseOutcome,
}

/// Result of one scenario run, with cases in scenario order.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub description: String,
    pub gateway: String,
    /// Start of the run, milliseconds since the Unix epoch
    pub started_at_ms: i64,
    pub elapsed: Duration,
    pub passed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub aborted: usize,
    pub cases: Vec<CaseReport>,
}

impl ScenarioReport {
    /// True when every case passed. An empty scenario passes.
    pub fn all_passed(&self) -> bool {
        self.passed == self.cases.len()
    }
}

/// Runs scenarios against one gateway with one timing configuration.
#[derive(Debug)]
pub struct ScenarioRunner<R> {
    round_tripper: Arc<R>,
    gateway: GatewayAddress,
    timeouts: TimeoutConfig,
    max_concurrency: usize,
    cancel: CancellationToken,
}

impl<R> ScenarioRunner<R>
where
    R: RoundTripper + 'static,
{
    /// Creates a runner, rejecting timing configurations before any request is made.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeoutConfig` if `timeouts` is invalid.
    pub fn new(
        round_tripper: Arc<R>,
        gateway: GatewayAddress,
        timeouts: TimeoutConfig,
    ) -> Result<Self, ConfigurationError> {
        timeouts.validate()?;
        Ok(Self {
            round_tripper,
            gateway,
            timeouts,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cancel: CancellationToken::new(),
        })
    }

    /// Caps the number of cases polled at once. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Cases stop at their next polling boundary once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs every case of `scenario` and collects the verdicts.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let started_at_ms = chrono::Utc::now().timestamp_millis();
        let start = tokio::time::Instant::now();
        info!(
            "Running {} ({} cases) against {}",
            scenario.short_name(),
            scenario.cases().len(),
            self.gateway
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = FuturesUnordered::new();

        for (index, case) in scenario.cases().iter().enumerate() {
            let case = case.clone();
            let name = case.name().to_string();
            let round_tripper = Arc::clone(&self.round_tripper);
            let gateway = self.gateway.clone();
            let timeouts = self.timeouts;
            let cancel = self.cancel.clone();
            let semaphore = Arc::clone(&semaphore);

            let handle = tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return CaseOutcome::Cancelled {
                        attempts: 0,
                        elapsed: Duration::ZERO,
                    };
                };

                match expect_eventually_consistent(
                    round_tripper.as_ref(),
                    &timeouts,
                    &gateway,
                    &case,
                    &cancel,
                )
                .await
                {
                    Ok(settled) => CaseOutcome::Passed {
                        attempts: settled.attempts,
                        elapsed: settled.elapsed,
                    },
                    Err(PollError::Timeout(e)) => CaseOutcome::Failed(e),
                    Err(PollError::Cancelled { attempts, elapsed }) => {
                        CaseOutcome::Cancelled { attempts, elapsed }
                    }
                }
            });

            tasks.push(async move { (index, name, handle.await) });
        }

        let mut cases = Vec::with_capacity(scenario.cases().len());
        while let Some((index, name, joined)) = tasks.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                warn!("Task for case '{}' did not complete: {}", name, e);
                CaseOutcome::Aborted {
                    message: e.to_string(),
                }
            });
            cases.push(CaseReport {
                index,
                name,
                outcome,
            });
        }
        cases.sort_by_key(|c| c.index);

        let count = |f: fn(&CaseOutcome) -> bool| cases.iter().filter(|c| f(&c.outcome)).count();
        let report = ScenarioReport {
            scenario: scenario.short_name().to_string(),
            description: scenario.description().to_string(),
            gateway: self.gateway.to_string(),
            started_at_ms,
            elapsed: start.elapsed(),
            passed: count(|o| matches!(o, CaseOutcome::Passed { .. })),
            failed: count(|o| matches!(o, CaseOutcome::Failed(_))),
            cancelled: count(|o| matches!(o, CaseOutcome::Cancelled { .. })),
            aborted: count(|o| matches!(o, CaseOutcome::Aborted { .. })),
            cases,
        };

        info!(
            "{}: {} passed, {} failed, {} cancelled in {:?}",
            report.scenario, report.passed, report.failed, report.cancelled, report.elapsed
        );
        report
    }
}
