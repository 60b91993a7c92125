//! Report printing.

use std::fmt::Write as _;

use colored::*;

use crate::scenario::{CaseOutcome, ScenarioReport};

/// Renders a per-case summary of one scenario, with diagnostics for failures.
pub fn format_summary(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({})",
        report.scenario.bold(),
        report.description,
        report.gateway
    );

    for case in &report.cases {
        let label = match &case.outcome {
            CaseOutcome::Passed { .. } => case.outcome.label().green(),
            CaseOutcome::Failed(_) | CaseOutcome::Aborted { .. } => case.outcome.label().red(),
            CaseOutcome::Cancelled { .. } => case.outcome.label().yellow(),
        };
        let _ = write!(out, "  [{}] {}", label, case.name);

        match &case.outcome {
            CaseOutcome::Passed { attempts, elapsed } => {
                let _ = writeln!(out, " ({} attempts, {:.1}s)", attempts, elapsed.as_secs_f64());
            }
            CaseOutcome::Cancelled { attempts, elapsed } => {
                let _ = writeln!(
                    out,
                    " (after {} attempts, {:.1}s)",
                    attempts,
                    elapsed.as_secs_f64()
                );
            }
            CaseOutcome::Aborted { message } => {
                let _ = writeln!(out);
                let _ = writeln!(out, "      {}", message);
            }
            CaseOutcome::Failed(e) => {
                let _ = writeln!(out, " ({})", e.signature.as_str().red());
                let _ = writeln!(out, "      expected:      status {}", e.expected.status_code());
                if let Some(target) = e.expected.redirect_target() {
                    let _ = writeln!(out, "      redirect to:   {}", target);
                }
                let _ = writeln!(out, "      last observed: {}", e.last_observed);
                if let Some(mismatch) = &e.last_mismatch {
                    let _ = writeln!(out, "      last mismatch: {}", mismatch);
                }
                let _ = writeln!(
                    out,
                    "      {} attempts ({} transport errors), best streak {}, {:.1}s",
                    e.attempt_count,
                    e.transport_errors,
                    e.max_consecutive_matches,
                    e.elapsed.as_secs_f64()
                );
            }
        }
    }

    let totals = format!(
        "{} passed, {} failed, {} cancelled, {} aborted in {:.1}s",
        report.passed,
        report.failed,
        report.cancelled,
        report.aborted,
        report.elapsed.as_secs_f64()
    );
    let _ = writeln!(
        out,
        "{}",
        if report.all_passed() {
            totals.green()
        } else {
            totals.red()
        }
    );
    out
}

/// Prints every report to stdout, as JSON or as a colored summary.
///
/// # Errors
///
/// Returns an error if the reports cannot be serialized to JSON.
pub fn print_report(reports: &[ScenarioReport], json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            print!("{}", format_summary(report));
        }
    }
    Ok(())
}
