//! Sequential check execution and the run report.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::checks::Check;
use crate::context::CheckContext;

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check name.
    pub name: String,

    /// Whether the check passed.
    pub passed: bool,

    /// Failure message naming expected and actual values (None on success).
    pub message: Option<String>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// How the run obtained its infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Applied before the checks and destroyed afterwards.
    Provisioned,
    /// Checked against already existing infrastructure.
    Existing,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub checks: Vec<CheckOutcome>,
    pub duration_ms: u64,

    /// Provisioning failure (apply, output capture or destroy), if any.
    pub provisioning_error: Option<String>,
}

impl RunReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            mode,
            started_at: Utc::now(),
            checks: Vec::new(),
            duration_ms: 0,
            provisioning_error: None,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// True when provisioning succeeded and every check passed.
    pub fn success(&self) -> bool {
        self.provisioning_error.is_none() && self.failed_count() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Executes checks one after another, isolating their failures.
pub struct CheckRunner;

impl CheckRunner {
    /// Run `checks` in order. A failing check is recorded and the next one
    /// still runs.
    pub async fn run(ctx: &CheckContext, checks: &[Arc<dyn Check>]) -> Vec<CheckOutcome> {
        let mut outcomes = Vec::with_capacity(checks.len());

        for check in checks {
            let name = check.name();
            let start = Instant::now();
            let result = check
                .run(ctx)
                .instrument(info_span!("check", name))
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(()) => {
                    info!(check = name, duration_ms, "PASS");
                    CheckOutcome {
                        name: name.to_string(),
                        passed: true,
                        message: None,
                        duration_ms,
                    }
                }
                Err(e) => {
                    error!(check = name, duration_ms, error = %e, "FAIL");
                    CheckOutcome {
                        name: name.to_string(),
                        passed: false,
                        message: Some(e.to_string()),
                        duration_ms,
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, passed: bool) -> CheckOutcome {
        CheckOutcome {
            name: name.to_string(),
            passed,
            message: (!passed).then(|| "boom".to_string()),
            duration_ms: 10,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::new(RunMode::Existing);
        report.checks = vec![outcome("a", true), outcome("b", false), outcome("c", true)];

        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.success());
        assert_eq!(report.outcome("b").unwrap().message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_provisioning_error_fails_report() {
        let mut report = RunReport::new(RunMode::Provisioned);
        report.checks = vec![outcome("a", true)];
        assert!(report.success());

        report.provisioning_error = Some("apply failed".to_string());
        assert!(!report.success());
    }

    #[test]
    fn test_report_serializes_mode() {
        let report = RunReport::new(RunMode::Provisioned);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "provisioned");
        assert!(!json["run_id"].as_str().unwrap().is_empty());
    }
}
