//! Provision → capture outputs → check → destroy.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::checks::Check;
use crate::collab::Provisioner;
use crate::context::CheckContext;
use crate::error::CheckError;
use crate::runner::{CheckRunner, RunMode, RunReport};

/// Whether to tear the infrastructure down after a provisioned run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    Destroy,
    Keep,
}

/// Smoke-test run orchestrator.
pub struct SmokePipeline;

impl SmokePipeline {
    /// Apply the infrastructure, run `checks`, then destroy.
    ///
    /// Destroy runs even when apply or checks fail. When apply fails no check
    /// is run. When outputs cannot be read the checks still run and those
    /// that need outputs fail with [`CheckError::OutputsUnavailable`].
    pub async fn run_provisioned(
        provisioner: &dyn Provisioner,
        ctx: CheckContext,
        checks: &[Arc<dyn Check>],
        teardown: Teardown,
    ) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::new(RunMode::Provisioned);
        let vars = ctx.config.terraform_vars();

        info!(run_id = %report.run_id, checks = checks.len(), "Starting provisioned smoke run");

        match provisioner.init_and_apply(&vars).await {
            Ok(()) => {
                let ctx = Self::capture_outputs(provisioner, ctx).await;
                report.checks = CheckRunner::run(&ctx, checks).await;
            }
            Err(e) => {
                let err = CheckError::Provisioning {
                    stage: "apply",
                    source: e,
                };
                error!(error = %err, "apply failed, skipping checks");
                report.provisioning_error = Some(err.to_string());
            }
        }

        match teardown {
            Teardown::Destroy => {
                if let Err(e) = provisioner.destroy(&vars).await {
                    let err = CheckError::Provisioning {
                        stage: "destroy",
                        source: e,
                    };
                    error!(error = %err, "destroy failed");
                    report.provisioning_error = Some(match report.provisioning_error.take() {
                        Some(prev) => format!("{prev}; {err}"),
                        None => err.to_string(),
                    });
                }
            }
            Teardown::Keep => warn!("keeping provisioned infrastructure"),
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Self::log_summary(&report);
        report
    }

    /// Run `checks` against infrastructure that already exists.
    pub async fn run_existing(
        provisioner: &dyn Provisioner,
        ctx: CheckContext,
        checks: &[Arc<dyn Check>],
    ) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::new(RunMode::Existing);

        info!(run_id = %report.run_id, checks = checks.len(), "Starting smoke run without provisioning");

        let ctx = Self::capture_outputs(provisioner, ctx).await;
        report.checks = CheckRunner::run(&ctx, checks).await;

        report.duration_ms = start.elapsed().as_millis() as u64;
        Self::log_summary(&report);
        report
    }

    async fn capture_outputs(provisioner: &dyn Provisioner, ctx: CheckContext) -> CheckContext {
        match provisioner.outputs().await {
            Ok(outputs) => {
                info!(count = outputs.len(), "captured provisioning outputs");
                ctx.with_outputs(outputs)
            }
            Err(e) => {
                warn!(error = %e, "could not read provisioning outputs");
                ctx
            }
        }
    }

    fn log_summary(report: &RunReport) {
        if report.success() {
            info!(
                run_id = %report.run_id,
                passed = report.passed_count(),
                duration_ms = report.duration_ms,
                "Smoke run passed"
            );
        } else {
            error!(
                run_id = %report.run_id,
                passed = report.passed_count(),
                failed = report.failed_count(),
                duration_ms = report.duration_ms,
                "Smoke run failed"
            );
        }
    }
}
