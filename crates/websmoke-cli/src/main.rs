//! websmoke - smoke tests for the OCI web-server Terraform stack
//!
//! ## Commands
//!
//! - `run`: apply the stack, run the checks, destroy
//! - `check`: run the checks against already applied state
//! - `list`: show registered check names

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use websmoke_core::{
    CheckContext, CheckRegistry, Collaborators, Expectations, PollPolicy, RunConfig, RunReport,
    SmokePipeline, Teardown,
};
use websmoke_tools::{OciCliFactory, OpenSshClient, ReqwestProbe, TerraformCli};

const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "websmoke")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Provision-and-verify smoke tests for the OCI web-server stack", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the stack, run the checks, then destroy it
    Run {
        /// Directory holding the Terraform configuration
        #[arg(long, env = "WEBSMOKE_TERRAFORM_DIR", default_value = "..")]
        terraform_dir: PathBuf,

        /// Terraform workspace to select (created if missing)
        #[arg(long, env = "WEBSMOKE_WORKSPACE")]
        workspace: Option<String>,

        /// Comma-separated subset of checks to run
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Leave the infrastructure up after the checks
        #[arg(long)]
        keep: bool,

        /// Write the JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Run the checks against already applied state
    Check {
        /// Directory holding the Terraform configuration
        #[arg(long, env = "WEBSMOKE_TERRAFORM_DIR", default_value = "..")]
        terraform_dir: PathBuf,

        /// Comma-separated subset of checks to run
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Write the JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List registered checks in run order
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    websmoke_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            terraform_dir,
            workspace,
            only,
            keep,
            report,
        } => {
            let teardown = if keep { Teardown::Keep } else { Teardown::Destroy };
            cmd_run(
                &terraform_dir,
                workspace.as_deref(),
                &only,
                teardown,
                report.as_deref(),
            )
            .await
        }
        Commands::Check {
            terraform_dir,
            only,
            report,
        } => cmd_check(&terraform_dir, &only, report.as_deref()).await,
        Commands::List => cmd_list(),
    }
}

/// Build the check context from the environment and the real tools.
fn build_context() -> Result<CheckContext> {
    let config = RunConfig::from_env();
    let expectations = Expectations::from_env().context("Invalid expectation override")?;
    let poll = PollPolicy::from_env().context("Invalid retry policy override")?;

    let collab = Collaborators {
        ssh: Arc::new(OpenSshClient::new().with_connect_timeout(SSH_CONNECT_TIMEOUT_SECS)),
        http: Arc::new(ReqwestProbe::new(HTTP_TIMEOUT).context("Failed to build HTTP client")?),
        cloud: Arc::new(OciCliFactory::new()),
    };

    Ok(CheckContext::new(config, expectations, collab).with_poll_policy(poll))
}

fn terraform(dir: &Path, workspace: Option<&str>) -> TerraformCli {
    let tf = TerraformCli::new(dir);
    match workspace {
        Some(name) => tf.with_workspace(name),
        None => tf,
    }
}

async fn cmd_run(
    terraform_dir: &Path,
    workspace: Option<&str>,
    only: &[String],
    teardown: Teardown,
    report_path: Option<&Path>,
) -> Result<()> {
    let registry = CheckRegistry::standard();
    let checks = select_checks(&registry, only)?;
    let ctx = build_context()?;
    let provisioner = terraform(terraform_dir, workspace);

    println!("Provisioning from: {}", terraform_dir.display());
    if let Some(name) = workspace {
        println!("Workspace: {}", name);
    }
    println!("Checks: {}", checks.iter().map(|c| c.name()).collect::<Vec<_>>().join(", "));
    println!();

    let report = SmokePipeline::run_provisioned(&provisioner, ctx, &checks, teardown).await;
    finish(&report, report_path)
}

async fn cmd_check(terraform_dir: &Path, only: &[String], report_path: Option<&Path>) -> Result<()> {
    let registry = CheckRegistry::standard();
    let checks = select_checks(&registry, only)?;
    let ctx = build_context()?;
    let provisioner = terraform(terraform_dir, None);

    println!("Checking existing state in: {}", terraform_dir.display());
    println!();

    let report = SmokePipeline::run_existing(&provisioner, ctx, &checks).await;
    finish(&report, report_path)
}

fn cmd_list() -> Result<()> {
    let registry = CheckRegistry::standard();
    for check in registry.iter() {
        println!("{:<22} {}", check.name(), check.description());
    }
    Ok(())
}

/// Every registered check when `only` is empty, else that subset in run order.
fn select_checks(
    registry: &CheckRegistry,
    only: &[String],
) -> Result<Vec<Arc<dyn websmoke_core::Check>>> {
    let names: Vec<&str> = only
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(registry.all());
    }
    Ok(registry.select(names.as_slice())?)
}

fn finish(report: &RunReport, report_path: Option<&Path>) -> Result<()> {
    print_report(report);

    if let Some(path) = report_path {
        write_report(report, path)?;
        info!(path = %path.display(), "Report written");
    }

    if !report.success() {
        anyhow::bail!(
            "smoke run failed: {}/{} checks failed{}",
            report.failed_count(),
            report.checks.len(),
            if report.provisioning_error.is_some() {
                ", provisioning failed"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Run ID: {}", report.run_id);
    println!("Status: {}", if report.success() { "✓ PASSED" } else { "✗ FAILED" });
    println!("Duration: {}ms", report.duration_ms);
    println!();

    for outcome in &report.checks {
        let status = if outcome.passed { "✓" } else { "✗" };
        println!("  {} {} ({}ms)", status, outcome.name, outcome.duration_ms);
        if let Some(message) = &outcome.message {
            println!("      {}", message);
        }
    }

    if let Some(err) = &report.provisioning_error {
        println!();
        println!("Provisioning: {}", err);
    }

    println!();
    println!(
        "Summary: {}/{} checks passed",
        report.passed_count(),
        report.checks.len()
    );
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use websmoke_core::{CheckOutcome, RunMode};

    #[test]
    fn test_parse_run_with_only_list() {
        let cli = Cli::try_parse_from([
            "websmoke",
            "run",
            "--terraform-dir",
            "/srv/stack",
            "--only",
            "ssh_bastion,check_vcn",
            "--keep",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                terraform_dir,
                only,
                keep,
                ..
            } => {
                assert_eq!(terraform_dir, PathBuf::from("/srv/stack"));
                assert_eq!(only, vec!["ssh_bastion", "check_vcn"]);
                assert!(keep);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["websmoke", "list", "--verbose", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_check_rejects_keep() {
        assert!(Cli::try_parse_from(["websmoke", "check", "--keep"]).is_err());
    }

    #[test]
    fn test_select_checks_defaults_to_all() {
        let registry = CheckRegistry::standard();
        let checks = select_checks(&registry, &[]).unwrap();
        assert_eq!(checks.len(), registry.len());
    }

    #[test]
    fn test_select_checks_keeps_registry_order() {
        let registry = CheckRegistry::standard();
        let only = vec!["subnets_count".to_string(), " ssh_bastion".to_string()];
        let names: Vec<_> = select_checks(&registry, &only)
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["ssh_bastion", "subnets_count"]);
    }

    #[test]
    fn test_select_checks_unknown_name() {
        let registry = CheckRegistry::standard();
        let Err(err) = select_checks(&registry, &["ssh_everything".to_string()]) else {
            panic!("expected unknown check error");
        };
        assert!(err.to_string().contains("ssh_everything"));
    }

    #[test]
    fn test_failed_report_is_error() {
        let mut report = RunReport::new(RunMode::Existing);
        report.checks.push(CheckOutcome {
            name: "check_vcn".to_string(),
            passed: false,
            message: Some("wrong cidr block: expected 10.0.0.0/16, got 10.1.0.0/16".to_string()),
            duration_ms: 3,
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let err = finish(&report, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("1/1 checks failed"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["mode"], "existing");
        assert_eq!(written["checks"][0]["name"], "check_vcn");
    }

    #[test]
    fn test_passing_report_is_ok() {
        let mut report = RunReport::new(RunMode::Provisioned);
        report.checks.push(CheckOutcome {
            name: "ssh_bastion".to_string(),
            passed: true,
            message: None,
            duration_ms: 1,
        });
        assert!(finish(&report, None).is_ok());
    }
}
