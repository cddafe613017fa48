//! Terraform CLI provisioner.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};
use websmoke_core::{CollabResult, ProvisionOutputs, Provisioner};

use crate::error::ToolError;
use crate::process::{execute, execute_stdout, ToolCommand, ToolSettings};

const TERRAFORM: &str = "terraform";

/// Drives `terraform` in a working directory.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    dir: PathBuf,
    workspace: Option<String>,
    settings: ToolSettings,
}

impl TerraformCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            workspace: None,
            settings: ToolSettings::default(),
        }
    }

    /// Select (or create) this workspace before applying.
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_settings(mut self, settings: ToolSettings) -> Self {
        self.settings = settings;
        self
    }

    fn command(&self, args: Vec<String>) -> ToolCommand {
        ToolCommand::new(TERRAFORM)
            .args(args)
            .current_dir(self.dir.clone())
    }

    async fn select_workspace(&self, name: &str) -> CollabResult<()> {
        let select = execute(&self.command(workspace_args("select", name)), &self.settings).await?;
        if select.success() {
            return Ok(());
        }
        warn!(workspace = name, "workspace missing, creating it");
        execute_stdout(&self.command(workspace_args("new", name)), &self.settings).await?;
        Ok(())
    }
}

pub fn init_args() -> Vec<String> {
    vec!["init".into(), "-input=false".into(), "-no-color".into()]
}

pub fn apply_args(vars: &BTreeMap<String, String>) -> Vec<String> {
    lifecycle_args("apply", vars)
}

pub fn destroy_args(vars: &BTreeMap<String, String>) -> Vec<String> {
    lifecycle_args("destroy", vars)
}

fn lifecycle_args(verb: &str, vars: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec![
        verb.to_string(),
        "-auto-approve".to_string(),
        "-input=false".to_string(),
        "-no-color".to_string(),
    ];
    for (name, value) in vars {
        args.push("-var".to_string());
        args.push(format!("{name}={value}"));
    }
    args
}

pub fn output_args() -> Vec<String> {
    vec!["output".into(), "-json".into(), "-no-color".into()]
}

fn workspace_args(action: &str, name: &str) -> Vec<String> {
    vec!["workspace".into(), action.into(), name.into()]
}

#[async_trait]
impl Provisioner for TerraformCli {
    async fn init_and_apply(&self, vars: &BTreeMap<String, String>) -> CollabResult<()> {
        info!(dir = %self.dir.display(), "terraform init");
        execute_stdout(&self.command(init_args()), &self.settings).await?;

        if let Some(workspace) = &self.workspace {
            self.select_workspace(workspace).await?;
        }

        info!(dir = %self.dir.display(), "terraform apply");
        execute_stdout(&self.command(apply_args(vars)), &self.settings).await?;
        Ok(())
    }

    async fn destroy(&self, vars: &BTreeMap<String, String>) -> CollabResult<()> {
        info!(dir = %self.dir.display(), "terraform destroy");
        execute_stdout(&self.command(destroy_args(vars)), &self.settings).await?;
        Ok(())
    }

    async fn outputs(&self) -> CollabResult<ProvisionOutputs> {
        let json = execute_stdout(&self.command(output_args()), &self.settings).await?;
        let outputs = ProvisionOutputs::from_terraform_json(&json).map_err(|e| ToolError::Parse {
            what: "terraform output".to_string(),
            reason: e.to_string(),
        })?;
        Ok(outputs)
    }
}
