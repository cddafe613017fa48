//! Per-run context handed to every check.

use std::sync::Arc;

use crate::collab::{CloudApiFactory, HttpProbe, SshClient};
use crate::config::{Expectations, RunConfig};
use crate::error::{CheckError, CheckResult};
use crate::host::{Host, KeyPair};
use crate::outputs::{self, ProvisionOutputs};
use crate::poll::PollPolicy;

/// Handles to the external collaborators used by checks.
#[derive(Clone)]
pub struct Collaborators {
    pub ssh: Arc<dyn SshClient>,
    pub http: Arc<dyn HttpProbe>,
    pub cloud: Arc<dyn CloudApiFactory>,
}

/// Read-only state shared by all checks of one run.
#[derive(Clone)]
pub struct CheckContext {
    pub config: Arc<RunConfig>,
    pub expectations: Arc<Expectations>,
    pub poll: PollPolicy,
    pub collab: Collaborators,
    outputs: Option<Arc<ProvisionOutputs>>,
}

impl CheckContext {
    pub fn new(config: RunConfig, expectations: Expectations, collab: Collaborators) -> Self {
        Self {
            config: Arc::new(config),
            expectations: Arc::new(expectations),
            poll: PollPolicy::default(),
            collab,
            outputs: None,
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_outputs(mut self, outputs: ProvisionOutputs) -> Self {
        self.outputs = Some(Arc::new(outputs));
        self
    }

    /// Captured provisioning outputs, or a clear error if none were captured.
    pub fn outputs(&self) -> CheckResult<&ProvisionOutputs> {
        self.outputs.as_deref().ok_or(CheckError::OutputsUnavailable)
    }

    pub fn has_outputs(&self) -> bool {
        self.outputs.is_some()
    }

    /// Load the SSH key pair named in the run configuration.
    pub fn key_pair(&self) -> CheckResult<KeyPair> {
        KeyPair::load(&self.config.ssh_public_key, &self.config.ssh_private_key)
    }

    /// Host descriptor for `address` using the configured user and keys.
    pub fn host(&self, address: &str) -> CheckResult<Host> {
        Ok(Host::new(
            outputs::strip_brackets(address),
            self.expectations.ssh_user.clone(),
            self.key_pair()?,
        ))
    }

    pub fn bastion_host(&self) -> CheckResult<Host> {
        let ip = self.outputs()?.first(outputs::BASTION_PUBLIC_IP)?;
        self.host(&ip)
    }

    /// The first web server, reached through the bastion.
    pub fn web_host(&self) -> CheckResult<Host> {
        let ip = self.outputs()?.first(outputs::WEB_SERVER_PRIVATE_IPS)?;
        self.host(&ip)
    }

    pub fn web_server_ips(&self) -> CheckResult<Vec<String>> {
        self.outputs()?.list(outputs::WEB_SERVER_PRIVATE_IPS)
    }
}
