//! Collaborator traits: the provisioner, SSH, HTTP and the cloud API.
//!
//! Checks only talk to these traits. `websmoke-tools` implements them on top
//! of the real command-line tools; [`crate::fakes`] implements them in memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollabResult;
use crate::host::Host;
use crate::outputs::ProvisionOutputs;

/// Applies and destroys infrastructure and exposes its outputs.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Initialise the working directory and apply with the given variables.
    async fn init_and_apply(&self, vars: &BTreeMap<String, String>) -> CollabResult<()>;

    /// Tear everything down.
    async fn destroy(&self, vars: &BTreeMap<String, String>) -> CollabResult<()>;

    /// Read all outputs of the current state.
    async fn outputs(&self) -> CollabResult<ProvisionOutputs>;
}

/// Opens SSH sessions and runs commands.
#[async_trait]
pub trait SshClient: Send + Sync {
    /// Succeeds when a session to `host` can be established.
    async fn check_connection(&self, host: &Host) -> CollabResult<()>;

    /// Run `command` on `host` and return its standard output.
    async fn run(&self, host: &Host, command: &str) -> CollabResult<String>;

    /// Run `command` on `target`, reached through `jump`.
    async fn run_via(&self, jump: &Host, target: &Host, command: &str) -> CollabResult<String>;
}

/// Direct HTTP requests.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// GET `url` and return the response body as text.
    async fn get_body(&self, url: &str) -> CollabResult<String>;
}

/// A virtual cloud network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vcn {
    pub id: String,
    pub display_name: String,
    pub cidr_block: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDomain {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub vcn_id: String,
    pub display_name: String,
}

/// Request/response calls against the cloud provider.
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn get_vcn(&self, vcn_id: &str) -> CollabResult<Vcn>;

    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> CollabResult<Vec<AvailabilityDomain>>;

    async fn list_vcns(&self, compartment_id: &str) -> CollabResult<Vec<Vcn>>;

    async fn list_subnets(&self, compartment_id: &str, vcn_id: &str) -> CollabResult<Vec<Subnet>>;
}

/// Which credential profile a cloud client is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialProfile {
    Default,
    Named(String),
}

impl CredentialProfile {
    /// Profile name as used in the provider's config file.
    pub fn name(&self) -> &str {
        match self {
            CredentialProfile::Default => "DEFAULT",
            CredentialProfile::Named(name) => name,
        }
    }
}

/// Builds a fresh cloud client per check. Clients are never pooled.
pub trait CloudApiFactory: Send + Sync {
    fn connect(&self, profile: &CredentialProfile) -> CollabResult<Arc<dyn CloudApi>>;
}
