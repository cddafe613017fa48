//! websmoke - provision-and-verify smoke tests for the OCI web-server stack
//!
//! Applies the Terraform stack, then runs a fixed battery of checks against
//! what came up:
//! - SSH reachability of the bastion and of the web servers behind it
//! - service listeners and HTTP status of every web server
//! - load balancer responses
//! - VCN identity, availability domains and subnet counts via the OCI API
//!
//! Collaborators are traits (see [`collab`]); the concrete tool-driven
//! implementations live in `websmoke-tools`.

pub mod checks;
pub mod collab;
pub mod config;
pub mod context;
pub mod error;
pub mod fakes;
pub mod host;
pub mod outputs;
pub mod pipeline;
pub mod poll;
pub mod registry;
pub mod runner;
pub mod telemetry;

// Re-export key types
pub use checks::Check;
pub use collab::{
    AvailabilityDomain, CloudApi, CloudApiFactory, CredentialProfile, HttpProbe, Provisioner,
    SshClient, Subnet, Vcn,
};
pub use config::{Expectations, RunConfig};
pub use context::{CheckContext, Collaborators};
pub use error::{CheckError, CheckResult, CollabError, CollabResult, ConfigError};
pub use host::{Host, KeyPair};
pub use outputs::{OutputValue, ProvisionOutputs};
pub use pipeline::{SmokePipeline, Teardown};
pub use poll::{poll_until, PollPolicy};
pub use registry::CheckRegistry;
pub use runner::{CheckOutcome, CheckRunner, RunMode, RunReport};
pub use telemetry::init_tracing;
