//! Error types for websmoke-core

use thiserror::Error;

/// Error surfaced by an external collaborator (provisioner, ssh, http, cloud API).
///
/// Collaborator crates convert their own error types into this one at the
/// trait boundary so checks only ever see a single failure shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{tool}: {message}")]
pub struct CollabError {
    /// Which tool failed (`terraform`, `ssh`, `http`, `oci`, ...).
    pub tool: String,
    /// Human-readable failure description.
    pub message: String,
}

impl CollabError {
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result type for collaborator calls.
pub type CollabResult<T> = std::result::Result<T, CollabError>;

/// Errors raised while reading run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Failure of a single check.
///
/// Every variant that compares values names both the expected and the actual
/// value so the runner's report is self-explanatory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Key material named in the run configuration could not be read.
    #[error("failed to read {kind} key from {path:?}: {reason}")]
    KeyMaterial {
        kind: &'static str,
        path: String,
        reason: String,
    },

    /// No provisioning outputs were captured for this run.
    #[error("provisioning outputs are not available (was the infrastructure applied?)")]
    OutputsUnavailable,

    /// A named output is absent or empty.
    #[error("provisioning output {name:?} is missing or empty")]
    MissingOutput { name: String },

    /// A collaborator call failed.
    #[error("{context}: {source}")]
    Connectivity {
        context: String,
        #[source]
        source: CollabError,
    },

    /// Expected vs. actual mismatch.
    #[error("{what}: expected {expected:?}, got {actual:?}")]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
    },

    /// The poll primitive ran out of attempts.
    #[error("{description}: gave up after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        description: String,
        attempts: u32,
        last_error: String,
    },

    #[error("no availability domains found in the {compartment} compartment")]
    NoAvailabilityDomains { compartment: String },

    #[error("missing expected availability domain {expected:?} (found: {found})")]
    MissingAvailabilityDomain { expected: String, found: String },

    #[error("no VCNs found in the {compartment} compartment")]
    NoVcns { compartment: String },

    #[error("wrong number of subnets in {vcn_id}: expected {expected}, got {actual}")]
    SubnetCount {
        vcn_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("response {request} from {url} does not contain {marker:?}")]
    MarkerMissing {
        url: String,
        request: u32,
        marker: String,
    },

    /// A check name was requested that the registry does not know.
    #[error("unknown check: {0}")]
    UnknownCheck(String),

    /// Provisioner apply/destroy/output failure.
    #[error("provisioning failed during {stage}: {source}")]
    Provisioning {
        stage: &'static str,
        #[source]
        source: CollabError,
    },
}

impl CheckError {
    /// Wrap a collaborator failure with a short description of the call.
    pub fn connectivity(context: impl Into<String>, source: CollabError) -> Self {
        CheckError::Connectivity {
            context: context.into(),
            source,
        }
    }

    pub fn mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        CheckError::Mismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type for checks.
pub type CheckResult<T> = std::result::Result<T, CheckError>;
