//! Run configuration read from the process environment.
//!
//! All readers take a lookup closure so tests can feed a plain map instead of
//! mutating the real environment. The `from_env` constructors are thin
//! wrappers over `std::env::var`.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::poll::PollPolicy;

/// Terraform credentials and key locations, one field per `TF_VAR_*` variable.
///
/// Missing variables become empty strings; nothing is validated here; the
/// provisioner or the first check that needs a value reports the problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub region: String,
    pub tenancy_ocid: String,
    pub user_ocid: String,
    pub compartment_ocid: String,
    pub fingerprint: String,
    pub private_key_path: String,
    /// Path to the SSH public key file.
    pub ssh_public_key: String,
    /// Path to the SSH private key file.
    pub ssh_private_key: String,
    /// Optional API key pass phrase, forwarded only when set.
    pub pass_phrase: Option<String>,
}

impl RunConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            region: get("TF_VAR_region"),
            tenancy_ocid: get("TF_VAR_tenancy_ocid"),
            user_ocid: get("TF_VAR_user_ocid"),
            compartment_ocid: get("TF_VAR_CompartmentOCID"),
            fingerprint: get("TF_VAR_fingerprint"),
            private_key_path: get("TF_VAR_private_key_path"),
            ssh_public_key: get("TF_VAR_ssh_public_key"),
            ssh_private_key: get("TF_VAR_ssh_private_key"),
            pass_phrase: lookup("TF_VAR_pass_phrase").filter(|v| !v.is_empty()),
        }
    }

    /// Variables handed to the provisioner, keyed by Terraform variable name.
    pub fn terraform_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("region".to_string(), self.region.clone());
        vars.insert("tenancy_ocid".to_string(), self.tenancy_ocid.clone());
        vars.insert("user_ocid".to_string(), self.user_ocid.clone());
        vars.insert("CompartmentOCID".to_string(), self.compartment_ocid.clone());
        vars.insert("fingerprint".to_string(), self.fingerprint.clone());
        vars.insert("private_key_path".to_string(), self.private_key_path.clone());
        vars.insert("ssh_public_key".to_string(), self.ssh_public_key.clone());
        vars.insert("ssh_private_key".to_string(), self.ssh_private_key.clone());
        if let Some(pass_phrase) = &self.pass_phrase {
            vars.insert("pass_phrase".to_string(), pass_phrase.clone());
        }
        vars
    }
}

/// Environment-specific literals the checks compare against.
///
/// Defaults are the values of the reference web-server deployment; each one
/// can be overridden through a `WEBSMOKE_*` variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectations {
    pub ssh_user: String,
    pub service_name: String,
    pub service_port: String,
    pub listener_count: u32,
    pub http_status: String,
    pub vcn_display_name: String,
    pub vcn_cidr_block: String,
    pub availability_domain: String,
    pub subnets_per_vcn: usize,
    pub lb_marker: String,
    pub lb_requests: u32,
    /// Credential profile used by the VCN identity check.
    pub vcn_profile: String,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            ssh_user: "opc".to_string(),
            service_name: "nginx".to_string(),
            service_port: "80".to_string(),
            listener_count: 1,
            http_status: "200".to_string(),
            vcn_display_name: "Web VCN-default".to_string(),
            vcn_cidr_block: "10.0.0.0/16".to_string(),
            availability_domain: "NoND:EU-FRANKFURT-1-AD-3".to_string(),
            subnets_per_vcn: 3,
            lb_marker: "web0".to_string(),
            lb_requests: 10,
            vcn_profile: "CzechEdu".to_string(),
        }
    }
}

impl Expectations {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        Ok(Self {
            ssh_user: text("WEBSMOKE_SSH_USER", defaults.ssh_user),
            service_name: text("WEBSMOKE_SERVICE_NAME", defaults.service_name),
            service_port: text("WEBSMOKE_SERVICE_PORT", defaults.service_port),
            listener_count: parse_or(&lookup, "WEBSMOKE_LISTENER_COUNT", defaults.listener_count)?,
            http_status: text("WEBSMOKE_HTTP_STATUS", defaults.http_status),
            vcn_display_name: text("WEBSMOKE_VCN_DISPLAY_NAME", defaults.vcn_display_name),
            vcn_cidr_block: text("WEBSMOKE_VCN_CIDR", defaults.vcn_cidr_block),
            availability_domain: text(
                "WEBSMOKE_AVAILABILITY_DOMAIN",
                defaults.availability_domain,
            ),
            subnets_per_vcn: parse_or(&lookup, "WEBSMOKE_SUBNETS_PER_VCN", defaults.subnets_per_vcn)?,
            lb_marker: text("WEBSMOKE_LB_MARKER", defaults.lb_marker),
            lb_requests: parse_positive(&lookup, "WEBSMOKE_LB_REQUESTS", defaults.lb_requests)?,
            vcn_profile: text("WEBSMOKE_VCN_PROFILE", defaults.vcn_profile),
        })
    }
}

impl PollPolicy {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_retries = parse_or(&lookup, "WEBSMOKE_MAX_RETRIES", defaults.max_retries)?;
        let delay_secs = parse_or(
            &lookup,
            "WEBSMOKE_RETRY_DELAY_SECS",
            defaults.delay.as_secs(),
        )?;
        Ok(Self {
            max_retries,
            delay: Duration::from_secs(delay_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Like [`parse_or`], but zero is rejected.
fn parse_positive<F>(lookup: &F, key: &str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            var: key.to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}
