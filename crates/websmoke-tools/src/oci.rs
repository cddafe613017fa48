//! OCI CLI-backed cloud API.
//!
//! Every call shells out to `oci ... --output json` and unwraps the `data`
//! envelope. List commands print nothing at all when there are no results.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use websmoke_core::{
    AvailabilityDomain, CloudApi, CloudApiFactory, CollabResult, CredentialProfile, Subnet, Vcn,
};

use crate::error::{ToolError, ToolResult};
use crate::process::{execute_stdout, ToolCommand, ToolSettings};

const OCI: &str = "oci";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct VcnDto {
    id: String,
    display_name: String,
    #[serde(default)]
    cidr_block: Option<String>,
    #[serde(default)]
    cidr_blocks: Vec<String>,
}

impl From<VcnDto> for Vcn {
    fn from(dto: VcnDto) -> Self {
        let cidr_block = dto
            .cidr_block
            .or_else(|| dto.cidr_blocks.into_iter().next())
            .unwrap_or_default();
        Vcn {
            id: dto.id,
            display_name: dto.display_name,
            cidr_block,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvailabilityDomainDto {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SubnetDto {
    id: String,
    vcn_id: String,
    #[serde(default)]
    display_name: String,
}

/// Cloud API client bound to one credential profile.
#[derive(Debug, Clone)]
pub struct OciCli {
    profile: String,
    config_file: Option<PathBuf>,
    settings: ToolSettings,
}

impl OciCli {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            config_file: None,
            settings: ToolSettings::default(),
        }
    }

    /// Read profiles from this file instead of `~/.oci/config`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_settings(mut self, settings: ToolSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Full argument list: the subcommand followed by the common flags.
    pub fn args(&self, subcommand: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = subcommand.iter().map(|s| s.to_string()).collect();
        if let Some(path) = &self.config_file {
            args.push("--config-file".to_string());
            args.push(path.display().to_string());
        }
        args.push("--profile".to_string());
        args.push(self.profile.clone());
        args.push("--output".to_string());
        args.push("json".to_string());
        args
    }

    async fn call(&self, subcommand: &[&str]) -> ToolResult<String> {
        debug!(profile = %self.profile, ?subcommand, "oci");
        execute_stdout(&ToolCommand::new(OCI).args(self.args(subcommand)), &self.settings).await
    }
}

/// Parse a single-resource response.
fn parse_one<T: DeserializeOwned>(what: &str, stdout: &str) -> ToolResult<T> {
    let envelope: Envelope<T> = serde_json::from_str(stdout).map_err(|e| ToolError::Parse {
        what: what.to_string(),
        reason: e.to_string(),
    })?;
    Ok(envelope.data)
}

/// Parse a list response; empty output is an empty list.
fn parse_list<T: DeserializeOwned>(what: &str, stdout: &str) -> ToolResult<Vec<T>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_one(what, stdout)
}

fn get_vcn_command(vcn_id: &str) -> Vec<&str> {
    vec!["network", "vcn", "get", "--vcn-id", vcn_id]
}

// Not paginated; the CLI rejects `--all` here.
fn list_availability_domains_command(compartment_id: &str) -> Vec<&str> {
    vec!["iam", "availability-domain", "list", "--compartment-id", compartment_id]
}

fn list_vcns_command(compartment_id: &str) -> Vec<&str> {
    vec!["network", "vcn", "list", "--compartment-id", compartment_id, "--all"]
}

fn list_subnets_command<'a>(compartment_id: &'a str, vcn_id: &'a str) -> Vec<&'a str> {
    vec![
        "network",
        "subnet",
        "list",
        "--compartment-id",
        compartment_id,
        "--vcn-id",
        vcn_id,
        "--all",
    ]
}

#[async_trait]
impl CloudApi for OciCli {
    async fn get_vcn(&self, vcn_id: &str) -> CollabResult<Vcn> {
        let stdout = self.call(&get_vcn_command(vcn_id)).await?;
        let dto: VcnDto = parse_one("vcn", &stdout)?;
        Ok(dto.into())
    }

    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> CollabResult<Vec<AvailabilityDomain>> {
        let stdout = self
            .call(&list_availability_domains_command(compartment_id))
            .await?;
        let dtos: Vec<AvailabilityDomainDto> = parse_list("availability domains", &stdout)?;
        Ok(dtos
            .into_iter()
            .map(|d| AvailabilityDomain { name: d.name })
            .collect())
    }

    async fn list_vcns(&self, compartment_id: &str) -> CollabResult<Vec<Vcn>> {
        let stdout = self.call(&list_vcns_command(compartment_id)).await?;
        let dtos: Vec<VcnDto> = parse_list("vcns", &stdout)?;
        Ok(dtos.into_iter().map(Vcn::from).collect())
    }

    async fn list_subnets(&self, compartment_id: &str, vcn_id: &str) -> CollabResult<Vec<Subnet>> {
        let stdout = self
            .call(&list_subnets_command(compartment_id, vcn_id))
            .await?;
        let dtos: Vec<SubnetDto> = parse_list("subnets", &stdout)?;
        Ok(dtos
            .into_iter()
            .map(|s| Subnet {
                id: s.id,
                vcn_id: s.vcn_id,
                display_name: s.display_name,
            })
            .collect())
    }
}

/// Hands out a fresh [`OciCli`] per profile.
#[derive(Debug, Clone, Default)]
pub struct OciCliFactory {
    config_file: Option<PathBuf>,
    settings: ToolSettings,
}

impl OciCliFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_settings(mut self, settings: ToolSettings) -> Self {
        self.settings = settings;
        self
    }

    fn build(&self, profile: &CredentialProfile) -> OciCli {
        let mut cli = OciCli::new(profile.name()).with_settings(self.settings);
        if let Some(path) = &self.config_file {
            cli = cli.with_config_file(path.clone());
        }
        cli
    }
}

impl CloudApiFactory for OciCliFactory {
    fn connect(&self, profile: &CredentialProfile) -> CollabResult<Arc<dyn CloudApi>> {
        Ok(Arc::new(self.build(profile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_flags_follow_subcommand() {
        let cli = OciCli::new("CzechEdu");
        let args = cli.args(&["network", "vcn", "get", "--vcn-id", "ocid1.vcn"]);
        assert_eq!(
            args,
            vec![
                "network", "vcn", "get", "--vcn-id", "ocid1.vcn", "--profile", "CzechEdu",
                "--output", "json"
            ]
        );
    }

    #[test]
    fn test_availability_domain_list_is_not_paginated() {
        let cli = OciCli::new("DEFAULT");
        let args = cli.args(&list_availability_domains_command("ocid1.compartment"));
        assert_eq!(
            args,
            vec![
                "iam",
                "availability-domain",
                "list",
                "--compartment-id",
                "ocid1.compartment",
                "--profile",
                "DEFAULT",
                "--output",
                "json"
            ]
        );
    }

    #[test]
    fn test_paginated_lists_fetch_all_pages() {
        assert_eq!(list_vcns_command("c").last(), Some(&"--all"));
        let subnets = list_subnets_command("c", "v");
        assert!(subnets.windows(2).any(|w| w == ["--vcn-id", "v"]));
        assert_eq!(subnets.last(), Some(&"--all"));
        assert!(!get_vcn_command("v").contains(&"--all"));
    }

    #[test]
    fn test_factory_uses_profile_name() {
        let factory = OciCliFactory::new().with_config_file("/etc/oci/config");
        let cli = factory.build(&CredentialProfile::Default);
        let args = cli.args(&["iam", "region", "list"]);
        assert!(args.windows(2).any(|w| w[0] == "--profile" && w[1] == "DEFAULT"));
        assert!(args
            .windows(2)
            .any(|w| w[0] == "--config-file" && w[1] == "/etc/oci/config"));
    }

    #[test]
    fn test_parse_vcn() {
        let json = r#"{
            "data": {
                "id": "ocid1.vcn.oc1..web",
                "display-name": "Web VCN-default",
                "cidr-block": "10.0.0.0/16",
                "cidr-blocks": ["10.0.0.0/16"],
                "lifecycle-state": "AVAILABLE"
            },
            "etag": "abc"
        }"#;
        let vcn: Vcn = parse_one::<VcnDto>("vcn", json).unwrap().into();
        assert_eq!(vcn.display_name, "Web VCN-default");
        assert_eq!(vcn.cidr_block, "10.0.0.0/16");
    }

    #[test]
    fn test_vcn_falls_back_to_cidr_blocks() {
        let json = r#"{"data": {"id": "v", "display-name": "n", "cidr-blocks": ["10.1.0.0/16"]}}"#;
        let vcn: Vcn = parse_one::<VcnDto>("vcn", json).unwrap().into();
        assert_eq!(vcn.cidr_block, "10.1.0.0/16");
    }

    #[test]
    fn test_parse_subnet_list() {
        let json = r#"{"data": [
            {"id": "s1", "vcn-id": "v", "display-name": "public"},
            {"id": "s2", "vcn-id": "v", "display-name": "private"}
        ]}"#;
        let subnets: Vec<SubnetDto> = parse_list("subnets", json).unwrap();
        assert_eq!(subnets.len(), 2);
        assert_eq!(subnets[1].display_name, "private");
    }

    #[test]
    fn test_empty_output_is_empty_list() {
        let domains: Vec<AvailabilityDomainDto> = parse_list("availability domains", "\n").unwrap();
        assert!(domains.is_empty());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = parse_list::<SubnetDto>("subnets", "ServiceError: NotAuthorized").unwrap_err();
        assert!(matches!(err, ToolError::Parse { ref what, .. } if what == "subnets"));
    }
}
