//! Cloud-API checks. Each one builds its own client and never retries: the
//! infrastructure is expected to be converged once apply has returned.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::Check;
use crate::collab::{CloudApi, CredentialProfile};
use crate::context::CheckContext;
use crate::error::{CheckError, CheckResult};
use crate::outputs::{vcn_id_from_output, VCN_ID};

fn connect(ctx: &CheckContext, profile: &CredentialProfile) -> CheckResult<Arc<dyn CloudApi>> {
    ctx.collab.cloud.connect(profile).map_err(|e| {
        CheckError::connectivity(format!("building cloud client for profile {}", profile.name()), e)
    })
}

/// Fetch the provisioned VCN and verify its name and address block.
pub struct CheckVcn;

#[async_trait]
impl Check for CheckVcn {
    fn name(&self) -> &'static str {
        "check_vcn"
    }

    fn description(&self) -> &'static str {
        "provisioned VCN has the expected display name and CIDR block"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let raw = ctx.outputs()?.text(VCN_ID)?;
        let vcn_id = vcn_id_from_output(&raw)?;
        let exp = &ctx.expectations;

        let client = connect(ctx, &CredentialProfile::Named(exp.vcn_profile.clone()))?;
        let vcn = client
            .get_vcn(&vcn_id)
            .await
            .map_err(|e| CheckError::connectivity("error in calling vcn", e))?;

        if vcn.display_name != exp.vcn_display_name {
            return Err(CheckError::mismatch(
                "wrong vcn display name",
                &exp.vcn_display_name,
                vcn.display_name,
            ));
        }
        if vcn.cidr_block != exp.vcn_cidr_block {
            return Err(CheckError::mismatch(
                "wrong cidr block",
                &exp.vcn_cidr_block,
                vcn.cidr_block,
            ));
        }
        info!(vcn_id = %vcn_id, name = %vcn.display_name, "vcn identity verified");
        Ok(())
    }
}

/// The compartment exposes the expected availability domain.
pub struct AvailabilityDomains;

#[async_trait]
impl Check for AvailabilityDomains {
    fn name(&self) -> &'static str {
        "availability_domains"
    }

    fn description(&self) -> &'static str {
        "compartment lists the expected availability domain"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let compartment = ctx.config.compartment_ocid.clone();
        let client = connect(ctx, &CredentialProfile::Default)?;

        let domains = client
            .list_availability_domains(&compartment)
            .await
            .map_err(|e| CheckError::connectivity("listing availability domains", e))?;

        if domains.is_empty() {
            return Err(CheckError::NoAvailabilityDomains { compartment });
        }

        let names = domains
            .iter()
            .map(|ad| ad.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        info!(domains = %names, "availability domains");

        let expected = &ctx.expectations.availability_domain;
        if !names.contains(expected.as_str()) {
            return Err(CheckError::MissingAvailabilityDomain {
                expected: expected.clone(),
                found: names,
            });
        }
        Ok(())
    }
}

/// Every VCN in the compartment has the expected number of subnets.
///
/// Stops at the first VCN that does not; later VCNs are not queried.
pub struct SubnetsCount;

#[async_trait]
impl Check for SubnetsCount {
    fn name(&self) -> &'static str {
        "subnets_count"
    }

    fn description(&self) -> &'static str {
        "each VCN in the compartment has the expected subnet count"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let compartment = ctx.config.compartment_ocid.clone();
        let expected = ctx.expectations.subnets_per_vcn;
        let client = connect(ctx, &CredentialProfile::Default)?;

        let vcns = client
            .list_vcns(&compartment)
            .await
            .map_err(|e| CheckError::connectivity("listing vcns", e))?;
        if vcns.is_empty() {
            return Err(CheckError::NoVcns { compartment });
        }

        for vcn in &vcns {
            let subnets = client
                .list_subnets(&compartment, &vcn.id)
                .await
                .map_err(|e| CheckError::connectivity(format!("listing subnets of {}", vcn.id), e))?;

            info!(vcn_id = %vcn.id, subnets = subnets.len(), "subnet count");
            if subnets.len() != expected {
                return Err(CheckError::SubnetCount {
                    vcn_id: vcn.id.clone(),
                    expected,
                    actual: subnets.len(),
                });
            }
        }
        Ok(())
    }
}
