//! Declarative name → check registry.

use std::sync::Arc;

use crate::checks::{
    AvailabilityDomains, Check, CheckVcn, CurlWebServer, LoadBalancerCurl, ServiceListener,
    SshBastion, SshWeb, SubnetsCount,
};
use crate::error::{CheckError, CheckResult};

/// Ordered collection of checks. Registration order is execution order.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard battery for the web-server stack.
    pub fn standard() -> Self {
        Self::new()
            .register(SshBastion)
            .register(SshWeb)
            .register(ServiceListener)
            .register(CurlWebServer)
            .register(CheckVcn)
            .register(AvailabilityDomains)
            .register(SubnetsCount)
            .register(LoadBalancerCurl)
    }

    /// Add a check. A check with the same name replaces the earlier one in place.
    pub fn register<C: Check + 'static>(mut self, check: C) -> Self {
        let check: Arc<dyn Check> = Arc::new(check);
        match self.checks.iter().position(|c| c.name() == check.name()) {
            Some(idx) => self.checks[idx] = check,
            None => self.checks.push(check),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Check>> {
        self.checks.iter().find(|c| c.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.iter()
    }

    /// Subset of checks by name, returned in registry order.
    ///
    /// Unknown names are an error; duplicates collapse.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> CheckResult<Vec<Arc<dyn Check>>> {
        for name in names {
            if self.get(name.as_ref()).is_none() {
                return Err(CheckError::UnknownCheck(name.as_ref().to_string()));
            }
        }
        Ok(self
            .checks
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name()))
            .cloned()
            .collect())
    }

    /// Every registered check, in order.
    pub fn all(&self) -> Vec<Arc<dyn Check>> {
        self.checks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let registry = CheckRegistry::standard();
        assert_eq!(
            registry.names(),
            vec![
                "ssh_bastion",
                "ssh_web",
                "listener_nginx",
                "curl_web_server",
                "check_vcn",
                "availability_domains",
                "subnets_count",
                "load_balancer_curl",
            ]
        );
    }

    #[test]
    fn test_select_keeps_registry_order() {
        let registry = CheckRegistry::standard();
        let selected = registry
            .select(&["load_balancer_curl", "ssh_bastion", "ssh_bastion"])
            .unwrap();
        let names: Vec<_> = selected.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ssh_bastion", "load_balancer_curl"]);
    }

    #[test]
    fn test_select_unknown_name() {
        let registry = CheckRegistry::standard();
        let err = registry.select(&["ssh_bastion", "nope"]).err().unwrap();
        assert_eq!(err, CheckError::UnknownCheck("nope".to_string()));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = CheckRegistry::new().register(SshBastion).register(SshBastion);
        assert_eq!(registry.len(), 1);
    }
}
