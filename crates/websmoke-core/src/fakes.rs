//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `FakeProvisioner`, `FakeSsh`, `FakeHttp`, `FakeCloud` and
//! `FakeCloudFactory`, which satisfy the trait contracts with scripted
//! responses and record every call they receive.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::collab::{
    AvailabilityDomain, CloudApi, CloudApiFactory, CredentialProfile, HttpProbe, Provisioner,
    SshClient, Subnet, Vcn,
};
use crate::context::{CheckContext, Collaborators};
use crate::config::{Expectations, RunConfig};
use crate::error::{CollabError, CollabResult};
use crate::host::Host;
use crate::outputs::ProvisionOutputs;

/// Pop the next scripted response, repeating the last one forever.
fn next_response<T: Clone>(queue: &mut VecDeque<CollabResult<T>>) -> Option<CollabResult<T>> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

// ---------------------------------------------------------------------------
// FakeProvisioner
// ---------------------------------------------------------------------------

/// Provisioner with canned results for apply, destroy and outputs.
#[derive(Debug)]
pub struct FakeProvisioner {
    apply: CollabResult<()>,
    destroy: CollabResult<()>,
    outputs: CollabResult<ProvisionOutputs>,
    calls: Mutex<Vec<&'static str>>,
    applied_vars: Mutex<Option<BTreeMap<String, String>>>,
}

impl FakeProvisioner {
    pub fn new(outputs: ProvisionOutputs) -> Self {
        Self {
            apply: Ok(()),
            destroy: Ok(()),
            outputs: Ok(outputs),
            calls: Mutex::new(Vec::new()),
            applied_vars: Mutex::new(None),
        }
    }

    pub fn failing_apply(mut self, message: &str) -> Self {
        self.apply = Err(CollabError::new("terraform", message));
        self
    }

    pub fn failing_destroy(mut self, message: &str) -> Self {
        self.destroy = Err(CollabError::new("terraform", message));
        self
    }

    pub fn failing_outputs(mut self, message: &str) -> Self {
        self.outputs = Err(CollabError::new("terraform", message));
        self
    }

    /// Calls received, in order (`init_and_apply`, `outputs`, `destroy`).
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn applied_vars(&self) -> Option<BTreeMap<String, String>> {
        self.applied_vars.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    async fn init_and_apply(&self, vars: &BTreeMap<String, String>) -> CollabResult<()> {
        self.calls.lock().unwrap().push("init_and_apply");
        *self.applied_vars.lock().unwrap() = Some(vars.clone());
        self.apply.clone()
    }

    async fn destroy(&self, _vars: &BTreeMap<String, String>) -> CollabResult<()> {
        self.calls.lock().unwrap().push("destroy");
        self.destroy.clone()
    }

    async fn outputs(&self) -> CollabResult<ProvisionOutputs> {
        self.calls.lock().unwrap().push("outputs");
        self.outputs.clone()
    }
}

// ---------------------------------------------------------------------------
// FakeSsh
// ---------------------------------------------------------------------------

/// One recorded SSH invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCall {
    /// Jump host, for `run_via`.
    pub via: Option<String>,
    pub host: String,
    /// None for a bare connectivity check.
    pub command: Option<String>,
}

/// SSH client answering commands from a script.
#[derive(Debug, Default)]
pub struct FakeSsh {
    unreachable: Mutex<HashMap<String, CollabError>>,
    responses: Mutex<HashMap<String, VecDeque<CollabResult<String>>>>,
    calls: Mutex<Vec<SshCall>>,
}

impl FakeSsh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `command`. The last queued response repeats.
    pub fn respond(self, command: &str, output: &str) -> Self {
        self.push(command, Ok(output.to_string()));
        self
    }

    /// Queue a failure for `command`.
    pub fn fail(self, command: &str, message: &str) -> Self {
        self.push(command, Err(CollabError::new("ssh", message)));
        self
    }

    /// Make connections to `hostname` fail.
    pub fn unreachable(self, hostname: &str) -> Self {
        self.unreachable.lock().unwrap().insert(
            hostname.to_string(),
            CollabError::new("ssh", format!("connect to host {hostname} port 22: Connection timed out")),
        );
        self
    }

    fn push(&self, command: &str, result: CollabResult<String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<SshCall> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, via: Option<&Host>, host: &Host, command: &str) -> CollabResult<String> {
        self.calls.lock().unwrap().push(SshCall {
            via: via.map(|h| h.hostname.clone()),
            host: host.hostname.clone(),
            command: Some(command.to_string()),
        });
        for h in via.into_iter().chain(std::iter::once(host)) {
            if let Some(err) = self.unreachable.lock().unwrap().get(&h.hostname) {
                return Err(err.clone());
            }
        }
        let mut responses = self.responses.lock().unwrap();
        responses
            .get_mut(command)
            .and_then(next_response)
            .unwrap_or_else(|| {
                Err(CollabError::new(
                    "ssh",
                    format!("no scripted response for {command:?}"),
                ))
            })
    }
}

#[async_trait]
impl SshClient for FakeSsh {
    async fn check_connection(&self, host: &Host) -> CollabResult<()> {
        self.calls.lock().unwrap().push(SshCall {
            via: None,
            host: host.hostname.clone(),
            command: None,
        });
        match self.unreachable.lock().unwrap().get(&host.hostname) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn run(&self, host: &Host, command: &str) -> CollabResult<String> {
        self.answer(None, host, command)
    }

    async fn run_via(&self, jump: &Host, target: &Host, command: &str) -> CollabResult<String> {
        self.answer(Some(jump), target, command)
    }
}

// ---------------------------------------------------------------------------
// FakeHttp
// ---------------------------------------------------------------------------

/// HTTP probe returning scripted bodies.
#[derive(Debug, Default)]
pub struct FakeHttp {
    responses: Mutex<VecDeque<CollabResult<String>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a body. The last queued response repeats.
    pub fn respond(self, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(body.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(CollabError::new("http", message)));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpProbe for FakeHttp {
    async fn get_body(&self, url: &str) -> CollabResult<String> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        next_response(&mut *responses)
            .unwrap_or_else(|| Err(CollabError::new("http", format!("no scripted response for {url}"))))
    }
}

// ---------------------------------------------------------------------------
// FakeCloud
// ---------------------------------------------------------------------------

/// Cloud API backed by fixed VCN, subnet and availability-domain data.
#[derive(Debug, Default)]
pub struct FakeCloud {
    vcns: Vec<Vcn>,
    domains: Vec<AvailabilityDomain>,
    subnets: HashMap<String, Vec<Subnet>>,
    failure: Option<CollabError>,
    calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vcn(mut self, id: &str, display_name: &str, cidr_block: &str) -> Self {
        self.vcns.push(Vcn {
            id: id.to_string(),
            display_name: display_name.to_string(),
            cidr_block: cidr_block.to_string(),
        });
        self
    }

    /// Give `vcn_id` `count` subnets.
    pub fn with_subnets(mut self, vcn_id: &str, count: usize) -> Self {
        let subnets = (0..count)
            .map(|i| Subnet {
                id: format!("{vcn_id}.subnet{i}"),
                vcn_id: vcn_id.to_string(),
                display_name: format!("subnet-{i}"),
            })
            .collect();
        self.subnets.insert(vcn_id.to_string(), subnets);
        self
    }

    pub fn with_domain(mut self, name: &str) -> Self {
        self.domains.push(AvailabilityDomain {
            name: name.to_string(),
        });
        self
    }

    /// Make every call fail.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(CollabError::new("oci", message));
        self
    }

    /// Calls received, formatted as `method(arg)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> CollabResult<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn get_vcn(&self, vcn_id: &str) -> CollabResult<Vcn> {
        self.record(format!("get_vcn({vcn_id})"))?;
        self.vcns
            .iter()
            .find(|v| v.id == vcn_id)
            .cloned()
            .ok_or_else(|| CollabError::new("oci", format!("NotAuthorizedOrNotFound: {vcn_id}")))
    }

    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> CollabResult<Vec<AvailabilityDomain>> {
        self.record(format!("list_availability_domains({compartment_id})"))?;
        Ok(self.domains.clone())
    }

    async fn list_vcns(&self, compartment_id: &str) -> CollabResult<Vec<Vcn>> {
        self.record(format!("list_vcns({compartment_id})"))?;
        Ok(self.vcns.clone())
    }

    async fn list_subnets(&self, _compartment_id: &str, vcn_id: &str) -> CollabResult<Vec<Subnet>> {
        self.record(format!("list_subnets({vcn_id})"))?;
        Ok(self.subnets.get(vcn_id).cloned().unwrap_or_default())
    }
}

/// Hands out the same `FakeCloud` for every profile and records which
/// profiles were requested.
#[derive(Debug)]
pub struct FakeCloudFactory {
    api: Arc<FakeCloud>,
    profiles: Mutex<Vec<CredentialProfile>>,
}

impl FakeCloudFactory {
    pub fn new(api: FakeCloud) -> Self {
        Self {
            api: Arc::new(api),
            profiles: Mutex::new(Vec::new()),
        }
    }

    pub fn api(&self) -> &FakeCloud {
        &self.api
    }

    pub fn profiles(&self) -> Vec<CredentialProfile> {
        self.profiles.lock().unwrap().clone()
    }
}

impl CloudApiFactory for FakeCloudFactory {
    fn connect(&self, profile: &CredentialProfile) -> CollabResult<Arc<dyn CloudApi>> {
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(self.api.clone())
    }
}

// ---------------------------------------------------------------------------
// Context helper
// ---------------------------------------------------------------------------

/// Build a context over fakes with default expectations.
pub fn fake_context(
    config: RunConfig,
    ssh: Arc<FakeSsh>,
    http: Arc<FakeHttp>,
    cloud: Arc<FakeCloudFactory>,
) -> CheckContext {
    CheckContext::new(
        config,
        Expectations::default(),
        Collaborators { ssh, http, cloud },
    )
}
