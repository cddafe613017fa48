//! The check battery run against a provisioned environment.

use async_trait::async_trait;

use crate::context::CheckContext;
use crate::error::CheckResult;

pub mod cloud;
pub mod http;
pub mod ssh;

pub use cloud::{AvailabilityDomains, CheckVcn, SubnetsCount};
pub use http::{curl_command, CurlWebServer, LoadBalancerCurl};
pub use ssh::{jump_command, listener_command, ServiceListener, SshBastion, SshWeb};

/// A named validation against the provisioned environment.
///
/// Any `Err` fails the check; there is no partial success.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable name used for selection and reporting.
    fn name(&self) -> &'static str;

    /// One-line summary for `websmoke list`.
    fn description(&self) -> &'static str;

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()>;
}
