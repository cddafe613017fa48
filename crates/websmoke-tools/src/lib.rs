//! Tool-driven collaborators for websmoke.
//!
//! - [`TerraformCli`]: provisioner over the `terraform` binary
//! - [`OpenSshClient`]: SSH sessions over `ssh`, with ProxyCommand jumps
//! - [`OciCli`]: cloud API calls over the `oci` CLI
//! - [`ReqwestProbe`]: direct HTTP GETs

pub mod error;
pub mod http;
pub mod oci;
pub mod process;
pub mod ssh;
pub mod terraform;

pub use error::{ToolError, ToolResult};
pub use http::ReqwestProbe;
pub use oci::{OciCli, OciCliFactory};
pub use process::{execute, execute_stdout, ToolCommand, ToolOutput, ToolSettings};
pub use ssh::OpenSshClient;
pub use terraform::TerraformCli;
