//! SSH reachability checks: bastion, jump host command, service listener.

use async_trait::async_trait;
use tracing::info;

use super::Check;
use crate::context::CheckContext;
use crate::error::{CheckError, CheckResult};
use crate::poll::poll_until;

/// Direct session to the bastion host.
pub struct SshBastion;

#[async_trait]
impl Check for SshBastion {
    fn name(&self) -> &'static str {
        "ssh_bastion"
    }

    fn description(&self) -> &'static str {
        "open an SSH session to the bastion host"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let bastion = ctx.bastion_host()?;
        ctx.collab
            .ssh
            .check_connection(&bastion)
            .await
            .map_err(|e| CheckError::connectivity(format!("ssh to bastion {}", bastion.hostname), e))?;
        info!(host = %bastion.hostname, "bastion reachable");
        Ok(())
    }
}

/// `whoami` on the first web server through the bastion.
pub struct SshWeb;

#[async_trait]
impl Check for SshWeb {
    fn name(&self) -> &'static str {
        "ssh_web"
    }

    fn description(&self) -> &'static str {
        "run whoami on a web server through the bastion"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let expected = ctx.expectations.ssh_user.clone();
        jump_command(ctx, "whoami", &expected, false).await?;
        Ok(())
    }
}

/// Counts listening sockets of the web service on the first web server.
pub struct ServiceListener;

#[async_trait]
impl Check for ServiceListener {
    fn name(&self) -> &'static str {
        "listener_nginx"
    }

    fn description(&self) -> &'static str {
        "verify the web service listens on its port"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let exp = &ctx.expectations;
        let command = listener_command(&exp.service_name, &exp.service_port);
        jump_command(ctx, &command, &exp.listener_count.to_string(), true).await?;
        Ok(())
    }
}

/// Shell pipeline that prints how many listening sockets match `service` on `port`.
pub fn listener_command(service: &str, port: &str) -> String {
    format!("sudo netstat -tnlp | grep '{service}' | grep ':{port}' | wc -l")
}

/// Run `command` on the first web server via the bastion and compare the
/// trimmed output with `expected`.
///
/// Connection failures are always polled. With `retry_on_mismatch` a wrong
/// answer is polled too; without it the first answer is final.
pub async fn jump_command(
    ctx: &CheckContext,
    command: &str,
    expected: &str,
    retry_on_mismatch: bool,
) -> CheckResult<String> {
    let bastion = ctx.bastion_host()?;
    let web = ctx.web_host()?;
    let description = format!("ssh jump to {:?} with command {:?}", web.hostname, command);
    let ssh = ctx.collab.ssh.clone();
    let (bastion, web) = (&bastion, &web);

    let out = poll_until(&ctx.poll, &description, move || {
        let ssh = ssh.clone();
        async move {
            let out = ssh
                .run_via(bastion, web, command)
                .await
                .map_err(|e| CheckError::connectivity(format!("ssh jump to {}", web.hostname), e))?;
            let out = out.trim().to_string();
            if retry_on_mismatch && out != expected {
                return Err(CheckError::mismatch("assert with retry", expected, out));
            }
            Ok::<_, CheckError>(out)
        }
    })
    .await?;

    if out != expected {
        return Err(CheckError::mismatch(
            format!("command {:?} on {}", command, web.hostname),
            expected,
            out,
        ));
    }
    info!(host = %web.hostname, command, "jump command matched");
    Ok(out)
}
