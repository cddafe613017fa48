//! HTTP checks: web servers via the bastion, and the public load balancer.

use async_trait::async_trait;
use tracing::{debug, info};

use super::Check;
use crate::context::CheckContext;
use crate::error::{CheckError, CheckResult};
use crate::outputs::{self, LB_IP};
use crate::poll::poll_until;

/// `curl` every web server from the bastion until it answers with the
/// expected status code.
pub struct CurlWebServer;

#[async_trait]
impl Check for CurlWebServer {
    fn name(&self) -> &'static str {
        "curl_web_server"
    }

    fn description(&self) -> &'static str {
        "each web server answers HTTP with the expected status via the bastion"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let exp = &ctx.expectations;
        curl_service(ctx, &exp.service_name, "", &exp.service_port, &exp.http_status).await
    }
}

/// Command printing only the HTTP status code of `http://host:port{path}`.
pub fn curl_command(host: &str, port: &str, path: &str) -> String {
    format!("curl -s -o /dev/null -w '%{{http_code}}' http://{host}:{port}{path}")
}

async fn curl_service(
    ctx: &CheckContext,
    service: &str,
    path: &str,
    port: &str,
    expected_code: &str,
) -> CheckResult<()> {
    let bastion = ctx.bastion_host()?;
    let web_ips = ctx.web_server_ips()?;
    let bastion = &bastion;

    for ip in &web_ips {
        let host = outputs::strip_brackets(ip);
        let command = curl_command(&host, port, path);
        let description = format!("curl to {service} on {ip}:{port}{path}");
        let ssh = ctx.collab.ssh.clone();
        let (host, command) = (host.as_str(), command.as_str());

        poll_until(&ctx.poll, &description, move || {
            let ssh = ssh.clone();
            async move {
                let code = ssh
                    .run(bastion, command)
                    .await
                    .map_err(|e| CheckError::connectivity(format!("ssh to bastion {}", bastion.hostname), e))?;
                let code = code.trim();
                if code != expected_code {
                    return Err(CheckError::mismatch(
                        format!("{service} on {host}"),
                        expected_code,
                        code,
                    ));
                }
                Ok::<_, CheckError>(())
            }
        })
        .await?;

        info!(service, address = %ip, code = expected_code, "web server answered");
    }
    Ok(())
}

/// Direct GETs against the load balancer; every body must carry the marker.
pub struct LoadBalancerCurl;

#[async_trait]
impl Check for LoadBalancerCurl {
    fn name(&self) -> &'static str {
        "load_balancer_curl"
    }

    fn description(&self) -> &'static str {
        "load balancer responses contain the backend marker"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult<()> {
        let address = ctx.outputs()?.first(LB_IP)?;
        let url = format!("http://{}", outputs::strip_brackets(&address));
        let exp = &ctx.expectations;

        for request in 1..=exp.lb_requests {
            let body = ctx
                .collab
                .http
                .get_body(&url)
                .await
                .map_err(|e| CheckError::connectivity(format!("GET {url}"), e))?;

            if !body.contains(&exp.lb_marker) {
                return Err(CheckError::MarkerMissing {
                    url,
                    request,
                    marker: exp.lb_marker.clone(),
                });
            }
            debug!(url = %url, request, "load balancer response ok");
        }

        info!(url = %url, requests = exp.lb_requests, "load balancer responses matched");
        Ok(())
    }
}
