//! Direct HTTP probing with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use websmoke_core::{CollabResult, HttpProbe};

use crate::error::ToolResult;

/// GETs a URL and hands back the body whatever the status code.
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> ToolResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> ToolResult<String> {
        let response = self.client.get(url).send().await?;
        debug!(url, status = %response.status(), "http");
        Ok(response.text().await?)
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get_body(&self, url: &str) -> CollabResult<String> {
        Ok(self.fetch(url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_is_http_error() {
        let probe = ReqwestProbe::new(Duration::from_secs(2)).unwrap();
        // port 9 on loopback is expected to refuse
        let err = probe.get_body("http://127.0.0.1:9/").await.unwrap_err();
        assert_eq!(err.tool, "http");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let probe = ReqwestProbe::new(Duration::from_secs(2)).unwrap();
        assert!(probe.get_body("not a url").await.is_err());
    }
}
