use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("gateway unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub message: String,
    pub name: String,
    pub is_healthy: bool,
    pub updated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub name: String,
    pub id: String,
    pub url: String,
    pub is_healthy: bool,
    pub last_health_check: Option<u64>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnswer {
    pub is_healthy: bool,
}

/// Thin wrapper over the gateway's `/services` endpoints.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    gateway_url: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self::with_client(Client::new(), gateway_url)
    }

    pub fn with_client(client: Client, gateway_url: &str) -> Self {
        Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Register `url` as an instance of `name`. Registering the same URL twice
    /// returns the existing instance.
    pub async fn register(&self, name: &str, url: &str) -> Result<RegisterResponse, SdkError> {
        let resp = self
            .client
            .post(format!("{}/services/register", self.gateway_url))
            .json(&json!({ "name": name, "url": url }))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    /// Push a health status for `name`. With `url` only that instance is updated.
    pub async fn report_health(
        &self,
        name: &str,
        status: &str,
        url: Option<&str>,
    ) -> Result<ReportResponse, SdkError> {
        let resp = self
            .client
            .post(format!("{}/services/health/{}", self.gateway_url, name))
            .json(&json!({ "status": status, "url": url }))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceEntry>, SdkError> {
        let resp = self
            .client
            .get(format!("{}/services", self.gateway_url))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    /// Ask the gateway to probe `name` now.
    pub async fn check_health(&self, name: &str) -> Result<bool, SdkError> {
        let resp = self
            .client
            .get(format!("{}/services/{}/health", self.gateway_url, name))
            .send()
            .await?;
        let answer: HealthAnswer = checked(resp).await?.json().await?;
        Ok(answer.is_healthy)
    }

    pub async fn unregister(&self, name: &str, id: &str) -> Result<(), SdkError> {
        let resp = self
            .client
            .delete(format!("{}/services/{}/{}", self.gateway_url, name, id))
            .send()
            .await?;
        checked(resp).await?;
        Ok(())
    }
}

async fn checked(resp: Response) -> Result<Response, SdkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SdkError::Status { status, body })
}
