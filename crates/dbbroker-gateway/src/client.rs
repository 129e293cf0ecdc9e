use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use dbbroker_core::{
    Account, CreatedInstance, Database, GatewayError, NewInstance, Operation, RemoteGateway,
    Scaling, ServiceInstance,
};

use crate::wire::{
    AccountList, ApplicationList, CreateRequest, DeploymentEnvelope, DeploymentList, Embedded,
    RecipeList, RecipeRef, ScalingUnits,
};

/// Default provider API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.compose.io/2016-07";

/// Response statuses that are retried before giving up.
pub const RETRY_STATUS_CODES: [StatusCode; 6] = [
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Configuration for [`ProviderClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the provider API, without trailing slash.
    pub base_url: String,

    /// Bearer token sent with every request.
    pub token: String,

    /// Number of retries after the first attempt (default: 3).
    pub retries: u32,

    /// Pause between attempts (default: 3 seconds).
    pub retry_interval: Duration,

    /// Per-request timeout (default: 33 seconds).
    pub timeout: Duration,

    /// Accept invalid TLS certificates. Only meant for test setups.
    pub skip_ssl_validation: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            retries: 3,
            retry_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(33),
            skip_ssl_validation: false,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url).with_token(token)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_skip_ssl_validation(mut self, skip: bool) -> Self {
        self.skip_ssl_validation = skip;
        self
    }
}

/// HTTP client for the provider API.
///
/// Requests are issued one at a time: the lock is held for the whole retry
/// cycle of a request.
pub struct ProviderClient {
    http: reqwest::Client,
    config: ClientConfig,
    lock: Mutex<()>,
}

impl ProviderClient {
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .build()
            .map_err(|e| GatewayError::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            lock: Mutex::new(()),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url, endpoint)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Accept", "application/json")
    }

    /// Issue a request and return the raw body of a successful response.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, GatewayError> {
        let url = self.url(endpoint);
        let _guard = self.lock.lock().await;

        let mut attempt: u32 = 0;
        loop {
            tracing::debug!(method = %method, url = %url, attempt, "Provider API request");

            let mut req = self.request(method.clone(), &url);
            if let Some(body) = &body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if RETRY_STATUS_CODES.contains(&status) && attempt < self.config.retries {
                        attempt += 1;
                        tracing::warn!(
                            method = %method,
                            url = %url,
                            status = status.as_u16(),
                            attempt,
                            "Transient provider response, retrying"
                        );
                        tokio::time::sleep(self.config.retry_interval).await;
                        continue;
                    }

                    let text = resp.text().await.map_err(|e| {
                        GatewayError::transport(format!("Failed to read response body: {e}"))
                    })?;
                    return handle_response(status, text);
                }
                Err(err) if is_transient(&err) && attempt < self.config.retries => {
                    attempt += 1;
                    tracing::warn!(
                        method = %method,
                        url = %url,
                        error = %err,
                        attempt,
                        "Provider API unreachable, retrying"
                    );
                    tokio::time::sleep(self.config.retry_interval).await;
                }
                Err(err) => {
                    return Err(GatewayError::transport(format!(
                        "{method} {url} failed: {err}"
                    )));
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GatewayError> {
        let body = self.send(Method::GET, endpoint, None).await?;
        decode(&body)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &B,
    ) -> Result<T, GatewayError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| GatewayError::decode(format!("Failed to encode request: {e}")))?;
        let body = self.send(Method::POST, endpoint, Some(payload)).await?;
        decode(&body)
    }

    async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GatewayError> {
        let body = self.send(Method::DELETE, endpoint, None).await?;
        decode(&body)
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn handle_response(status: StatusCode, body: String) -> Result<String, GatewayError> {
    if status.is_success() {
        return Ok(body);
    }
    let err = GatewayError::status(status.as_u16(), &body);
    tracing::error!(status = status.as_u16(), error = %err, "Provider API request failed");
    Err(err)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, body = %body, "Could not decode provider response");
        GatewayError::decode(e.to_string())
    })
}

#[async_trait]
impl RemoteGateway for ProviderClient {
    async fn list_instances(&self) -> Result<Vec<ServiceInstance>, GatewayError> {
        let list: Embedded<DeploymentList> = self.get("deployments").await?;
        Ok(list.embedded.deployments)
    }

    async fn get_instance(&self, instance_id: &str) -> Result<ServiceInstance, GatewayError> {
        self.get(&format!("deployments/{instance_id}")).await
    }

    async fn create_instance(&self, params: &NewInstance) -> Result<CreatedInstance, GatewayError> {
        let mut instance: ServiceInstance = self
            .post("deployments", &CreateRequest { deployment: params })
            .await?;
        let operation_id = instance.provision_recipe_id.take().filter(|id| !id.is_empty());
        Ok(CreatedInstance {
            instance,
            operation_id,
        })
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<Option<String>, GatewayError> {
        let recipe: RecipeRef = self.delete(&format!("deployments/{instance_id}")).await?;
        Ok(recipe.into_id())
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Operation, GatewayError> {
        self.get(&format!("recipes/{operation_id}")).await
    }

    async fn list_operations(&self, instance_id: &str) -> Result<Vec<Operation>, GatewayError> {
        let list: Embedded<RecipeList> =
            self.get(&format!("deployments/{instance_id}/recipes")).await?;
        Ok(list.embedded.recipes)
    }

    async fn get_scaling(&self, instance_id: &str) -> Result<Scaling, GatewayError> {
        self.get(&format!("deployments/{instance_id}/scalings")).await
    }

    async fn set_scaling(
        &self,
        instance_id: &str,
        units: i64,
    ) -> Result<Option<String>, GatewayError> {
        let recipe: RecipeRef = self
            .post(
                &format!("deployments/{instance_id}/scalings"),
                &DeploymentEnvelope {
                    deployment: ScalingUnits { units },
                },
            )
            .await?;
        Ok(recipe.into_id())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, GatewayError> {
        let list: Embedded<AccountList> = self.get("accounts").await?;
        Ok(list.embedded.accounts)
    }

    async fn list_databases(&self) -> Result<Vec<Database>, GatewayError> {
        let list: Embedded<ApplicationList> = self.get("databases").await?;
        Ok(list.embedded.applications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_interval, Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(33));
        assert!(!config.skip_ssl_validation);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://localhost:9999/api/", "deadbeef");
        assert_eq!(config.base_url, "http://localhost:9999/api");

        let client = ProviderClient::new(config).unwrap();
        assert_eq!(
            client.url("deployments/1"),
            "http://localhost:9999/api/deployments/1"
        );
    }

    #[test]
    fn non_success_status_is_decoded() {
        let err = handle_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"errors":"Units must be positive"}"#.to_string(),
        )
        .unwrap_err();
        assert_eq!(err.status_code(), Some(422));
        assert!(err.to_string().contains("Units must be positive"));

        assert_eq!(
            handle_response(StatusCode::ACCEPTED, "{}".to_string()).unwrap(),
            "{}"
        );
    }
}
