//! Headscale REST client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::trace;

use crate::config::InventoryConfig;
use crate::error::InventoryError;
use crate::inventory::{
    CreateUserRequest, CreateUserResponse, GetNodeResponse, HealthResponse, InventoryClient,
    ListNodesResponse, Node, User,
};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`InventoryClient`] speaking the Headscale `/api/v1` REST API.
#[derive(Debug, Clone)]
pub struct HeadscaleClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl HeadscaleClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, InventoryError> {
        Self::with_timeout(base_url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InventoryError> {
        // A trailing slash makes `Url::join` append instead of replacing the last segment.
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url =
            Url::parse(&base).map_err(|e| InventoryError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(InventoryError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    /// Create a client from the inventory section of the configuration.
    pub fn from_config(config: &InventoryConfig) -> Result<Self, InventoryError> {
        Self::with_timeout(&config.url, config.api_key.clone(), config.request_timeout())
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, InventoryError> {
        self.base_url
            .join(path)
            .map_err(|e| InventoryError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Send an authenticated request and decode a JSON body from a 200 response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, InventoryError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();

        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        trace!(status = %status, len = bytes.len(), "inventory response");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl InventoryClient for HeadscaleClient {
    async fn list_nodes(&self, user_filter: Option<&str>) -> Result<Vec<Node>, InventoryError> {
        let mut request = self.http.get(self.url("api/v1/node")?);
        if let Some(user) = user_filter.filter(|u| !u.is_empty()) {
            request = request.query(&[("user", user)]);
        }

        let resp: ListNodesResponse = self.send(request).await?;
        Ok(resp.nodes)
    }

    async fn get_node(&self, node_id: &str) -> Result<Node, InventoryError> {
        let url = self.url(&format!("api/v1/node/{node_id}"))?;
        let resp: GetNodeResponse = self.send(self.http.get(url)).await?;
        Ok(resp.node)
    }

    async fn health(&self) -> Result<HealthResponse, InventoryError> {
        let url = self.url("api/v1/health")?;
        self.send(self.http.get(url)).await
    }

    async fn create_user(&self, request: &CreateUserRequest) -> Result<User, InventoryError> {
        let url = self.url("api/v1/user")?;
        let resp: CreateUserResponse = self.send(self.http.post(url).json(request)).await?;
        Ok(resp.user)
    }
}
