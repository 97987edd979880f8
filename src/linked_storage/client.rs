//! Linked storage accounts management-plane client
//!
//! The `LinkedStorageAccountsClient` trait is the seam between the
//! lifecycle hooks and Azure Resource Manager; `AzureLinkedStorageAccountsClient`
//! implements it over the ARM REST API.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::ids::DataSourceTypeId;
use super::models::LinkedStorageAccountsResource;
use crate::auth::provider::{AzureAuthProvider, MANAGEMENT_SCOPE};
use crate::config::Config;
use crate::error::{LalinkError, Result};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};
use crate::utils::retry::{retry_with_backoff, RetryOptions};

/// Management-plane operations on a linked storage account.
///
/// A missing resource is reported as `LalinkError::NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkedStorageAccountsClient: Send + Sync {
    async fn get(&self, id: &DataSourceTypeId) -> Result<LinkedStorageAccountsResource>;

    async fn create_or_update(
        &self,
        id: &DataSourceTypeId,
        parameters: &LinkedStorageAccountsResource,
    ) -> Result<LinkedStorageAccountsResource>;

    async fn delete(&self, id: &DataSourceTypeId) -> Result<()>;
}

/// ARM REST implementation
pub struct AzureLinkedStorageAccountsClient {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    endpoint: String,
    api_version: String,
    retry_options: RetryOptions,
}

impl AzureLinkedStorageAccountsClient {
    pub fn new(auth_provider: Arc<dyn AzureAuthProvider>, config: &Config) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::default())?;

        debug!(
            endpoint = %config.resource_manager_endpoint,
            tenant = auth_provider.tenant_id().unwrap_or("<default>"),
            "Creating linked storage accounts client"
        );

        Ok(Self {
            auth_provider,
            http_client,
            endpoint: config.resource_manager_endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            retry_options: RetryOptions::default(),
        })
    }

    pub fn with_retry_options(mut self, retry_options: RetryOptions) -> Self {
        self.retry_options = retry_options;
        self
    }

    async fn create_headers(&self) -> Result<HeaderMap> {
        let token = self.auth_provider.get_token(&[MANAGEMENT_SCOPE]).await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", token.token.secret())
                .parse()
                .map_err(|e| LalinkError::authentication(format!("Invalid token format: {}", e)))?,
        );
        Ok(headers)
    }

    fn build_url(&self, id: &DataSourceTypeId) -> String {
        format!("{}{}?api-version={}", self.endpoint, id, self.api_version)
    }

    /// Map a non-success response onto the error taxonomy
    async fn error_from_response(&self, id: &DataSourceTypeId, response: Response) -> LalinkError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return LalinkError::not_found(id.to_string());
        }

        let body = response.text().await.unwrap_or_default();
        parse_azure_error(status.as_u16(), &body)
    }

    async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        retry_with_backoff(operation, self.retry_options.clone()).await
    }
}

/// Unpack an ARM error body of the form `{"error": {"code", "message"}}`
pub fn parse_azure_error(status: u16, body: &str) -> LalinkError {
    if let Ok(error_json) = serde_json::from_str::<Value>(body) {
        if let Some(error) = error_json.get("error") {
            let code = error.get("code").and_then(|c| c.as_str());
            let message = error.get("message").and_then(|m| m.as_str());
            match (code, message) {
                (Some(code), Some(message)) => {
                    return LalinkError::azure_api(status, format!("{}: {}", code, message))
                }
                (None, Some(message)) => return LalinkError::azure_api(status, message),
                _ => {}
            }
        }
    }
    LalinkError::azure_api(status, body)
}

#[async_trait]
impl LinkedStorageAccountsClient for AzureLinkedStorageAccountsClient {
    async fn get(&self, id: &DataSourceTypeId) -> Result<LinkedStorageAccountsResource> {
        let operation = || async {
            let headers = self.create_headers().await?;
            let url = self.build_url(id);
            debug!("GET {}", url);

            let response = self
                .http_client
                .get(&url)
                .headers(headers)
                .send()
                .await
                .map_err(|e| classify_network_error(&e, &url))?;

            if !response.status().is_success() {
                return Err(self.error_from_response(id, response).await);
            }

            response.json::<LinkedStorageAccountsResource>().await.map_err(|e| {
                LalinkError::serialization(format!(
                    "Failed to parse linked storage account response: {}",
                    e
                ))
            })
        };

        self.execute_with_retry(operation).await
    }

    async fn create_or_update(
        &self,
        id: &DataSourceTypeId,
        parameters: &LinkedStorageAccountsResource,
    ) -> Result<LinkedStorageAccountsResource> {
        let operation = || async {
            let headers = self.create_headers().await?;
            let url = self.build_url(id);
            debug!("PUT {}", url);

            let response = self
                .http_client
                .put(&url)
                .headers(headers)
                .json(parameters)
                .send()
                .await
                .map_err(|e| classify_network_error(&e, &url))?;

            if !response.status().is_success() {
                return Err(self.error_from_response(id, response).await);
            }

            response.json::<LinkedStorageAccountsResource>().await.map_err(|e| {
                LalinkError::serialization(format!(
                    "Failed to parse linked storage account response: {}",
                    e
                ))
            })
        };

        self.execute_with_retry(operation).await
    }

    async fn delete(&self, id: &DataSourceTypeId) -> Result<()> {
        let operation = || async {
            let headers = self.create_headers().await?;
            let url = self.build_url(id);
            debug!("DELETE {}", url);

            let response = self
                .http_client
                .delete(&url)
                .headers(headers)
                .send()
                .await
                .map_err(|e| classify_network_error(&e, &url))?;

            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                _ => Err(self.error_from_response(id, response).await),
            }
        };

        self.execute_with_retry(operation).await
    }
}
