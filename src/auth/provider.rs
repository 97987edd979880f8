//! Authentication provider trait and implementations
//!
//! Bearer tokens for Azure Resource Manager come from either
//! `DefaultAzureCredential` or an explicit service principal secret.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::{ClientSecretCredential, DefaultAzureCredential, TokenCredentialOptions};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::error::{LalinkError, Result};

/// Scope requested for Azure Resource Manager calls
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;

    /// Get the tenant ID, when it is known up front
    fn tenant_id(&self) -> Option<&str>;
}

/// Default Azure Credential Provider using DefaultAzureCredential
pub struct DefaultAzureCredentialProvider {
    credential: Arc<DefaultAzureCredential>,
    tenant_id: Option<String>,
}

impl DefaultAzureCredentialProvider {
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    pub fn with_tenant(tenant_id: String) -> Result<Self> {
        Self::build(Some(tenant_id))
    }

    fn build(tenant_id: Option<String>) -> Result<Self> {
        let credential = Arc::new(
            DefaultAzureCredential::create(TokenCredentialOptions::default()).map_err(|e| {
                LalinkError::authentication(format!(
                    "Failed to create DefaultAzureCredential: {}",
                    e
                ))
            })?,
        );

        Ok(Self {
            credential,
            tenant_id,
        })
    }
}

#[async_trait]
impl AzureAuthProvider for DefaultAzureCredentialProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| LalinkError::authentication(format!("Failed to get token: {}", e)))
    }

    fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
    tenant_id: String,
}

impl ClientSecretProvider {
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Result<Self> {
        let authority_url = url::Url::parse(AUTHORITY_HOST)
            .map_err(|e| LalinkError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            tenant_id.clone(),
            client_id,
            client_secret,
        ));

        Ok(Self {
            credential,
            tenant_id,
        })
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| LalinkError::authentication(format!("Failed to get token: {}", e)))
    }

    fn tenant_id(&self) -> Option<&str> {
        Some(&self.tenant_id)
    }
}

/// Authentication provider factory
pub struct AuthProviderFactory;

impl AuthProviderFactory {
    /// Pick a service principal when a client secret is configured,
    /// otherwise fall back to the default credential chain.
    pub fn from_config(config: &Config) -> Result<Arc<dyn AzureAuthProvider>> {
        if !config.client_secret.is_empty() {
            if config.tenant_id.is_empty() || config.client_id.is_empty() {
                return Err(LalinkError::config(
                    "tenant_id and client_id are required for client secret authentication",
                ));
            }
            debug!("Using client secret credential");
            return Ok(Arc::new(ClientSecretProvider::new(
                config.tenant_id.clone(),
                config.client_id.clone(),
                config.client_secret.clone(),
            )?));
        }

        debug!("Using default Azure credential chain");
        if config.tenant_id.is_empty() {
            Ok(Arc::new(DefaultAzureCredentialProvider::new()?))
        } else {
            Ok(Arc::new(DefaultAzureCredentialProvider::with_tenant(
                config.tenant_id.clone(),
            )?))
        }
    }
}
