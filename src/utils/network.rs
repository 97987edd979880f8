use crate::error::{LalinkError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for the HTTP client talking to Azure Resource Manager
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("lalink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| LalinkError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a transport failure into an error that says which endpoint was involved
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> LalinkError {
    let host = extract_host_from_url(url);

    if error.is_timeout() {
        return LalinkError::connection_timeout(format!(
            "Request to '{}' timed out.",
            host
        ));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return LalinkError::network(format!(
                "Unable to resolve '{}'. Check the resource manager endpoint in your configuration.",
                host
            ));
        }

        return LalinkError::network(format!(
            "Failed to connect to '{}'. Please check your network connection.",
            host
        ));
    }

    if let Some(status) = error.status() {
        if matches!(status.as_u16(), 502..=504) {
            return LalinkError::network(format!(
                "Gateway error ({}) from '{}'; the service may be temporarily unavailable.",
                status.as_u16(),
                host
            ));
        }
    }

    LalinkError::network(format!("Network error when calling '{}': {}", host, error))
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "name or service not known",
        "nodename nor servname provided",
        "no such host",
        "could not resolve host",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}

fn extract_host_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// Check if an error is transient enough to retry at the transport level
pub fn is_retryable_error(error: &LalinkError) -> bool {
    match error {
        LalinkError::ConnectionTimeout(_) => true,
        LalinkError::NetworkError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("temporarily")
                || msg_lower.contains("gateway")
        }
        LalinkError::AzureApiError { status, .. } => matches!(status, 429 | 502 | 503 | 504),
        _ => false,
    }
}
