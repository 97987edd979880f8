use std::time::Duration;

use thiserror::Error;

/// Main error type for lalink operations
#[derive(Debug, Error)]
pub enum LalinkError {
    #[error("validating `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("A resource with the ID \"{id}\" already exists - to be managed via this tool this resource needs to be imported into the State. Please see the resource documentation for \"{resource_type}\" for more information.")]
    AlreadyExists { resource_type: String, id: String },

    #[error("resource not found: {id}")]
    NotFound { id: String },

    #[error("{operation} {id}: {source}")]
    RemoteCall {
        operation: String,
        id: String,
        #[source]
        source: Box<LalinkError>,
    },

    #[error("parsing {input:?}: {reason}")]
    InvalidResourceId { input: String, reason: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: HTTP {status}: {message}")]
    AzureApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("State error: {0}")]
    StateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl LalinkError {
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn already_exists<T: Into<String>, S: Into<String>>(resource_type: T, id: S) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Wrap a remote failure with the operation being performed and the target id
    pub fn remote_call<O: Into<String>, S: ToString>(operation: O, id: S, source: LalinkError) -> Self {
        Self::RemoteCall {
            operation: operation.into(),
            id: id.to_string(),
            source: Box::new(source),
        }
    }

    pub fn invalid_resource_id<I: Into<String>, S: Into<String>>(input: I, reason: S) -> Self {
        Self::InvalidResourceId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout<S: Into<String>>(operation: S, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(status: u16, msg: S) -> Self {
        Self::AzureApiError {
            status,
            message: msg.into(),
        }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn state<S: Into<String>>(msg: S) -> Self {
        Self::StateError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Whether this error (or the error it wraps) is a remote 404
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::RemoteCall { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Result type alias for lalink operations
pub type Result<T> = std::result::Result<T, LalinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_call_message_carries_operation_and_id() {
        let err = LalinkError::remote_call(
            "creating/updating",
            "/subscriptions/S/resourceGroups/G",
            LalinkError::azure_api(500, "boom"),
        );
        assert_eq!(
            err.to_string(),
            "creating/updating /subscriptions/S/resourceGroups/G: Azure API error: HTTP 500: boom"
        );
    }

    #[test]
    fn test_is_not_found_looks_through_wrapping() {
        let err = LalinkError::remote_call("deleting", "id", LalinkError::not_found("id"));
        assert!(err.is_not_found());
        assert!(!LalinkError::azure_api(409, "conflict").is_not_found());
    }

    #[test]
    fn test_already_exists_mentions_import() {
        let err = LalinkError::already_exists("log_analytics_linked_storage_account", "/x");
        assert!(err.to_string().contains("needs to be imported"));
    }
}
