//! Error type definitions for the emote proxy
//!
//! Most collaborator errors never reach a client: the archival and upstream
//! paths downgrade them to missing results and the cache path downgrades them
//! to misses. Only validation and cache administration failures surface as
//! [`AppError`].

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Upstream catalog errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport level failure talking to the catalog
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status from the catalog
    #[error("HTTP error: {status} from {url}")]
    Http { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// GraphQL level errors reported in the response body
    #[error("GraphQL error: {message}")]
    GraphQl { message: String },
}

/// Durable object storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend operation failure
    #[error("{operation} failed for '{key}': {source}")]
    Backend {
        operation: &'static str,
        key: String,
        #[source]
        source: object_store::Error,
    },

    /// Invalid storage configuration
    #[error("Invalid storage configuration: {message}")]
    InvalidConfig { message: String },
}

/// Key-value cache store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis command failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Cached payload could not be (de)serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fetch failures for a single image asset
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport level failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl StorageError {
    pub(crate) fn backend(operation: &'static str, key: impl Into<String>, source: object_store::Error) -> Self {
        Self::Backend {
            operation,
            key: key.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = AppError::validation("Query parameter is required");
        assert_eq!(
            err.to_string(),
            "Validation error: Query parameter is required"
        );
    }

    #[test]
    fn test_cache_error_converts_into_app_error() {
        let err: AppError = CacheError::from(serde_json::from_str::<u32>("x").unwrap_err()).into();
        assert!(matches!(err, AppError::Cache(CacheError::Serialization(_))));
        assert!(err.to_string().starts_with("Cache error: Serialization failed"));
    }
}
