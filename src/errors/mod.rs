//! Centralized error handling for the emote proxy
//!
//! Errors are grouped by the collaborator that produced them so that the web
//! layer can decide which failures reach the client and which ones are
//! absorbed into "fewer results".
//!
//! # Error Categories
//!
//! - **Source Errors**: upstream catalog (7TV GraphQL) failures
//! - **Storage Errors**: durable object storage failures
//! - **Cache Errors**: key-value cache store failures
//! - **Validation Errors**: rejected request parameters
//!
//! # Usage
//!
//! ```rust
//! use emote_proxy::errors::{AppError, AppResult};
//!
//! fn parse_limit(raw: &str) -> AppResult<u32> {
//!     raw.parse().map_err(|_| AppError::validation("limit must be a number"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for upstream catalog Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for object storage Results
pub type StorageResult<T> = Result<T, StorageError>;

/// Convenience type alias for cache store Results
pub type CacheResult<T> = Result<T, CacheError>;
