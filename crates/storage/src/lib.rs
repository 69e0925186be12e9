//! Storage layer: remote object-store capability.
//!
//! Holds the `ObjectStore` trait used by the catalog and the link issuer,
//! the Google Cloud Storage client, and an in-memory store.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

pub mod gcs;
pub mod memory;
pub mod signing;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credentials: {0}")]
    Credentials(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("ttl of {0}s is outside the signable range")]
    InvalidTtl(u64),
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store is bound to.
    fn bucket(&self) -> &str;

    /// Object keys under `prefix`, in the order the backend returns them.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// A GET URL for `key` in `bucket`, valid for `ttl` starting at `issued_at`.
    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, StorageError>;
}

/// Percent-encodes each path segment of an object key, keeping `/` separators.
pub fn encode_object_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
