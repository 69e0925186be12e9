use crate::models::{AccessLink, Track};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use storage::signing::MAX_TTL_SECS;
use storage::{ObjectStore, StorageError};
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("ttl must be between 1s and {max}s, got {got}s")]
    InvalidTtl { got: u64, max: u64 },
    #[error("could not sign url for {path}: {source}")]
    Signing {
        path: String,
        #[source]
        source: StorageError,
    },
}

/// Issues time-limited streaming URLs. One signing attempt per call; nothing
/// is cached.
#[derive(Clone)]
pub struct AccessLinkIssuer {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    ttl: Duration,
}

impl std::fmt::Debug for AccessLinkIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLinkIssuer")
            .field("bucket", &self.bucket)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl AccessLinkIssuer {
    /// Whole seconds only; sub-second parts are rejected with the rest.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, ttl: Duration) -> Result<Self, IssuanceError> {
        let secs = ttl.as_secs();
        if secs == 0 || secs > MAX_TTL_SECS || ttl.subsec_nanos() != 0 {
            return Err(IssuanceError::InvalidTtl {
                got: secs,
                max: MAX_TTL_SECS,
            });
        }
        Ok(Self {
            store,
            bucket: bucket.to_string(),
            ttl,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn issue(&self, track: &Track) -> Result<AccessLink, IssuanceError> {
        let issued_at = Utc::now();
        let url = self
            .store
            .signed_url(&self.bucket, &track.path, self.ttl, issued_at)
            .await
            .map_err(|source| {
                error!(path = %track.path, error = %source, "signed url request failed");
                IssuanceError::Signing {
                    path: track.path.clone(),
                    source,
                }
            })?;
        let expires_at = issued_at + chrono::Duration::seconds(self.ttl.as_secs() as i64);
        info!(
            path = %track.path,
            ttl_secs = self.ttl.as_secs(),
            "issued streaming url"
        );
        Ok(AccessLink {
            track: track.clone(),
            url,
            issued_at,
            expires_at,
        })
    }
}
