//! In-memory object store for offline runs and tests.

use crate::{encode_object_path, ObjectStore, StorageError};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: BTreeSet<String>,
    failing_prefixes: HashSet<String>,
    fail_signing: bool,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Self::default()
        }
    }

    pub fn with_object(mut self, key: &str) -> Self {
        self.objects.insert(key.to_string());
        self
    }

    pub fn with_objects<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Listing any prefix starting with `prefix` fails.
    pub fn fail_listing(mut self, prefix: &str) -> Self {
        self.failing_prefixes.insert(prefix.to_string());
        self
    }

    pub fn fail_signing(mut self) -> Self {
        self.fail_signing = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_prefixes
            .iter()
            .any(|p| prefix.starts_with(p.as_str()))
        {
            return Err(StorageError::RequestFailed(format!(
                "listing {prefix} unavailable"
            )));
        }
        Ok(self
            .objects
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        if self.fail_signing {
            return Err(StorageError::Signing("signing disabled".into()));
        }
        if ttl.as_secs() == 0 {
            return Err(StorageError::InvalidTtl(0));
        }
        Ok(format!(
            "memory://{}/{}?issued={}&ttl={}",
            bucket,
            encode_object_path(key),
            issued_at.timestamp(),
            ttl.as_secs()
        ))
    }
}
