//! Google Cloud Storage backend: JSON API listing and V4 URL signing.

use crate::signing::V4Signer;
use crate::{ObjectStore, StorageError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

const LIST_ENDPOINT: &str = "https://storage.googleapis.com/storage/v1/b";
const READ_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Refresh the bearer token this long before Google says it expires.
const TOKEN_SLACK_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, StorageError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            StorageError::Credentials(format!("malformed key file {}: {e}", path.display()))
        })
    }
}

#[derive(Clone, Debug)]
pub struct GcsConfig {
    pub bucket: String,
    pub credentials_path: PathBuf,
    pub timeout: Duration,
}

struct BearerToken {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct GcsStore {
    client: Client,
    bucket: String,
    key: ServiceAccountKey,
    signer: V4Signer,
    token: Mutex<Option<BearerToken>>,
}

impl GcsStore {
    pub fn new(cfg: GcsConfig) -> Result<Self, StorageError> {
        let key = ServiceAccountKey::from_file(&cfg.credentials_path)?;
        Self::with_key(&cfg.bucket, key, cfg.timeout)
    }

    pub fn with_key(
        bucket: &str,
        key: ServiceAccountKey,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        if bucket.trim().is_empty() {
            return Err(StorageError::Credentials("bucket name is empty".into()));
        }
        let signer = V4Signer::from_pem(&key.client_email, &key.private_key)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;
        info!(bucket = %bucket, account = %key.client_email, "GCS client initialized");
        Ok(Self {
            client,
            bucket: bucket.to_string(),
            key,
            signer,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, StorageError> {
        let mut guard = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = guard.as_ref() {
            if token.expires_at > now {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.exchange_assertion(now).await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    async fn exchange_assertion(&self, now: DateTime<Utc>) -> Result<BearerToken, StorageError> {
        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            scope: &'a str,
            aud: &'a str,
            iat: i64,
            exp: i64,
        }
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: READ_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + 3600,
        };
        let encoding = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StorageError::Credentials(e.to_string()))?;
        let assertion = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &encoding,
        )
        .map_err(|e| StorageError::Credentials(e.to_string()))?;

        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(StorageError::Credentials(format!(
                "token exchange status {} body {:?}",
                status, body
            )));
        }
        let parsed: TokenResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        debug!(expires_in = parsed.expires_in, "obtained GCS access token");
        Ok(BearerToken {
            value: parsed.access_token,
            expires_at: now + chrono::Duration::seconds(parsed.expires_in - TOKEN_SLACK_SECS),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    items: Vec<ListItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
}

#[async_trait::async_trait]
impl ObjectStore for GcsStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let token = self.access_token().await?;
        let url = format!("{}/{}/o", LIST_ENDPOINT, urlencoding::encode(&self.bucket));
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("prefix", prefix.to_string()),
                ("fields", "items(name),nextPageToken".to_string()),
            ];
            if let Some(t) = &page_token {
                query.push(("pageToken", t.clone()));
            }
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&token)
                .query(&query)
                .send()
                .await
                .map_err(|e| StorageError::RequestFailed(e.to_string()))?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
                return Err(StorageError::RequestFailed(format!(
                    "status {} body {:?}",
                    status, body
                )));
            }
            let page: ListPage = resp
                .json()
                .await
                .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
            names.extend(page.items.into_iter().map(|i| i.name));
            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }
        debug!(prefix = %prefix, count = names.len(), "listed objects");
        Ok(names)
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        self.signer.sign_url(bucket, key, ttl, issued_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TEST_KEY: &str = include_str!("../tests/fixtures/test_key.pem");

    fn write_key_file(dir: &Path, with_token_uri: bool) -> PathBuf {
        let mut doc = serde_json::json!({
            "type": "service_account",
            "client_email": "reader@demo.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        });
        if with_token_uri {
            doc["token_uri"] = serde_json::json!("https://example.test/token");
        }
        let path = dir.join("key.json");
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    #[test]
    fn key_file_defaults_token_uri() {
        let temp = tempdir().unwrap();
        let key = ServiceAccountKey::from_file(&write_key_file(temp.path(), false)).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        let key = ServiceAccountKey::from_file(&write_key_file(temp.path(), true)).unwrap();
        assert_eq!(key.token_uri, "https://example.test/token");
    }

    #[test]
    fn missing_key_file_is_credentials_error() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(matches!(err, StorageError::Credentials(_)));
    }

    #[tokio::test]
    async fn signing_needs_no_network() {
        let temp = tempdir().unwrap();
        let store = GcsStore::new(GcsConfig {
            bucket: "scene-music".into(),
            credentials_path: write_key_file(temp.path(), false),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(store.bucket(), "scene-music");
        let url = store
            .signed_url(
                "scene-music",
                "World_mp3/Caravan.mp3",
                Duration::from_secs(3600),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(url.contains("/scene-music/World_mp3/Caravan.mp3?"));
    }

    #[test]
    fn empty_bucket_is_rejected() {
        let key = ServiceAccountKey {
            client_email: "reader@demo.iam.gserviceaccount.com".into(),
            private_key: TEST_KEY.into(),
            token_uri: DEFAULT_TOKEN_URI.into(),
        };
        assert!(GcsStore::with_key("  ", key, Duration::from_secs(1)).is_err());
    }
}
