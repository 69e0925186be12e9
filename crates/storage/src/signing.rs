//! V4 signed URLs for Cloud Storage (`GOOG4-RSA-SHA256`).

use crate::{encode_object_path, StorageError};
use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub const ALGORITHM: &str = "GOOG4-RSA-SHA256";
pub const STORAGE_HOST: &str = "storage.googleapis.com";
/// Longest lifetime Cloud Storage accepts for a V4 signature (7 days).
pub const MAX_TTL_SECS: u64 = 604_800;

#[derive(Clone)]
pub struct V4Signer {
    client_email: String,
    key: SigningKey<Sha256>,
}

impl V4Signer {
    /// Accepts PKCS#8 (service-account JSON) or PKCS#1 PEM keys.
    pub fn from_pem(client_email: &str, pem: &str) -> Result<Self, StorageError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| StorageError::Credentials(format!("unreadable private key: {e}")))?;
        Ok(Self {
            client_email: client_email.to_string(),
            key: SigningKey::<Sha256>::new(private),
        })
    }

    pub fn sign_url(
        &self,
        bucket: &str,
        object: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let req = CanonicalRequest::new(&self.client_email, bucket, object, ttl, issued_at)?;
        let to_sign = req.string_to_sign();
        let signature = self
            .key
            .try_sign(to_sign.as_bytes())
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        Ok(format!(
            "https://{}{}?{}&X-Goog-Signature={}",
            STORAGE_HOST,
            req.uri,
            req.query,
            hex::encode(signature.to_bytes())
        ))
    }
}

pub(crate) struct CanonicalRequest {
    uri: String,
    query: String,
    timestamp: String,
    scope: String,
}

impl CanonicalRequest {
    pub(crate) fn new(
        client_email: &str,
        bucket: &str,
        object: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        let secs = ttl.as_secs();
        if secs == 0 || secs > MAX_TTL_SECS {
            return Err(StorageError::InvalidTtl(secs));
        }
        let timestamp = issued_at.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{}/auto/storage/goog4_request", issued_at.format("%Y%m%d"));
        let credential = format!("{}/{}", client_email, scope);

        // Keys are already in sorted order.
        let query = [
            ("X-Goog-Algorithm", ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", timestamp.clone()),
            ("X-Goog-Expires", secs.to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        Ok(Self {
            uri: format!(
                "/{}/{}",
                urlencoding::encode(bucket),
                encode_object_path(object)
            ),
            query,
            timestamp,
            scope,
        })
    }

    fn canonical(&self) -> String {
        format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            self.uri, self.query, STORAGE_HOST
        )
    }

    pub(crate) fn string_to_sign(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            self.timestamp,
            self.scope,
            hex::encode(digest)
        )
    }
}
