use async_trait::async_trait;
use log::{error, info, warn};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{BlobConfig, S3Config};

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("not_found")]
    NotFound,
    #[error("invalid path '{0}'")]
    InvalidPath(String),
    #[error("other: {0}")]
    Other(String),
}

/// Binary storage for uploaded photos and media.
///
/// Paths are content addressed (see [`content_path`]) so uploading the same
/// bytes twice is idempotent and yields the same public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` and returns its public URL.
    async fn upload(&self, path: &str, mime: &str, bytes: &[u8]) -> Result<String, BlobStoreError>;
    async fn fetch(&self, path: &str) -> Result<(Vec<u8>, String), BlobStoreError>;
    fn public_url(&self, path: &str) -> String;
}

/// `{prefix}/{first two hex chars}/{sha256}`
pub fn content_path(prefix: &str, bytes: &[u8]) -> String {
    let hash = format!("{:x}", Sha256::digest(bytes));
    format!("{}/{}/{}", prefix, &hash[0..2], hash)
}

pub fn sniff_mime(bytes: &[u8]) -> String {
    infer::get(bytes)
        .map(|t| t.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".into())
}

fn join_url(base: &str, path: &str) -> String {
    let encoded: Vec<String> = path.split('/').map(|seg| urlencoding::encode(seg).into_owned()).collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}

fn check_path(path: &str) -> Result<(), BlobStoreError> {
    let p = Path::new(path);
    let clean = !path.is_empty()
        && p.components().all(|c| matches!(c, Component::Normal(_)));
    if clean { Ok(()) } else { Err(BlobStoreError::InvalidPath(path.to_string())) }
}

// ---------------- Local filesystem implementation (dev / single node) ----------------
pub struct FsBlobStore {
    root: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self { root: root.into(), public_base: public_base.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, path: &str, _mime: &str, bytes: &[u8]) -> Result<String, BlobStoreError> {
        check_path(path)?;
        let full = self.root.join(path);
        if tokio::fs::try_exists(&full).await.unwrap_or(false) {
            return Ok(self.public_url(path));
        }
        if let Some(dir) = full.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| BlobStoreError::Other(e.to_string()))?;
        }
        tokio::fs::write(&full, bytes).await.map_err(|e| {
            error!("write failed path={} err={e}", full.display());
            BlobStoreError::Other(e.to_string())
        })?;
        Ok(self.public_url(path))
    }
    async fn fetch(&self, path: &str) -> Result<(Vec<u8>, String), BlobStoreError> {
        check_path(path)?;
        let bytes = tokio::fs::read(self.root.join(path)).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BlobStoreError::NotFound,
            _ => BlobStoreError::Other(e.to_string()),
        })?;
        let mime = sniff_mime(&bytes);
        Ok((bytes, mime))
    }
    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base, path)
    }
}

// ---------------- S3 Implementation (MinIO compatible) ----------------
pub struct S3BlobStore {
    bucket: String,
    client: aws_sdk_s3::Client,
    public_base: String,
}

impl S3BlobStore {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        use aws_credential_types::provider::SharedCredentialsProvider;
        use aws_credential_types::Credentials;

        let bucket = cfg.bucket.clone();
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(cfg.region.clone()));
        loader = loader.endpoint_url(cfg.endpoint.clone());
        if !cfg.access_key.is_empty() && !cfg.secret_key.is_empty() {
            let creds = Credentials::new(cfg.access_key.clone(), cfg.secret_key.clone(), None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(creds));
        }
        let conf = loader.load().await;
        // MinIO without wildcard DNS needs path-style addressing
        let s3_conf = aws_sdk_s3::config::Builder::from(&conf)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_conf);
        info!("initialized S3 client endpoint={} bucket={bucket}", cfg.endpoint);

        if let Err(e) = client.head_bucket().bucket(&bucket).send().await {
            warn!("head_bucket failed for '{bucket}' (will attempt create): {e:?}");
            let mut attempt = 0u32;
            let max_attempts = 8;
            loop {
                attempt += 1;
                match client.create_bucket().bucket(&bucket).send().await {
                    Ok(_) => {
                        info!("created bucket '{bucket}' (attempt {attempt})");
                        break;
                    }
                    Err(e2) if attempt >= max_attempts => {
                        error!("create_bucket failed for '{bucket}' after {attempt} attempts: {e2:?}");
                        return Err(anyhow::anyhow!("failed to ensure bucket '{bucket}': {e2}"));
                    }
                    Err(e2) => {
                        let backoff_ms = 200 * attempt.pow(2);
                        warn!("create_bucket attempt {attempt} failed for '{bucket}': {e2:?} (retrying in {backoff_ms}ms)");
                        tokio::time::sleep(std::time::Duration::from_millis(backoff_ms as u64)).await;
                    }
                }
            }
        }

        let public_base = cfg.object_base();
        Ok(Self { bucket, client, public_base })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, path: &str, mime: &str, bytes: &[u8]) -> Result<String, BlobStoreError> {
        use aws_sdk_s3::primitives::ByteStream;
        check_path(path)?;
        if self.client.head_object().bucket(&self.bucket).key(path).send().await.is_ok() {
            return Ok(self.public_url(path));
        }
        let put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(mime);
        if let Err(e) = put.send().await {
            error!("put_object failed key={path} bucket={} err={:?}", self.bucket, e);
            let hint = if e.to_string().contains("NoSuchBucket") {
                " (bucket missing or not yet propagated)"
            } else if e.to_string().contains("AccessDenied") {
                " (check S3_ACCESS_KEY/S3_SECRET_KEY permissions)"
            } else {
                ""
            };
            return Err(BlobStoreError::Other(format!("{e}{hint}")));
        }
        Ok(self.public_url(path))
    }
    async fn fetch(&self, path: &str) -> Result<(Vec<u8>, String), BlobStoreError> {
        check_path(path)?;
        let obj = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|_| BlobStoreError::NotFound)?;
        let stored_type = obj.content_type().map(str::to_string);
        let data = obj
            .body
            .collect()
            .await
            .map_err(|e| BlobStoreError::Other(e.to_string()))?;
        let bytes = data.into_bytes().to_vec();
        let mime = stored_type.unwrap_or_else(|| sniff_mime(&bytes));
        Ok((bytes, mime))
    }
    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base, path)
    }
}

pub async fn build_blob_store(cfg: &BlobConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match cfg {
        BlobConfig::Fs { root, public_base } => {
            info!("using filesystem blob store at '{}'", root.display());
            Ok(Arc::new(FsBlobStore::new(root.clone(), public_base.clone())))
        }
        BlobConfig::S3(s3) => Ok(Arc::new(S3BlobStore::new(s3).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_path_is_sharded_by_hash() {
        let p = content_path("photos", b"hello");
        let hash = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(p, format!("photos/2c/{hash}"));
    }

    #[test]
    fn rejects_traversal() {
        assert!(check_path("../etc/passwd").is_err());
        assert!(check_path("/abs").is_err());
        assert!(check_path("").is_err());
        assert!(check_path("photos/ab/abcd").is_ok());
    }

    #[tokio::test]
    async fn fs_upload_is_idempotent_and_fetchable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/files");
        let path = content_path("media", b"bytes");
        let url1 = store.upload(&path, "text/plain", b"bytes").await.unwrap();
        let url2 = store.upload(&path, "text/plain", b"bytes").await.unwrap();
        assert_eq!(url1, url2);
        assert!(url1.starts_with("/files/media/"));
        let (bytes, _) = store.fetch(&path).await.unwrap();
        assert_eq!(bytes, b"bytes");
        assert!(matches!(store.fetch("media/00/missing").await, Err(BlobStoreError::NotFound)));
    }
}
