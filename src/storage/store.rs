//! Rooted object store access (local, S3, R2, GCS, Azure)

use super::retry::{retry, RetryPolicy};
use crate::config::Credentials;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// How a root is going to be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Must already exist
    Read,
    /// Created when missing (local roots only)
    Write,
}

/// An object store rooted at a URL prefix
///
/// All paths passed to and returned from this type are relative to the root.
#[derive(Debug, Clone)]
pub struct Storage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: ObjectPath,
    /// Original URL scheme for logging
    scheme: String,
    /// Bucket or container, empty for local roots
    bucket: String,
    /// Filesystem root, for local stores only
    local_root: Option<PathBuf>,
    /// Retry settings for every call
    retry: RetryPolicy,
}

impl Storage {
    /// Parse a root URL and create the appropriate object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn open(url: &str, credentials: &Credentials, mode: AccessMode) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            Self::open_s3(rest, "s3", credentials)
        } else if let Some(rest) = url.strip_prefix("s3a://") {
            Self::open_s3(rest, "s3", credentials)
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::open_s3(rest, "r2", credentials)
        } else if let Some(rest) = url.strip_prefix("gs://") {
            Self::open_gcs(rest)
        } else if let Some(rest) = url.strip_prefix("az://") {
            Self::open_azure(rest)
        } else {
            Self::open_local(url, mode)
        }
    }

    /// Open a local directory
    pub fn local(path: impl Into<PathBuf>, mode: AccessMode) -> Result<Self> {
        let path: PathBuf = path.into();
        Self::open_local(&path.to_string_lossy(), mode)
    }

    /// Open S3 or R2
    fn open_s3(without_scheme: &str, scheme: &str, credentials: &Credentials) -> Result<Self> {
        let (bucket, prefix) = split_bucket(without_scheme);
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in {scheme} URL")));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(key) = &credentials.aws_access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &credentials.aws_secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(region) = &credentials.region {
            builder = builder.with_region(region);
        }

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        let endpoint = credentials.endpoint.clone().or_else(|| {
            (scheme == "r2")
                .then(|| std::env::var("R2_ENDPOINT_URL").ok())
                .flatten()
        });
        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, scheme, bucket, None))
    }

    /// Open GCS
    fn open_gcs(without_scheme: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(without_scheme);
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, "gs", bucket, None))
    }

    /// Open Azure Blob
    fn open_azure(without_scheme: &str) -> Result<Self> {
        let (container, prefix) = split_bucket(without_scheme);
        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, "az", container, None))
    }

    /// Open a local filesystem path
    fn open_local(path: &str, mode: AccessMode) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        let root = PathBuf::from(path);

        match mode {
            AccessMode::Write => std::fs::create_dir_all(&root).map_err(|e| {
                Error::config(format!("Output root {path} is not writable: {e}"))
            })?,
            AccessMode::Read if !root.is_dir() => {
                return Err(Error::config(format!("Input root {path} is not reachable")));
            }
            AccessMode::Read => {}
        }

        let root = root
            .canonicalize()
            .map_err(|e| Error::config(format!("Failed to resolve {path}: {e}")))?;
        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::new(Arc::new(store), "", "file", "", Some(root)))
    }

    fn new(
        store: Arc<dyn ObjectStore>,
        prefix: &str,
        scheme: &str,
        bucket: &str,
        local_root: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            prefix: ObjectPath::from(prefix),
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            local_root,
            retry: RetryPolicy::default(),
        }
    }

    /// Use a different retry policy
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Filesystem root for local stores
    pub fn local_root(&self) -> Option<&std::path::Path> {
        self.local_root.as_deref()
    }

    /// Human-readable location of a relative path, for logs and errors
    pub fn url_for(&self, path: &ObjectPath) -> String {
        let full = self.full_path(path);
        match &self.local_root {
            Some(root) => root.join(full.as_ref()).display().to_string(),
            None => format!("{}://{}/{full}", self.scheme, self.bucket),
        }
    }

    fn full_path(&self, path: &ObjectPath) -> ObjectPath {
        self.prefix.parts().chain(path.parts()).collect()
    }

    fn relative_path(&self, full: &ObjectPath) -> Option<ObjectPath> {
        full.prefix_match(&self.prefix).map(|parts| parts.collect())
    }

    /// List every object under `prefix`, sorted by path
    pub async fn list(&self, prefix: &ObjectPath) -> Result<Vec<ObjectPath>> {
        let full = self.full_path(prefix);
        let store = &self.store;
        let full_ref = &full;
        let metas = retry(&self.retry, &format!("list {}", self.url_for(prefix)), move || {
            async move {
                let metas: Vec<_> = store.list(Some(full_ref)).try_collect().await?;
                Ok::<_, Error>(metas)
            }
        })
        .await?;

        let mut paths: Vec<ObjectPath> = metas
            .iter()
            .filter_map(|meta| self.relative_path(&meta.location))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Read a whole object
    pub async fn get(&self, path: &ObjectPath) -> Result<Bytes> {
        let full = self.full_path(path);
        let store = &self.store;
        let full_ref = &full;
        retry(&self.retry, &format!("get {}", self.url_for(path)), move || async move {
            let result = store.get(full_ref).await?;
            let bytes = result.bytes().await?;
            Ok::<_, Error>(bytes)
        })
        .await
    }

    /// Write a whole object, replacing any existing one
    pub async fn put(&self, path: &ObjectPath, data: Bytes) -> Result<()> {
        let full = self.full_path(path);
        let store = &self.store;
        let full_ref = &full;
        retry(&self.retry, &format!("put {}", self.url_for(path)), move || {
            let payload = data.clone();
            async move {
                store.put(full_ref, payload.into()).await?;
                Ok::<_, Error>(())
            }
        })
        .await
    }

    /// Whether an object exists
    pub async fn exists(&self, path: &ObjectPath) -> Result<bool> {
        let full = self.full_path(path);
        let store = &self.store;
        let full_ref = &full;
        retry(&self.retry, &format!("head {}", self.url_for(path)), move || async move {
            match store.head(full_ref).await {
                Ok(_) => Ok(true),
                Err(object_store::Error::NotFound { .. }) => Ok(false),
                Err(e) => Err(Error::from(e)),
            }
        })
        .await
    }

    /// Move an object
    pub async fn rename(&self, from: &ObjectPath, to: &ObjectPath) -> Result<()> {
        let from_full = self.full_path(from);
        let to_full = self.full_path(to);
        let store = &self.store;
        let (from_ref, to_ref) = (&from_full, &to_full);
        retry(
            &self.retry,
            &format!("rename {} -> {}", self.url_for(from), self.url_for(to)),
            move || async move {
                store.rename(from_ref, to_ref).await?;
                Ok::<_, Error>(())
            },
        )
        .await
    }

    /// Delete one object, succeeding when it is already gone
    pub async fn delete(&self, path: &ObjectPath) -> Result<()> {
        let full = self.full_path(path);
        let store = &self.store;
        let full_ref = &full;
        retry(&self.retry, &format!("delete {}", self.url_for(path)), move || async move {
            match store.delete(full_ref).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
                Err(e) => Err(Error::from(e)),
            }
        })
        .await
    }

    /// Delete every object under `prefix`, returning how many were removed
    pub async fn delete_prefix(&self, prefix: &ObjectPath) -> Result<usize> {
        let paths = self.list(prefix).await?;

        for path in &paths {
            self.delete(path).await?;
        }

        // Local stores leave empty directories behind
        if let Some(root) = &self.local_root {
            let dir = self
                .full_path(prefix)
                .parts()
                .fold(root.clone(), |dir, part| dir.join(part.as_ref()));
            if dir != *root && dir.is_dir() {
                tokio::fs::remove_dir_all(&dir).await?;
            }
        }

        debug!(
            "Deleted {} objects under {}",
            paths.len(),
            self.url_for(prefix)
        );
        Ok(paths.len())
    }
}

/// Split `bucket/some/prefix/` into `("bucket", "some/prefix/")`
fn split_bucket(without_scheme: &str) -> (&str, &str) {
    match without_scheme.find('/') {
        Some(idx) => (&without_scheme[..idx], &without_scheme[idx + 1..]),
        None => (without_scheme, ""),
    }
}
