//! Object-store abstraction for published catalog documents.
//!
//! The catalog is a set of UTF-8 JSON blobs addressed by `(bucket, key)`.
//! Writes are idempotent overwrites: publishing the same document twice is
//! always safe, and last-writer-wins is the accepted behavior for concurrent
//! invocations on the same dataset (callers serialize per-dataset updates).
//!
//! Reads also cover tile-index documents (`tiles.geojson`) that live in the
//! source data bucket rather than the catalog bucket, which is why every
//! operation is bucket-qualified instead of scoped to a single bucket.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Storage backend trait for object storage.
///
/// All backends (S3, memory) implement this trait. The contract is the
/// minimal one the catalog needs: whole-object reads, idempotent overwrite
/// writes, and existence checks.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Reads an entire object.
    ///
    /// Returns `Error::NotFound` if the object doesn't exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Writes an object, overwriting any existing content.
    ///
    /// Overwrites are idempotent; there are no preconditions.
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()>;

    /// Returns whether an object exists.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

/// In-memory object store for testing.
///
/// Thread-safe via `RwLock`. Not suitable for production. Tracks the total
/// number of writes so idempotence tests can assert that a no-op run
/// performed zero writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<(String, String), Bytes>>>,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `put` calls observed since construction.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns all stored keys for a bucket, sorted.
    ///
    /// Test helper for asserting exactly which documents a run published.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.read().expect("lock poisoned");
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object not found: {bucket}/{key}")))
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let mut objects = self.objects.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects.insert((bucket.to_string(), key.to_string()), data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects.contains_key(&(bucket.to_string(), key.to_string())))
    }
}

/// S3-backed object store.
///
/// Credentials and region come from the usual `AWS_*` environment variables.
/// One underlying client is built per bucket on first use, since reads span
/// both the catalog bucket and the data buckets named by asset locations.
#[derive(Debug, Default)]
pub struct S3Store {
    clients: RwLock<HashMap<String, Arc<object_store::aws::AmazonS3>>>,
}

impl S3Store {
    /// Creates an S3 store configured from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self, bucket: &str) -> Result<Arc<object_store::aws::AmazonS3>> {
        {
            let clients = self.clients.read().map_err(|_| Error::Internal {
                message: "lock poisoned".into(),
            })?;
            if let Some(client) = clients.get(bucket) {
                return Ok(client.clone());
            }
        }

        let client = object_store::aws::AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::storage_with_source(format!("cannot open bucket {bucket}"), e))?;
        let client = Arc::new(client);

        let mut clients = self.clients.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        clients.insert(bucket.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        use object_store::ObjectStore as _;

        let client = self.client(bucket)?;
        let path = object_store::path::Path::from(key);
        let result = match client.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(Error::NotFound(format!("object not found: {bucket}/{key}")));
            }
            Err(e) => return Err(Error::storage_with_source(format!("get {bucket}/{key}"), e)),
        };

        result
            .bytes()
            .await
            .map_err(|e| Error::storage_with_source(format!("read {bucket}/{key}"), e))
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        use object_store::ObjectStore as _;

        let client = self.client(bucket)?;
        let path = object_store::path::Path::from(key);
        client
            .put(&path, data.into())
            .await
            .map_err(|e| Error::storage_with_source(format!("put {bucket}/{key}"), e))?;
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        use object_store::ObjectStore as _;

        let client = self.client(bucket)?;
        let path = object_store::path::Path::from(key);
        match client.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Error::storage_with_source(format!("head {bucket}/{key}"), e)),
        }
    }
}
