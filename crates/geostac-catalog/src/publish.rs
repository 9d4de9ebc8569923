//! JSON document persistence over the object store.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use geostac_core::ObjectStore;

use crate::error::Result;

/// Serializes a document and writes it at `(bucket, key)`.
pub(crate) async fn put_json<T: Serialize>(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    document: &T,
) -> Result<()> {
    let data = serde_json::to_vec(document)?;
    store.put(bucket, key, Bytes::from(data)).await?;
    Ok(())
}

/// Reads and deserializes the document at `(bucket, key)`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<T> {
    let data = store.get(bucket, key).await?;
    Ok(serde_json::from_slice(&data)?)
}
