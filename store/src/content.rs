//! Content-addressed document store contract.

use crate::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sonic_types::ContentId;
use std::future::Future;

/// Write bytes, get back an identifier derived from them; read them back by
/// that identifier.
pub trait ContentStore: Send + Sync {
    fn put(&self, bytes: Vec<u8>) -> impl Future<Output = Result<ContentId, StoreError>> + Send;

    fn get(&self, id: &ContentId) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

/// Store `doc` as pretty JSON.
pub async fn put_json<S, T>(store: &S, doc: &T) -> Result<ContentId, StoreError>
where
    S: ContentStore,
    T: Serialize,
{
    let bytes = serde_json::to_vec_pretty(doc)?;
    store.put(bytes).await
}

pub async fn get_json<S, T>(store: &S, id: &ContentId) -> Result<T, StoreError>
where
    S: ContentStore,
    T: DeserializeOwned,
{
    let bytes = store.get(id).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
