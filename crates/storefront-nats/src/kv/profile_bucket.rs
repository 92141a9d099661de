//! Customer profiles stored in KV buckets, one bucket per table.

use std::collections::HashMap;
use std::sync::Arc;

use async_nats::jetstream::{self, kv};
use async_trait::async_trait;
use jiff::Timestamp;
use storefront_core::store::ProfileStore;
use storefront_core::types::CustomerProfile;
use tokio::sync::RwLock;

use crate::{Error, Result, TRACING_TARGET_KV};

/// Returns the KV key for a profile.
///
/// KV keys only allow a restricted alphabet, so the row key (an email
/// address) is hex-encoded.
pub fn profile_key(partition_key: &str, row_key: &str) -> String {
    format!("{}.{}", hex::encode(partition_key), hex::encode(row_key))
}

/// Profile store backed by JetStream KV buckets.
#[derive(Clone)]
pub struct ProfileBucket {
    jetstream: jetstream::Context,
    buckets: Arc<RwLock<HashMap<String, kv::Store>>>,
}

impl ProfileBucket {
    pub(crate) fn new(jetstream: &jetstream::Context) -> Self {
        Self {
            jetstream: jetstream.clone(),
            buckets: Arc::default(),
        }
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_KV)]
    async fn bucket(&self, table: &str) -> Result<kv::Store> {
        if let Some(store) = self.buckets.read().await.get(table) {
            return Ok(store.clone());
        }

        let store = match self.jetstream.get_key_value(table).await {
            Ok(store) => {
                tracing::debug!(
                    target: TRACING_TARGET_KV,
                    bucket = %table,
                    "Using existing KV bucket"
                );
                store
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_KV,
                    bucket = %table,
                    "Creating new KV bucket"
                );
                self.jetstream
                    .create_key_value(kv::Config {
                        bucket: table.to_owned(),
                        description: format!("Profile table {table}"),
                        history: 1,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| Error::kv_error(table, e.to_string()))?
            }
        };

        self.buckets
            .write()
            .await
            .insert(table.to_owned(), store.clone());
        Ok(store)
    }

    async fn put(&self, table: &str, profile: &CustomerProfile) -> Result<u64> {
        let store = self.bucket(table).await?;
        let key = profile_key(&profile.partition_key, &profile.row_key);
        let stamped = profile.clone().stamped(Timestamp::now());
        let json = serde_json::to_vec(&stamped)?;

        let revision = store
            .put(&key, json.into())
            .await
            .map_err(|e| Error::kv_error(table, e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_KV,
            bucket = %table,
            key = %key,
            revision = revision,
            "Stored profile"
        );
        Ok(revision)
    }

    async fn load(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<CustomerProfile>> {
        let store = self.bucket(table).await?;
        let key = profile_key(partition_key, row_key);

        let Some(value) = store
            .get(&key)
            .await
            .map_err(|e| Error::kv_error(table, e.to_string()))?
        else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_slice(&value)?))
    }
}

impl std::fmt::Debug for ProfileBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileBucket").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProfileStore for ProfileBucket {
    async fn ensure_table(&self, table: &str) -> storefront_core::Result<()> {
        self.bucket(table).await?;
        Ok(())
    }

    async fn upsert(&self, table: &str, profile: &CustomerProfile) -> storefront_core::Result<()> {
        self.put(table, profile).await?;
        Ok(())
    }

    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> storefront_core::Result<Option<CustomerProfile>> {
        Ok(self.load(table, partition_key, row_key).await?)
    }
}
