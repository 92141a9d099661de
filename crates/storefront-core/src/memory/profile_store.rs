use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::store::ProfileStore;
use crate::types::CustomerProfile;
use crate::{Result, TRACING_TARGET_MEMORY};

type Table = HashMap<(String, String), CustomerProfile>;

/// Profile tables kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

impl MemoryProfileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of profiles in `table`.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.lock().await.get(table).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn ensure_table(&self, table: &str) -> Result<()> {
        self.tables
            .lock()
            .await
            .entry(table.to_owned())
            .or_default();
        Ok(())
    }

    async fn upsert(&self, table: &str, profile: &CustomerProfile) -> Result<()> {
        let key = (profile.partition_key.clone(), profile.row_key.clone());
        let stamped = profile.clone().stamped(Timestamp::now());

        self.tables
            .lock()
            .await
            .entry(table.to_owned())
            .or_default()
            .insert(key, stamped);

        tracing::debug!(
            target: TRACING_TARGET_MEMORY,
            table = %table,
            row_key = %profile.row_key,
            "Upserted profile"
        );
        Ok(())
    }

    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<CustomerProfile>> {
        let key = (partition_key.to_owned(), row_key.to_owned());
        Ok(self
            .tables
            .lock()
            .await
            .get(table)
            .and_then(|rows| rows.get(&key))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CUSTOMER_PARTITION;

    #[tokio::test]
    async fn upsert_replaces_and_stamps() -> anyhow::Result<()> {
        let store = MemoryProfileStore::new();
        store.ensure_table("CustomerProfiles").await?;

        let first = CustomerProfile::new("ann@example.com", "h1");
        let second = CustomerProfile::new("ann@example.com", "h2");
        store.upsert("CustomerProfiles", &first).await?;
        store.upsert("CustomerProfiles", &second).await?;

        let found = store
            .get("CustomerProfiles", CUSTOMER_PARTITION, "ann@example.com")
            .await?
            .expect("profile should exist");
        assert_eq!(found.password_hash, "h2");
        assert!(found.timestamp.is_some());
        assert_eq!(store.len("CustomerProfiles").await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_profile() -> anyhow::Result<()> {
        let store = MemoryProfileStore::new();
        assert!(
            store
                .get("CustomerProfiles", CUSTOMER_PARTITION, "nobody@example.com")
                .await?
                .is_none()
        );
        Ok(())
    }
}
