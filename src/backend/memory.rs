use super::{DocumentBackend, DocumentWrite};
use crate::error::BackendError;
use crate::types::StoredRecord;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory stand-in for the real store.
///
/// Keyed by URI, last write wins, nothing is ever evicted. Used for every
/// write in simulated mode and for single writes the real backend refused.
/// The pipeline only writes to it; `get` and `contains` exist for tests
/// and diagnostics.
#[derive(Debug, Default)]
pub struct FallbackStore {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `record`, returning the store size afterwards.
    pub fn put(&self, record: StoredRecord) -> usize {
        // Poisoning only means another writer panicked; the map is intact.
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&record.uri) {
            tracing::warn!(uri = %record.uri, "document URI already exists in fallback store, overwriting");
        }
        records.insert(record.uri.clone(), record);
        records.len()
    }

    pub fn count(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Copy of the record stored at `uri`. Not part of the write path; kept
    /// for tests and diagnostics.
    #[doc(hidden)]
    pub fn get(&self, uri: &str) -> Option<StoredRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
    }

    #[doc(hidden)]
    pub fn contains(&self, uri: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(uri)
    }
}

#[async_trait]
impl DocumentBackend for FallbackStore {
    fn name(&self) -> &'static str {
        "simulation"
    }

    async fn insert(&self, write: DocumentWrite<'_>) -> Result<(), BackendError> {
        let total = self.put(StoredRecord {
            uri: write.uri.to_string(),
            data: write.content.clone(),
            collections: write.collections.to_vec(),
            metadata: write.metadata.clone(),
            inserted_at: Utc::now(),
            size_bytes: write.size_bytes,
        });

        tracing::info!(
            uri = %write.uri,
            collections = ?write.collections,
            total,
            "document inserted in simulation store"
        );
        Ok(())
    }
}
