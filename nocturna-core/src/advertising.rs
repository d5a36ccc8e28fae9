//! Advertisements the user has already been shown.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::storage::{keys, KeyValueStorage, KeyValueStorageExt};

/// Result of [`ViewedAdvertisements::mark_viewed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkViewed {
    /// Newly recorded and persisted.
    New,
    /// The id was already in the set; nothing was written.
    AlreadyViewed,
    /// The id was new but the write failed.
    NotPersisted,
}

impl MarkViewed {
    /// True only for an id recorded by this call.
    pub fn is_new(self) -> bool {
        self == MarkViewed::New
    }
}

/// Persisted set of viewed advertisement ids.
///
/// Storage failures are logged; reads then behave as if nothing was viewed.
#[derive(Clone)]
pub struct ViewedAdvertisements {
    storage: Arc<dyn KeyValueStorage>,
    lock: Arc<Mutex<()>>,
}

impl ViewedAdvertisements {
    /// Create over the given storage.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Remember that an advertisement was shown.
    pub async fn mark_viewed(&self, publicidad_id: i64) -> MarkViewed {
        let _guard = self.lock.lock().await;
        let mut viewed = self.load().await;
        if !viewed.insert(publicidad_id) {
            return MarkViewed::AlreadyViewed;
        }
        match self.storage.set_json(keys::VIEWED_ADS, &viewed).await {
            Ok(()) => MarkViewed::New,
            Err(err) => {
                tracing::warn!(publicidad_id, "failed to persist viewed advertisement: {err}");
                MarkViewed::NotPersisted
            }
        }
    }

    /// Whether the advertisement was shown before.
    pub async fn has_viewed(&self, publicidad_id: i64) -> bool {
        self.load().await.contains(&publicidad_id)
    }

    /// Every viewed id, ascending.
    pub async fn all(&self) -> Vec<i64> {
        self.load().await.into_iter().collect()
    }

    /// Forget every viewed id.
    pub async fn clear(&self) -> bool {
        let _guard = self.lock.lock().await;
        match self.storage.remove(keys::VIEWED_ADS).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("failed to clear viewed advertisements: {err}");
                false
            }
        }
    }

    async fn load(&self) -> BTreeSet<i64> {
        match self.storage.get_json::<BTreeSet<i64>>(keys::VIEWED_ADS).await {
            Ok(viewed) => viewed.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("ignoring unreadable viewed advertisements: {err}");
                BTreeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[tokio::test]
    async fn test_mark_and_query() {
        let viewed = ViewedAdvertisements::new(Arc::new(InMemoryStorage::new()));

        assert!(!viewed.has_viewed(3).await);
        assert_eq!(viewed.mark_viewed(3).await, MarkViewed::New);
        assert_eq!(viewed.mark_viewed(1).await, MarkViewed::New);
        assert_eq!(viewed.mark_viewed(3).await, MarkViewed::AlreadyViewed);

        assert!(viewed.has_viewed(3).await);
        assert_eq!(viewed.all().await, vec![1, 3]);

        assert!(viewed.clear().await);
        assert!(viewed.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_previous_set() {
        let storage = Arc::new(InMemoryStorage::new());
        let viewed = ViewedAdvertisements::new(storage.clone());
        viewed.mark_viewed(1).await;

        storage.fail_writes(true);
        assert_eq!(viewed.mark_viewed(2).await, MarkViewed::NotPersisted);
        assert!(!viewed.mark_viewed(2).await.is_new());
        assert_eq!(viewed.mark_viewed(1).await, MarkViewed::AlreadyViewed);
        assert_eq!(viewed.all().await, vec![1]);
    }
}
