// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use tokio::sync::watch;

use crate::{Backend, Crate, CrateDraft, CrateId, Result};

/// Immutable view of the crate-list cache published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub crates: Vec<Crate>,
    pub selected: Option<CrateId>,
}

impl StoreSnapshot {
    /// Resolves the currently selected crate, if any.
    #[must_use]
    pub fn selected_crate(&self) -> Option<&Crate> {
        let selected = self.selected.as_ref()?;
        self.crates.iter().find(|persisted| &persisted.id == selected)
    }
}

/// Process-wide cache of the backend's crate list plus the current
/// selection.
///
/// The cache is never authoritative: every mutating call goes to the
/// backend first and the cache is invalidated by reloading afterwards.
/// Observers subscribe to snapshots; dropping the receiver unsubscribes.
#[derive(Debug)]
pub struct CrateStore {
    tx: watch::Sender<StoreSnapshot>,
}

impl Default for CrateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CrateStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(StoreSnapshot::default()),
        }
    }

    /// Subscribes to snapshot updates.
    ///
    /// The receiver immediately observes the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot, for hosts that do not want to subscribe.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.tx.borrow().clone()
    }

    /// Reloads the crate list from the backend.
    ///
    /// A selection that no longer resolves after the reload is cleared.
    pub async fn refresh<B: Backend>(&self, backend: &B) -> Result<()> {
        let crates = backend.list_crates().await?;
        log::debug!("Loaded {count} crate(s)", count = crates.len());
        self.tx.send_modify(|snapshot| {
            if let Some(selected) = &snapshot.selected
                && !crates.iter().any(|persisted| &persisted.id == selected)
            {
                snapshot.selected = None;
            }
            snapshot.crates = crates;
        });
        Ok(())
    }

    /// Selects a cached crate, or clears the selection with `None`.
    ///
    /// Selecting an identifier that is not in the cache clears the
    /// selection as well.
    pub fn select(&self, id: Option<CrateId>) {
        self.tx.send_modify(|snapshot| {
            snapshot.selected =
                id.filter(|id| snapshot.crates.iter().any(|persisted| &persisted.id == id));
        });
    }

    /// Creates a crate on the backend, then invalidates the cache.
    pub async fn create<B: Backend>(&self, backend: &B, draft: &CrateDraft) -> Result<Crate> {
        draft.validate()?;
        let created = backend.create_crate(draft).await?;
        self.refresh(backend).await?;
        Ok(created)
    }

    /// Updates a crate on the backend, then invalidates the cache.
    pub async fn update<B: Backend>(
        &self,
        backend: &B,
        id: &CrateId,
        draft: &CrateDraft,
    ) -> Result<Crate> {
        draft.validate()?;
        let updated = backend.update_crate(id, draft).await?;
        self.refresh(backend).await?;
        Ok(updated)
    }

    /// Deletes a crate on the backend, then invalidates the cache.
    pub async fn delete<B: Backend>(&self, backend: &B, id: &CrateId) -> Result<()> {
        backend.delete_crate(id).await?;
        self.refresh(backend).await
    }

    /// Triggers re-evaluation of a smart crate's membership, then
    /// invalidates the cache to pick up the new track count.
    pub async fn refresh_smart<B: Backend>(&self, backend: &B, id: &CrateId) -> Result<()> {
        backend.refresh_crate(id).await?;
        self.refresh(backend).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::{CRATE_KIND_SMART, Criteria, Error, TrackSummary};

    use super::*;

    /// In-memory backend with a mutable crate list.
    #[derive(Default)]
    struct FakeBackend {
        crates: Mutex<Vec<Crate>>,
        next_id: Mutex<u32>,
    }

    impl FakeBackend {
        fn with_crates(crates: Vec<Crate>) -> Self {
            Self {
                crates: Mutex::new(crates),
                next_id: Mutex::new(1),
            }
        }
    }

    fn persisted(id: &str, name: &str) -> Crate {
        let mut criteria = Criteria::default();
        criteria.add_rule();
        Crate {
            id: CrateId::new(id),
            name: name.to_owned(),
            description: None,
            kind: CRATE_KIND_SMART.to_owned(),
            is_smart: true,
            color: "#3366ff".to_owned(),
            icon: "disc".to_owned(),
            criteria,
            track_count: 0,
        }
    }

    impl Backend for FakeBackend {
        async fn list_crates(&self) -> Result<Vec<Crate>> {
            Ok(self.crates.lock().unwrap().clone())
        }

        async fn crate_tracks(&self, _id: &CrateId) -> Result<Vec<TrackSummary>> {
            Ok(Vec::new())
        }

        async fn preview_count(&self, _criteria: &Criteria) -> Result<u64> {
            Ok(0)
        }

        async fn create_crate(&self, draft: &CrateDraft) -> Result<Crate> {
            let mut next_id = self.next_id.lock().unwrap();
            let id = format!("c-{next_id}");
            *next_id += 1;
            let mut created = persisted(&id, &draft.name);
            created.criteria = draft.criteria.clone();
            self.crates.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_crate(&self, id: &CrateId, draft: &CrateDraft) -> Result<Crate> {
            let mut crates = self.crates.lock().unwrap();
            let existing = crates
                .iter_mut()
                .find(|persisted| &persisted.id == id)
                .ok_or(Error::Api {
                    status: 404,
                    message: "no such crate".to_owned(),
                })?;
            existing.name = draft.name.clone();
            existing.criteria = draft.criteria.clone();
            Ok(existing.clone())
        }

        async fn refresh_crate(&self, _id: &CrateId) -> Result<()> {
            Ok(())
        }

        async fn delete_crate(&self, id: &CrateId) -> Result<()> {
            self.crates.lock().unwrap().retain(|persisted| &persisted.id != id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresh_publishes_a_snapshot_to_subscribers() {
        let backend =
            FakeBackend::with_crates(vec![persisted("c-1", "Warmup"), persisted("c-2", "Peak")]);
        let store = CrateStore::new();
        let mut rx = store.subscribe();
        assert!(rx.borrow().crates.is_empty());

        store.refresh(&backend).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.crates.len(), 2);
        assert_eq!(snapshot.crates[0].name, "Warmup");
    }

    #[tokio::test]
    async fn selection_requires_a_cached_crate() {
        let backend = FakeBackend::with_crates(vec![persisted("c-1", "Warmup")]);
        let store = CrateStore::new();
        store.refresh(&backend).await.unwrap();

        store.select(Some(CrateId::new("c-1")));
        assert_eq!(
            store.snapshot().selected_crate().map(|c| c.name.clone()),
            Some("Warmup".to_owned())
        );

        store.select(Some(CrateId::new("ghost")));
        assert!(store.snapshot().selected.is_none());
    }

    #[tokio::test]
    async fn delete_invalidates_the_cache_and_clears_the_selection() {
        let backend =
            FakeBackend::with_crates(vec![persisted("c-1", "Warmup"), persisted("c-2", "Peak")]);
        let store = CrateStore::new();
        store.refresh(&backend).await.unwrap();
        store.select(Some(CrateId::new("c-2")));

        store.delete(&backend, &CrateId::new("c-2")).await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.crates.len(), 1);
        assert!(snapshot.selected.is_none());
    }

    #[tokio::test]
    async fn create_validates_and_reloads() {
        let backend = FakeBackend::default();
        let store = CrateStore::new();

        let invalid = CrateDraft::default();
        assert!(store.create(&backend, &invalid).await.is_err());
        assert!(store.snapshot().crates.is_empty());

        let mut draft = CrateDraft {
            name: "Peak Hour".to_owned(),
            ..CrateDraft::default()
        };
        draft.criteria.add_rule();
        let created = store.create(&backend, &draft).await.unwrap();
        assert!(created.id.is_valid());
        assert_eq!(store.snapshot().crates.len(), 1);
    }

    #[tokio::test]
    async fn update_reloads_the_cached_copy() {
        let backend = FakeBackend::with_crates(vec![persisted("c-1", "Warmup")]);
        let store = CrateStore::new();
        store.refresh(&backend).await.unwrap();

        let mut draft = CrateDraft::from_crate(&store.snapshot().crates[0]);
        draft.name = "Warmup II".to_owned();
        store
            .update(&backend, &CrateId::new("c-1"), &draft)
            .await
            .unwrap();
        assert_eq!(store.snapshot().crates[0].name, "Warmup II");
    }
}
