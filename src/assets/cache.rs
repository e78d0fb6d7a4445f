use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::assets::decode::decode_mesh_file;
use crate::assets::id::AssetId;
use crate::assets::mesh::MeshAsset;
use crate::assets::resolve::{AssetResolver, FsAssetResolver};
use crate::config::AssetLayout;
use crate::foundation::error::{RoomError, RoomResult};

enum Slot {
    Loading,
    Ready(Arc<MeshAsset>),
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<AssetId, Slot>,
    loads: HashMap<AssetId, usize>,
}

/// Process-wide memoizing mesh cache.
///
/// Concurrent requests for one id collapse onto a single in-flight load: the first caller loads,
/// later callers wait for it to publish. Failures are not cached, so the next request retries.
/// Entries are never evicted.
pub struct AssetCache {
    resolver: Arc<dyn AssetResolver>,
    state: Mutex<CacheState>,
    published: Condvar,
}

impl AssetCache {
    /// Cache backed by an arbitrary resolver.
    pub fn new(resolver: Arc<dyn AssetResolver>) -> Self {
        Self {
            resolver,
            state: Mutex::new(CacheState::default()),
            published: Condvar::new(),
        }
    }

    /// Cache over a filesystem layout.
    pub fn with_layout(layout: AssetLayout) -> Self {
        Self::new(Arc::new(FsAssetResolver::new(layout)))
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `id`, or return the already published asset.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn load(&self, id: &AssetId) -> RoomResult<Arc<MeshAsset>> {
        let mut state = self.lock();
        loop {
            match state.slots.get(id) {
                Some(Slot::Ready(asset)) => return Ok(Arc::clone(asset)),
                Some(Slot::Loading) => {
                    state = self
                        .published
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => {
                    state.slots.insert(id.clone(), Slot::Loading);
                    *state.loads.entry(id.clone()).or_insert(0) += 1;
                    break;
                }
            }
        }
        drop(state);

        let mut pending = PendingLoad {
            cache: self,
            id,
            armed: true,
        };
        let result = self.load_uncached(id);

        let mut state = self.lock();
        match &result {
            Ok(asset) => {
                state
                    .slots
                    .insert(id.clone(), Slot::Ready(Arc::clone(asset)));
            }
            Err(e) => {
                state.slots.remove(id);
                tracing::warn!(error = %e, "asset load failed");
            }
        }
        pending.armed = false;
        drop(state);
        self.published.notify_all();
        result
    }

    fn load_uncached(&self, id: &AssetId) -> RoomResult<Arc<MeshAsset>> {
        let loaded = self
            .resolver
            .resolve_asset_path(id)
            .and_then(|path| decode_mesh_file(id, &path));
        match loaded {
            Ok(asset) => Ok(Arc::new(asset)),
            Err(e @ RoomError::AssetLoad(_)) => Err(e),
            Err(e) => Err(RoomError::asset_load(format!("{id}: {e}"))),
        }
    }

    /// Load a body and a garment in parallel.
    pub fn load_pair(
        &self,
        body: &AssetId,
        garment: &AssetId,
    ) -> (RoomResult<Arc<MeshAsset>>, RoomResult<Arc<MeshAsset>>) {
        rayon::join(|| self.load(body), || self.load(garment))
    }

    /// Published asset for `id`, without loading.
    pub fn get(&self, id: &AssetId) -> Option<Arc<MeshAsset>> {
        match self.lock().slots.get(id) {
            Some(Slot::Ready(asset)) => Some(Arc::clone(asset)),
            _ => None,
        }
    }

    /// Number of real (uncollapsed) load attempts made for `id`, failures included.
    pub fn load_count(&self, id: &AssetId) -> usize {
        self.lock().loads.get(id).copied().unwrap_or(0)
    }

    /// Number of published assets.
    pub fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count()
    }

    /// Whether nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears a `Loading` slot if the leader unwinds before publishing.
struct PendingLoad<'a> {
    cache: &'a AssetCache,
    id: &'a AssetId,
    armed: bool,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.lock().slots.remove(self.id);
            self.cache.published.notify_all();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
