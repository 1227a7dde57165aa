//! Shared, deduplicating mesh cache.

use std::collections::HashMap;
use std::sync::Arc;

use meshmerizer_decode::Mesh;
use parking_lot::{Condvar, Mutex};

use crate::key::MeshKey;

/// Counters describing cache activity since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub evictions: u64,
}

enum Slot {
    /// A caller is building this key; others wait for it.
    Building,
    Ready {
        mesh: Arc<Mesh>,
        last_used: u64,
    },
}

#[derive(Default)]
struct State {
    slots: HashMap<MeshKey, Slot>,
    clock: u64,
    stats: CacheStats,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn ready_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    fn store(&mut self, key: MeshKey, mesh: Arc<Mesh>, capacity: Option<usize>) {
        let last_used = self.tick();
        self.slots.insert(key, Slot::Ready { mesh, last_used });
        let Some(capacity) = capacity else {
            return;
        };
        while self.ready_count() > capacity {
            let oldest = self
                .slots
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready { last_used, .. } => Some((*last_used, *key)),
                    Slot::Building => None,
                })
                .min();
            let Some((_, key)) = oldest else {
                break;
            };
            self.slots.remove(&key);
            self.stats.evictions += 1;
            tracing::debug!("Evicted mesh {key}");
        }
    }
}

/// Thread-safe map from [`MeshKey`] to a shared [`Mesh`].
///
/// At most one caller builds a given key at a time; concurrent requests for
/// the same key block until the build finishes and then share its result.
/// Failed builds are not stored. With a capacity set, the least recently
/// used meshes are evicted once the bound is exceeded.
pub struct MeshCache {
    state: Mutex<State>,
    built: Condvar,
    capacity: Option<usize>,
}

impl Default for MeshCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MeshCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl MeshCache {
    /// Unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            built: Condvar::new(),
            capacity: None,
        }
    }

    /// Cache holding at most `capacity` meshes (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Return the mesh for `key`, running `build` only if it is absent.
    ///
    /// If another thread is already building `key`, waits for it. Should
    /// that build fail, one of the waiters takes over.
    pub fn get_or_build<E>(
        &self,
        key: MeshKey,
        build: impl FnOnce() -> Result<Mesh, E>,
    ) -> Result<Arc<Mesh>, E> {
        let mut guard = self.state.lock();
        loop {
            let state = &mut *guard;
            match state.slots.get_mut(&key) {
                Some(Slot::Ready { mesh, last_used }) => {
                    state.clock += 1;
                    *last_used = state.clock;
                    state.stats.hits += 1;
                    return Ok(Arc::clone(mesh));
                }
                Some(Slot::Building) => {}
                None => break,
            }
            self.built.wait(&mut guard);
        }
        guard.stats.misses += 1;
        guard.slots.insert(key, Slot::Building);
        drop(guard);

        tracing::debug!("Building mesh {key}");
        let pending = PendingBuild { cache: self, key };
        let mesh = Arc::new(build()?);
        pending.complete(Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Look up a finished mesh without building.
    #[must_use]
    pub fn get(&self, key: MeshKey) -> Option<Arc<Mesh>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(Slot::Ready { mesh, last_used }) = state.slots.get_mut(&key) {
            state.clock += 1;
            *last_used = state.clock;
            state.stats.hits += 1;
            Some(Arc::clone(mesh))
        } else {
            state.stats.misses += 1;
            None
        }
    }

    /// Store `mesh` under `key`, replacing any finished entry.
    pub fn insert(&self, key: MeshKey, mesh: Arc<Mesh>) {
        self.state.lock().store(key, mesh, self.capacity);
        self.built.notify_all();
    }

    /// Remove a finished mesh. In-flight builds are left alone.
    pub fn remove(&self, key: MeshKey) -> Option<Arc<Mesh>> {
        let mut state = self.state.lock();
        match state.slots.remove(&key) {
            Some(Slot::Ready { mesh, .. }) => Some(mesh),
            Some(Slot::Building) => {
                state.slots.insert(key, Slot::Building);
                None
            }
            None => None,
        }
    }

    /// Drop every finished mesh.
    pub fn clear(&self) {
        self.state
            .lock()
            .slots
            .retain(|_, slot| matches!(slot, Slot::Building));
    }

    /// Number of finished meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().ready_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}

/// Clears the in-flight marker if the build does not complete, including
/// when the builder panics.
struct PendingBuild<'a> {
    cache: &'a MeshCache,
    key: MeshKey,
}

impl PendingBuild<'_> {
    fn complete(self, mesh: Arc<Mesh>) {
        let mut state = self.cache.state.lock();
        state.stats.builds += 1;
        state.store(self.key, mesh, self.cache.capacity);
        drop(state);
        self.cache.built.notify_all();
        std::mem::forget(self);
    }
}

impl Drop for PendingBuild<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.state.lock();
        if matches!(state.slots.get(&self.key), Some(Slot::Building)) {
            state.slots.remove(&self.key);
        }
        drop(state);
        self.cache.built.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn triangle() -> Mesh {
        Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]])
    }

    fn ok() -> Result<Mesh, ()> {
        Ok(triangle())
    }

    #[test]
    fn hit_returns_the_same_mesh() {
        let cache = MeshCache::new();
        let first = cache.get_or_build(MeshKey(1), ok).unwrap();
        let second = cache
            .get_or_build(MeshKey(1), || -> Result<Mesh, ()> {
                panic!("builder must not run on a hit")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                builds: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache = MeshCache::new();
        assert_eq!(cache.get_or_build(MeshKey(1), || Err("boom")), Err("boom"));
        assert!(cache.is_empty());
        assert!(cache.get_or_build(MeshKey(1), ok).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn panicking_build_releases_the_key() {
        let cache = MeshCache::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_build(MeshKey(9), || -> Result<Mesh, ()> {
                panic!("builder panicked")
            })
        }));
        assert!(result.is_err());
        assert!(cache.get_or_build(MeshKey(9), ok).is_ok());
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = MeshCache::with_capacity(2);
        cache.get_or_build(MeshKey(1), ok).unwrap();
        cache.get_or_build(MeshKey(2), ok).unwrap();
        // Touch 1 so that 2 becomes the oldest.
        assert!(cache.get(MeshKey(1)).is_some());
        cache.get_or_build(MeshKey(3), ok).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(MeshKey(1)).is_some());
        assert!(cache.get(MeshKey(2)).is_none());
        assert!(cache.get(MeshKey(3)).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn insert_remove_clear() {
        let cache = MeshCache::new();
        let mesh = Arc::new(triangle());
        cache.insert(MeshKey(5), Arc::clone(&mesh));
        assert!(Arc::ptr_eq(&cache.get(MeshKey(5)).unwrap(), &mesh));
        assert!(cache.remove(MeshKey(5)).is_some());
        assert!(cache.remove(MeshKey(5)).is_none());

        cache.insert(MeshKey(6), Arc::clone(&mesh));
        cache.insert(MeshKey(7), mesh);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_requests_build_once() {
        let cache = MeshCache::new();
        let builds = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        let meshes: Vec<Arc<Mesh>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_build(MeshKey(42), || {
                                builds.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(20));
                                ok()
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(meshes.iter().all(|mesh| Arc::ptr_eq(mesh, &meshes[0])));
    }

    #[test]
    fn waiter_takes_over_after_failure() {
        let cache = MeshCache::new();
        let attempts = AtomicUsize::new(0);
        let barrier = Barrier::new(2);

        let results: Vec<Result<Arc<Mesh>, ()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get_or_build(MeshKey(3), || {
                            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            if attempt == 0 { Err(()) } else { ok() }
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(cache.len(), 1);
    }
}
