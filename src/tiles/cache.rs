use crate::core::{constants::DEFAULT_TILE_CACHE_CAPACITY, geo::TileCoord};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory store of encoded tile images with LRU eviction
#[derive(Debug)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileCoord, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// A zero capacity is bumped to one tile
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Recovers a poisoned lock, logging it
    fn lock(&self) -> MutexGuard<'_, LruCache<TileCoord, Arc<Vec<u8>>>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            log::warn!("tile cache lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Get a tile, marking it recently used
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.lock().get(coord).cloned()
    }

    pub fn insert(&self, coord: TileCoord, data: Vec<u8>) {
        self.lock().put(coord, Arc::new(data));
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.lock().contains(coord)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl Clone for TileCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_cache_lru_eviction() {
        let cache = TileCache::new(2);
        let coord1 = TileCoord::new(1, 1, 1);
        let coord2 = TileCoord::new(2, 2, 2);
        let coord3 = TileCoord::new(3, 3, 3);

        cache.insert(coord1, vec![1]);
        cache.insert(coord2, vec![2]);
        // touching coord1 makes coord2 the eviction candidate
        assert_eq!(*cache.get(&coord1).unwrap(), vec![1]);

        cache.insert(coord3, vec![3]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&coord1));
        assert!(!cache.contains(&coord2));
        assert!(cache.contains(&coord3));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one_tile() {
        let cache = TileCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_poisoned_lock_keeps_tiles() {
        let cache = TileCache::new(4);
        let coord = TileCoord::new(5, 6, 4);
        cache.insert(coord, vec![7]);

        let shared = cache.clone();
        let worker = std::thread::spawn(move || {
            let _guard = shared.cache.lock().unwrap();
            panic!("tile worker died holding the cache");
        });
        assert!(worker.join().is_err());
        assert!(cache.cache.is_poisoned());

        assert!(cache.contains(&coord));
        assert_eq!(cache.len(), 1);
        assert_eq!(*cache.get(&coord).unwrap(), vec![7]);
        cache.insert(TileCoord::new(0, 0, 0), vec![1]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = TileCache::new(4);
        let other = cache.clone();
        other.insert(TileCoord::new(0, 0, 0), vec![9]);
        assert!(cache.contains(&TileCoord::new(0, 0, 0)));
    }
}
