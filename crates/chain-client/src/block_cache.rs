use bridge_types::BlockReference;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Caches the least recently used `size` block headers by number. "Latest"
/// is never cached — every caller that asks for it gets a fresh read, since
/// its whole point is to observe chain progress.
///
/// Mirrors `beamer.agent.util.make_web3`'s `construct_simple_cache_middleware`
/// with an `lru.LRU(1000)`-backed cache.
pub struct BlockCache {
    inner: Mutex<LruCache<u64, BlockReference>>,
}

impl BlockCache {
    pub fn new(size: usize) -> Self {
        let size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: Mutex::new(LruCache::new(size)) }
    }

    pub fn get(&self, number: u64) -> Option<BlockReference> {
        self.inner.lock().get(&number).copied()
    }

    pub fn insert(&self, block: BlockReference) {
        self.inner.lock().put(block.block_number, block);
    }
}

impl Default for BlockCache {
    fn default() -> Self {
        // The Python agent sizes its LRU at 1000 least-recently-used blocks.
        Self::new(1000)
    }
}
