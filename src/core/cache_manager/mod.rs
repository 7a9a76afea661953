//! Response cache
//!
//! Content-addressed, TTL-bounded and size-bounded cache of completion
//! responses. Entries expire lazily on read and are swept periodically by a
//! ticker owned by the cache; inserts that would overflow the size bound
//! evict by LRU or FIFO first.

mod key;
mod manager;
mod types;


pub use key::CacheKey;
pub use manager::{ResponseCache, estimate_size};
pub use types::{CacheEntry, CacheStats};
