//! Cache Module
//!
//! Size-bounded response cache with insertion-age eviction, expiry and
//! write-through persistence.

mod age_index;
pub mod codec;
mod entry;
mod handle;
pub mod path;
mod stats;
mod store;


// Re-export public types
pub use age_index::AgeIndex;
pub use codec::PersistenceCodec;
pub use entry::CacheEntry;
pub use handle::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Bytes per MiB, the unit of [`CacheStore::cache_size_mib`]
pub const BYTES_PER_MIB: u64 = 1024 * 1024;
