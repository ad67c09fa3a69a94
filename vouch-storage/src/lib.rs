//! Vouch Storage
//!
//! Seams around the authoritative document store and the cache layer:
//!
//! - `AuthoritativeStore`: filter-based find/update contract with atomic
//!   per-document updates, plus an in-memory implementation.
//! - `CacheKeyCodec` (`derive_cache_key`): deterministic, collision-resistant
//!   keys from (collection, filter).
//! - `ConsistencyGate`: cache-first reads with single-flight de-duplication,
//!   and synchronous invalidation after acknowledged writes.
//! - `ObjectStore`: upload/download seam for document payloads.

pub mod cache;
pub mod memory_store;
pub mod object_store;
pub mod store;

pub use cache::gate::{ConsistencyGate, GateConfig, ProjectionFetcher};
pub use cache::key::{derive_cache_key, CacheKey};
pub use cache::memory::InMemoryCacheBackend;
pub use cache::traits::CacheBackend;
pub use memory_store::InMemoryStore;
pub use object_store::{object_key_from_url, ObjectStore};
pub use store::{AuthoritativeStore, UpdateDoc};
