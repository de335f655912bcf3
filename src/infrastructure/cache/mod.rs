//! Caching layer for read-heavy list and stats views.
//!
//! Provides a [`CacheService`] trait with three implementations:
//! - [`RedisCache`] - Redis-backed cache shared across processes
//! - [`MemoryCache`] - In-process moka cache for single-node runs
//! - [`NullCache`] - No-op implementation for disabled caching
//!
//! [`ViewCache`] sits on top of any backend and owns key naming, encoding,
//! timeouts and invalidation.

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;
mod views;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, glob_match};
pub use views::{
    DEFAULT_CACHE_TIMEOUT, DEFAULT_VIEW_TTL, LinkSnapshot, ViewCache, popular_key, recent_key,
    stats_key,
};
