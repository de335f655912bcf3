//! Concrete stores and caches behind the domain traits.
//!
//! - [`cache`] - view cache over Redis, moka or nothing
//! - [`persistence`] - PostgreSQL repositories and the in-memory store

pub mod cache;
pub mod persistence;
