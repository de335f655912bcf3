//! Repository implementations.
//!
//! PostgreSQL repositories use SQLx with bound parameters; [`MemoryStore`]
//! implements the same traits in process.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, access recording and sweeps
//! - [`PgProjectRepository`] - Project ownership and bookkeeping
//! - [`PgTokenRepository`] - API token storage and validation
//! - [`MemoryStore`] - All of the above, held in memory

pub mod memory;
pub mod pg_link_repository;
pub mod pg_project_repository;
pub mod pg_token_repository;

pub use memory::MemoryStore;
pub use pg_link_repository::PgLinkRepository;
pub use pg_project_repository::PgProjectRepository;
pub use pg_token_repository::PgTokenRepository;
