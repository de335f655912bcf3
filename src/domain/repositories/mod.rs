//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented by the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - The authoritative link store
//! - [`ProjectRepository`] - Project ownership checks and bookkeeping
//! - [`TokenRepository`] - API token authentication

pub mod link_repository;
pub mod project_repository;
pub mod token_repository;

pub use link_repository::LinkRepository;
pub use project_repository::ProjectRepository;
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use project_repository::MockProjectRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
