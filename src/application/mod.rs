//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, cache coherence and business rules. Services consume repository
//! traits and provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, lookup, update and deletion
//! - [`services::redirect_service::RedirectService`] - Short code resolution
//! - [`services::listing_service::ListingService`] - Listings, cached views and overview
//! - [`services::sweeper_service::SweeperService`] - Expiry, inactivity and purge sweeps
//! - [`services::project_service::ProjectService`] - Project bookkeeping
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
