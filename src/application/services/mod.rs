//! Business logic services for the application layer.

pub mod auth_service;
pub mod deadline;
pub mod link_service;
pub mod listing_service;
pub mod project_service;
pub mod redirect_service;
pub mod sweeper_service;

pub use auth_service::AuthService;
pub use deadline::DEFAULT_STORE_TIMEOUT;
pub use link_service::{CreateLink, LinkService};
pub use listing_service::ListingService;
pub use project_service::ProjectService;
pub use redirect_service::RedirectService;
pub use sweeper_service::{
    DEFAULT_INACTIVITY_DAYS, MAX_INACTIVITY_DAYS, SweepReport, SweeperService, inactivity_cutoff,
};
