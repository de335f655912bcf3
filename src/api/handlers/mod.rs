//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod lists;
pub mod projects;
pub mod redirect;
pub mod stats;

pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, get_link_handler, link_stats_handler,
    list_links_handler, search_links_handler, update_link_handler,
};
pub use lists::{
    expired_links_handler, inactive_links_handler, popular_links_handler, recent_links_handler,
};
pub use projects::{
    create_project_handler, delete_project_handler, list_projects_handler, project_links_handler,
    update_project_handler,
};
pub use redirect::redirect_handler;
pub use stats::overview_handler;
