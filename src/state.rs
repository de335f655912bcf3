//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{
    AuthService, LinkService, ListingService, ProjectService, RedirectService, SweeperService,
};
use crate::domain::repositories::{LinkRepository, ProjectRepository, TokenRepository};
use crate::infrastructure::cache::ViewCache;

/// Tunables the services are built with.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub code_length: usize,
    pub store_timeout: Duration,
    pub inactivity_days: i64,
    pub token_signing_secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub listing_service: Arc<ListingService>,
    pub project_service: Arc<ProjectService>,
    pub sweeper_service: Arc<SweeperService>,
    pub auth_service: Arc<AuthService>,
    pub views: ViewCache,
    pub links: Arc<dyn LinkRepository>,
    pub store_timeout: Duration,
}

impl AppState {
    /// Wires every service over the given stores and view cache.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        projects: Arc<dyn ProjectRepository>,
        tokens: Arc<dyn TokenRepository>,
        views: ViewCache,
        settings: ServiceSettings,
    ) -> Self {
        let store_timeout = settings.store_timeout;

        Self {
            link_service: Arc::new(LinkService::new(
                links.clone(),
                projects.clone(),
                views.clone(),
                settings.code_length,
                store_timeout,
            )),
            redirect_service: Arc::new(RedirectService::new(links.clone(), store_timeout)),
            listing_service: Arc::new(ListingService::new(
                links.clone(),
                projects.clone(),
                views.clone(),
                store_timeout,
            )),
            project_service: Arc::new(ProjectService::new(
                projects,
                links.clone(),
                views.clone(),
                store_timeout,
            )),
            sweeper_service: Arc::new(SweeperService::new(
                links.clone(),
                views.clone(),
                store_timeout,
                settings.inactivity_days,
            )),
            auth_service: Arc::new(AuthService::new(tokens, settings.token_signing_secret)),
            views,
            links,
            store_timeout,
        }
    }
}
