//! DTOs for link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::{Link, LinkPatch};

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination URL (must be HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    /// Optional human-chosen code. Becomes the short code of the link.
    #[validate(length(min = 3, max = 32, message = "Custom alias must be 3-32 characters"))]
    pub custom_alias: Option<String>,

    /// Optional project of the caller to group the link under.
    pub project_id: Option<i64>,

    /// Optional expiry. From this instant on, the link answers 410 Gone.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateLinkRequest> for CreateLink {
    fn from(req: CreateLinkRequest) -> Self {
        Self {
            original_url: req.original_url,
            custom_alias: req.custom_alias,
            project_id: req.project_id,
            expires_at: req.expires_at,
        }
    }
}

/// Request body for `PUT /api/links/{code}`.
///
/// Only the destination and the expiry can change. Absent fields are left as they are.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            original_url: req.original_url,
            expires_at: req.expires_at,
        }
    }
}

/// JSON representation of a link, used by every link endpoint.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub access_count: i64,
    pub is_active: bool,
    pub is_expired: bool,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            original_url: link.original_url,
            short_code: link.short_code,
            custom_alias: link.custom_alias,
            user_id: link.user_id,
            project_id: link.project_id,
            created_at: link.created_at,
            expires_at: link.expires_at,
            last_accessed_at: link.last_accessed_at,
            access_count: link.access_count,
            is_active: link.is_active,
            is_expired: link.is_expired,
        }
    }
}

/// Plain list of links.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
}

impl From<Vec<Link>> for LinkListResponse {
    fn from(links: Vec<Link>) -> Self {
        Self {
            items: links.into_iter().map(LinkResponse::from).collect(),
        }
    }
}

/// One page of the caller's links.
#[derive(Debug, Serialize)]
pub struct LinkPageResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<LinkResponse>,
}

/// Pagination metadata for responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, page_size: i64, total_items: i64) -> Self {
        Self {
            page,
            page_size,
            total_items,
            total_pages: (total_items + page_size - 1) / page_size,
        }
    }
}
