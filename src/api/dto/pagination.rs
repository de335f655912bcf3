//! Pagination and listing query parameters.

use serde::Deserialize;
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::MAX_INACTIVITY_DAYS;
use crate::error::AppError;

const DEFAULT_PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;
const DEFAULT_DAYS: u32 = 30;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Validates pagination parameters.
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `page_size`: 25
    ///
    /// # Validation
    ///
    /// - Page must be > 0
    /// - Page size must be between 1 and 100
    ///
    /// # Returns
    ///
    /// `(page, page_size)` tuple.
    pub fn validate(&self) -> Result<(i64, i64), AppError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::bad_request(
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
                json!({ "page_size": page_size }),
            ));
        }

        Ok((i64::from(page), i64::from(page_size)))
    }
}

/// `limit` parameter of the popular and recent views.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<u32>,
}

impl LimitParams {
    /// Returns the limit, 10 by default, rejecting values outside 1..=100.
    pub fn validate(&self) -> Result<i64, AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::bad_request(
                format!("Limit must be between 1 and {MAX_LIMIT}"),
                json!({ "limit": limit }),
            ));
        }

        Ok(i64::from(limit))
    }
}

/// `days` parameter of the inactive listing.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct InactivityParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub days: Option<u32>,
}

impl InactivityParams {
    pub fn validate(&self) -> Result<i64, AppError> {
        let days = i64::from(self.days.unwrap_or(DEFAULT_DAYS));

        if !(1..=MAX_INACTIVITY_DAYS).contains(&days) {
            return Err(AppError::bad_request(
                format!("Days must be between 1 and {MAX_INACTIVITY_DAYS}"),
                json!({ "days": days }),
            ));
        }

        Ok(days)
    }
}

/// Query of `GET /api/links/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub original_url: String,
}
