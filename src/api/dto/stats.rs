//! DTOs for the stats overview endpoint.

use serde::Serialize;

use crate::domain::entities::LinkOverview;

/// Totals across the caller's links.
#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub total_links: i64,
    pub total_clicks: i64,
    pub active_links: i64,
}

impl From<LinkOverview> for OverviewResponse {
    fn from(o: LinkOverview) -> Self {
        Self {
            total_links: o.total_links,
            total_clicks: o.total_clicks,
            active_links: o.active_links,
        }
    }
}
