//! Link entity representing a shortened URL mapping and its lifecycle state.

use chrono::{DateTime, Utc};

/// A shortened URL link with ownership, lifecycle flags and access counters.
///
/// `short_code` equals `custom_alias` when the owner chose an alias, so the
/// resolvable code space is the union of both columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
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

impl Link {
    /// Returns true if `code` addresses this link, either as short code or alias.
    pub fn answers_to(&self, code: &str) -> bool {
        self.short_code == code || self.custom_alias.as_deref() == Some(code)
    }

    /// Returns true if the link must no longer resolve at `now`.
    ///
    /// The stored flag and the deadline are both consulted: the sweeper may not
    /// have flipped `is_expired` yet for a link whose `expires_at` has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired || self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    /// Returns true if `user_id` owns this link.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// Every cache-visible code of this link (short code, plus alias when distinct).
    pub fn codes(&self) -> Vec<&str> {
        let mut codes = vec![self.short_code.as_str()];
        if let Some(alias) = self.custom_alias.as_deref()
            && alias != self.short_code
        {
            codes.push(alias);
        }
        codes
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Partial update for an existing link.
///
/// Only the destination and the expiry are mutable. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none() && self.expires_at.is_none()
    }
}

/// Outcome of resolving a short code.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The link is live; access has been recorded on the returned state.
    Active(Link),
    /// The link exists but is past its expiry. Nothing was recorded.
    Expired(Link),
    /// No link answers to the code.
    Missing,
}

/// Per-user aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOverview {
    pub total_links: i64,
    pub total_clicks: i64,
    pub active_links: i64,
}
