//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL with lifecycle flags and access counters
//! - [`Project`] - A user-owned grouping of links
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! - `NewLink`, `NewProject` - For creating new records
//! - `LinkPatch` - For partial updates
//!
//! [`Resolution`] and [`LinkOverview`] are read-side results produced by the
//! link store and the redirect resolver.

pub mod link;
pub mod project;

pub use link::{Link, LinkOverview, LinkPatch, NewLink, Resolution};
pub use project::{NewProject, Project};
