//! HTTP surface: JSON API, redirect endpoint and health check.
//!
//! - [`dto`] - request and response bodies
//! - [`handlers`] - one function per endpoint
//! - [`middleware`] - bearer auth, per-IP rate limiting, request tracing
//! - [`routes`] - the authenticated `/api` route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
