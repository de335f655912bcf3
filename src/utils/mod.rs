//! Utility functions for code generation and URL processing.
//!
//! - [`code_generator`] - Short code generation and custom alias validation
//! - [`url_normalizer`] - Destination URL validation and normalization

pub mod code_generator;
pub mod url_normalizer;
