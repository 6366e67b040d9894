//! Shared utilities.
//!
//! - [`HttpClient`]: reqwest client wrapper with JSON-API and browser flavours
//! - [`ValidationError`] and the `require_*` helpers used by every tool

mod http;
mod validate;

pub use http::{HttpClient, BROWSER_USER_AGENT};
pub use validate::{
    clamp_count, is_private_host, require_min_chars, require_non_empty, require_one_of, require_range,
    validate_url, ValidationError,
};
