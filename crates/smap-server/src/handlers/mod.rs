//! HTTP request handlers.

pub(crate) mod sitemaps;
