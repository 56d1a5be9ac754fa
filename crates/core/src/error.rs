//! Error types for the forex engine.
//!
//! Two tiers, mirroring the feed/business-logic split: [`FeedError`] covers
//! HTTP retrieval and XML parsing, [`ForexError`] covers everything a public
//! operation can fail with (it wraps `FeedError` as one of its variants).

use thiserror::Error;

/// Errors from the feed orchestrator's HTTP and XML stages.
#[derive(Error, Debug, Clone)]
pub enum FeedError {
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("HTTP {status} retrieving {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to parse feed XML: {message}")]
    Xml { message: String },

    #[error("feed returned no daily rate sets")]
    Empty,
}

/// The full error taxonomy exposed by public forex-engine operations.
///
/// Every reason has a stable name (the variant) and, where useful, a
/// human-readable message carried in the variant's fields.
#[derive(Error, Debug, Clone)]
pub enum ForexError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("invalid date: {0}")]
    Date(String),

    #[error("rate not found for date: {0}")]
    DateNotFound(String),

    #[error("unknown currency: {0}")]
    Currency(String),

    #[error("invalid amount or format: {0}")]
    Format(String),

    #[error("cache resolver failed")]
    ResolverFailed,

    #[error("base currency not found: {0}")]
    BaseCurrencyNotFound(String),

    #[error("invalid exchange arguments: {0}")]
    InvalidExchange(String),
}

/// Result alias used throughout the engine's public surface.
pub type ForexResult<T> = Result<T, ForexError>;

impl ForexError {
    /// Stable, lower-snake-case reason symbol, for callers that want to
    /// match on the failure kind rather than the `Display` message.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Feed(_) => "feed_error",
            Self::Date(_) => "date_error",
            Self::DateNotFound(_) => "date_error",
            Self::Currency(_) => "currency_error",
            Self::Format(_) => "format_error",
            Self::ResolverFailed => "resolver_failed",
            Self::BaseCurrencyNotFound(_) => "base_currency_not_found",
            Self::InvalidExchange(_) => "invalid_exchange",
        }
    }
}
