//! Currency registry, rate model, and error/config types shared by the
//! forex engine and its command-line exporters.

pub mod config;
pub mod currency;
pub mod error;
pub mod support;
pub mod types;

pub use config::{config, Config};
pub use currency::{Currency, KeyStyle};
pub use error::{FeedError, ForexError, ForexResult};
pub use support::{Format, FormattedValue};
pub use types::{
    AmountInput, CacheEntry, CacheKey, DailyRateSet, FeedPayload, QueryOptions, RateEntry, RateSet,
};
