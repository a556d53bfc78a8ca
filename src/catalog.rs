//! Release-year resolution against a rate-limited music catalog.
//!
//! The [`MetadataResolver`] asks the catalog's ISRC endpoint first and falls back to a
//! recording text search only when the exact lookup yields no year. Every outbound call passes
//! through one shared [`RateLimiter`], and every outcome, including "not found", lands in the
//! [`crate::store::YearCache`].

pub mod limiter;
pub mod model;
pub mod resolver;

pub use limiter::RateLimiter;
pub use model::*;
pub use resolver::{MetadataResolver, YearResolution};
