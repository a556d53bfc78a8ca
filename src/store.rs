//! Process-local caches: access tokens by credential identity and resolved release years.
//!
//! Both caches replace whole entries under a write lock, so concurrent readers never observe a
//! partially written value. Nothing here is persisted; a restart starts cold.

pub mod token;
pub mod year;

pub use token::TokenCache;
pub use year::{YearCache, YearCacheEntry, YearCachePolicy, YearKey};
