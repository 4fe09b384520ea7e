// =============================================================================
// Generic TTL cache + background-refreshed fetcher
// =============================================================================

mod cached_fetcher;
mod ttl_cache;

pub use cached_fetcher::CachedFetcher;
pub use ttl_cache::{CacheStats, TtlCache};
