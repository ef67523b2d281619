//! Metric names emitted by the feed cache.

pub const FEED_CACHE_HIT: &str = "postdown_feed_cache_hit_total";
pub const FEED_CACHE_MISS: &str = "postdown_feed_cache_miss_total";
pub const FEED_CACHE_STORE: &str = "postdown_feed_cache_store_total";
pub const FEED_CACHE_INVALIDATION: &str = "postdown_feed_cache_invalidation_total";
