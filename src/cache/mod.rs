//! Feed cache.
//!
//! Holds assembled Markdown feeds keyed by the fingerprint of the
//! configuration that produced them:
//!
//! - [`CacheStore`]: namespaced key/value storage with TTL and namespace sweep
//! - [`FeedCache`]: the store bound to the feed namespace, with metrics
//! - [`CacheTrigger`]: clears the namespace when content the feed shows changes
//!
//! ```toml
//! [cache]
//! namespace = "postdown_markdown_feed"
//! capacity = 64
//! ```

mod config;
mod events;
mod keys;
pub(crate) mod lock;
pub mod metrics;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use events::MutationEvent;
pub use keys::{FeedFingerprint, namespaced_key};
pub use store::{CacheStore, FeedCache, MemoryCacheStore};
pub use trigger::CacheTrigger;
