//! Synchronous feed invalidation on content mutations.

use std::sync::Arc;

use tracing::debug;

use crate::application::feed::FeedSettings;

use super::events::MutationEvent;
use super::store::FeedCache;

/// Clears cached feeds when a mutation touches content they show.
///
/// The feed configuration is resolved at notification time, so extension
/// overrides decide scope exactly as they decide assembly.
///
/// ```ignore
/// // After a successful resource update:
/// trigger.notify(&MutationEvent::ResourceSaved { resource_id, resource_type, previous_type });
/// ```
#[derive(Debug, Clone)]
pub struct CacheTrigger {
    cache: FeedCache,
    settings: Arc<FeedSettings>,
}

impl CacheTrigger {
    pub fn new(cache: FeedCache, settings: Arc<FeedSettings>) -> Self {
        Self { cache, settings }
    }

    /// Returns true when the feed namespace was cleared.
    pub fn notify(&self, event: &MutationEvent) -> bool {
        let config = self.settings.resolve();
        if !event.affects_feed(&config) {
            debug!(
                target = "postdown::cache",
                event_kind = event.kind(),
                "Mutation outside feed scope; cache kept"
            );
            return false;
        }

        self.cache.invalidate_all();
        debug!(
            target = "postdown::cache",
            event_kind = event.kind(),
            "Mutation invalidated feed cache"
        );
        true
    }
}
