//! Content writes that keep the feed cache consistent.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{ContentWriteRepo, RepoError, SavedResource};
use crate::cache::{CacheTrigger, MutationEvent};
use crate::domain::entities::{CommentRecord, ResourceRecord};
use crate::domain::error::DomainError;
use crate::domain::slug::validate_slug;
use crate::domain::types::CommentStatus;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Performs writes and notifies the cache trigger once each write succeeds.
///
/// This is the write entry point for a host embedding the crate. The bundled
/// binary is read-only: it loads the content archive at startup and never
/// builds a `ContentService`.
///
/// Invalidation happens before the call returns; a failed write never
/// invalidates.
#[derive(Clone)]
pub struct ContentService {
    repo: Arc<dyn ContentWriteRepo>,
    trigger: CacheTrigger,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentWriteRepo>, trigger: CacheTrigger) -> Self {
        Self { repo, trigger }
    }

    pub async fn save_resource(&self, resource: ResourceRecord) -> Result<ResourceRecord, ContentError> {
        validate_slug(&resource.slug)?;
        if resource.title.trim().is_empty() {
            return Err(DomainError::invalid("resource", "title must not be empty").into());
        }

        let SavedResource { record, previous } = self.repo.save_resource(resource).await?;
        self.notify(MutationEvent::ResourceSaved {
            resource_id: record.id,
            resource_type: record.resource_type.clone(),
            previous_type: previous.map(|old| old.resource_type),
        });
        Ok(record)
    }

    pub async fn delete_resource(&self, id: Uuid) -> Result<ResourceRecord, ContentError> {
        let removed = self.repo.delete_resource(id).await?;
        self.notify(MutationEvent::ResourceDeleted {
            resource_id: removed.id,
            resource_type: removed.resource_type.clone(),
        });
        Ok(removed)
    }

    pub async fn set_resource_terms(
        &self,
        id: Uuid,
        categories: Vec<String>,
        tags: Vec<String>,
    ) -> Result<ResourceRecord, ContentError> {
        let updated = self.repo.set_resource_terms(id, categories, tags).await?;
        self.notify(MutationEvent::ResourceTermsChanged {
            resource_id: updated.id,
        });
        Ok(updated)
    }

    pub async fn post_comment(&self, comment: CommentRecord) -> Result<CommentRecord, ContentError> {
        if comment.author.trim().is_empty() {
            return Err(DomainError::invalid("comment", "author must not be empty").into());
        }

        let posted = self.repo.post_comment(comment).await?;
        self.notify(MutationEvent::CommentPosted {
            comment_id: posted.id,
            resource_id: posted.resource_id,
        });
        Ok(posted)
    }

    pub async fn edit_comment(&self, id: Uuid, body_html: String) -> Result<CommentRecord, ContentError> {
        let edited = self.repo.edit_comment(id, body_html).await?;
        self.notify(MutationEvent::CommentEdited {
            comment_id: edited.id,
            resource_id: edited.resource_id,
        });
        Ok(edited)
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<CommentRecord, ContentError> {
        let removed = self.repo.delete_comment(id).await?;
        self.notify(MutationEvent::CommentDeleted {
            comment_id: removed.id,
            resource_id: removed.resource_id,
        });
        Ok(removed)
    }

    pub async fn set_comment_status(
        &self,
        id: Uuid,
        status: CommentStatus,
    ) -> Result<CommentRecord, ContentError> {
        let updated = self.repo.set_comment_status(id, status).await?;
        self.notify(MutationEvent::CommentStatusChanged {
            comment_id: updated.id,
            resource_id: updated.resource_id,
        });
        Ok(updated)
    }

    fn notify(&self, event: MutationEvent) {
        let invalidated = self.trigger.notify(&event);
        info!(
            target = "postdown::content",
            event_kind = event.kind(),
            invalidated,
            "Content mutation applied"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::OffsetDateTime;

    use super::*;
    use crate::application::Extensions;
    use crate::application::feed::{FeedDefaults, FeedSettings};
    use crate::cache::{CacheConfig, FeedCache, FeedFingerprint, MemoryCacheStore};
    use crate::domain::entities::SiteSettingsRecord;
    use crate::domain::types::ResourceStatus;
    use crate::infra::memory::MemoryContentStore;

    struct Fixture {
        service: ContentService,
        cache: FeedCache,
        fingerprint: FeedFingerprint,
        store: Arc<MemoryContentStore>,
    }

    fn fixture(include_comments: bool) -> Fixture {
        let store = Arc::new(MemoryContentStore::new(SiteSettingsRecord::default()));
        let cache = FeedCache::new(
            Arc::new(MemoryCacheStore::new(&CacheConfig::default())),
            "feed",
        );
        let defaults = FeedDefaults {
            include_comments,
            ..Default::default()
        };
        let settings = Arc::new(FeedSettings::new(defaults, Extensions::new()));
        let fingerprint = FeedFingerprint::of(&settings.resolve());
        let trigger = CacheTrigger::new(cache.clone(), settings);
        Fixture {
            service: ContentService::new(store.clone(), trigger),
            cache,
            fingerprint,
            store,
        }
    }

    impl Fixture {
        fn prime(&self) {
            self.cache
                .put(&self.fingerprint, "cached".to_string(), Duration::from_secs(60));
        }

        fn cached(&self) -> bool {
            self.cache.get(&self.fingerprint).is_some()
        }
    }

    fn resource(slug: &str, resource_type: &str) -> ResourceRecord {
        ResourceRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: "Title".to_string(),
            body_html: "<p>Body</p>".to_string(),
            excerpt_html: None,
            author: "admin".to_string(),
            published_at: OffsetDateTime::now_utc(),
            resource_type: resource_type.to_string(),
            status: ResourceStatus::Published,
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn comment(resource_id: Uuid) -> CommentRecord {
        CommentRecord {
            id: Uuid::new_v4(),
            resource_id,
            author: "Ana".to_string(),
            body_html: "<p>Hi</p>".to_string(),
            created_at: OffsetDateTime::now_utc(),
            status: CommentStatus::Pending,
        }
    }

    #[tokio::test]
    async fn resource_writes_in_feed_types_invalidate() {
        let fixture = fixture(false);
        let post = resource("post-one", "post");

        fixture.prime();
        fixture.service.save_resource(post.clone()).await.unwrap();
        assert!(!fixture.cached());

        fixture.prime();
        fixture.service.delete_resource(post.id).await.unwrap();
        assert!(!fixture.cached());
    }

    #[tokio::test]
    async fn resource_writes_outside_feed_types_keep_cache() {
        let fixture = fixture(false);
        fixture.prime();
        fixture
            .service
            .save_resource(resource("about", "page"))
            .await
            .unwrap();
        assert!(fixture.cached());
    }

    #[tokio::test]
    async fn type_change_out_of_feed_invalidates() {
        let fixture = fixture(false);
        let post = resource("moving", "post");
        fixture.service.save_resource(post.clone()).await.unwrap();

        fixture.prime();
        let page = ResourceRecord {
            resource_type: "page".to_string(),
            ..post
        };
        fixture.service.save_resource(page).await.unwrap();
        assert!(!fixture.cached());
    }

    #[tokio::test]
    async fn term_changes_keep_cache() {
        let fixture = fixture(true);
        let post = resource("post-one", "post");
        fixture.store.insert_resource(post.clone());

        fixture.prime();
        let updated = fixture
            .service
            .set_resource_terms(post.id, vec!["News".to_string()], vec!["rust".to_string()])
            .await
            .unwrap();
        assert_eq!(updated.tags, vec!["rust"]);
        assert!(fixture.cached());
    }

    #[tokio::test]
    async fn comment_lifecycle_invalidates_when_comments_shown() {
        let fixture = fixture(true);
        let post = resource("post-one", "post");
        fixture.store.insert_resource(post.clone());
        let posted = comment(post.id);

        fixture.prime();
        fixture.service.post_comment(posted.clone()).await.unwrap();
        assert!(!fixture.cached());

        fixture.prime();
        fixture
            .service
            .set_comment_status(posted.id, CommentStatus::Approved)
            .await
            .unwrap();
        assert!(!fixture.cached());

        fixture.prime();
        fixture
            .service
            .edit_comment(posted.id, "<p>Edited</p>".to_string())
            .await
            .unwrap();
        assert!(!fixture.cached());

        fixture.prime();
        fixture.service.delete_comment(posted.id).await.unwrap();
        assert!(!fixture.cached());
    }

    #[tokio::test]
    async fn comment_writes_keep_cache_when_comments_hidden() {
        let fixture = fixture(false);
        let post = resource("post-one", "post");
        fixture.store.insert_resource(post.clone());

        fixture.prime();
        fixture.service.post_comment(comment(post.id)).await.unwrap();
        assert!(fixture.cached());
    }

    #[tokio::test]
    async fn failed_writes_do_not_invalidate() {
        let fixture = fixture(true);
        fixture.prime();

        let missing = fixture.service.delete_resource(Uuid::new_v4()).await;
        assert!(matches!(
            missing,
            Err(ContentError::Repo(RepoError::NotFound { .. }))
        ));

        let invalid = fixture
            .service
            .save_resource(resource("Not A Slug", "post"))
            .await;
        assert!(matches!(invalid, Err(ContentError::Domain(_))));
        assert!(fixture.cached());
    }
}
