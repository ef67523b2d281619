//! In-memory content store backing every repository trait.
//!
//! The binary seeds it from the content archive; tests build it directly.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, ContentWriteRepo, RepoError, ResourcesRepo, SavedResource, SettingsRepo,
};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{CommentRecord, ResourceRecord, SiteSettingsRecord};
use crate::domain::types::CommentStatus;

const SOURCE: &str = "infra::memory";

pub struct MemoryContentStore {
    site: RwLock<SiteSettingsRecord>,
    resources: RwLock<HashMap<Uuid, ResourceRecord>>,
    comments: RwLock<HashMap<Uuid, CommentRecord>>,
}

impl MemoryContentStore {
    pub fn new(site: SiteSettingsRecord) -> Self {
        Self {
            site: RwLock::new(site),
            resources: RwLock::new(HashMap::new()),
            comments: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a resource without validation or notifications.
    pub fn insert_resource(&self, resource: ResourceRecord) {
        rw_write(&self.resources, SOURCE, "insert_resource").insert(resource.id, resource);
    }

    /// Insert or replace a comment without validation or notifications.
    pub fn insert_comment(&self, comment: CommentRecord) {
        rw_write(&self.comments, SOURCE, "insert_comment").insert(comment.id, comment);
    }

    pub fn remove_resource(&self, id: Uuid) -> Option<ResourceRecord> {
        rw_write(&self.resources, SOURCE, "remove_resource").remove(&id)
    }

    pub fn set_site_settings(&self, site: SiteSettingsRecord) {
        *rw_write(&self.site, SOURCE, "set_site_settings") = site;
    }

    pub fn resource_count(&self) -> usize {
        rw_read(&self.resources, SOURCE, "resource_count").len()
    }

    pub fn comment_count(&self) -> usize {
        rw_read(&self.comments, SOURCE, "comment_count").len()
    }

    /// Any resource with `slug`, published or not.
    pub fn resource_by_slug(&self, slug: &str) -> Option<ResourceRecord> {
        rw_read(&self.resources, SOURCE, "resource_by_slug")
            .values()
            .find(|resource| resource.slug == slug)
            .cloned()
    }

    fn update_comment(
        &self,
        id: Uuid,
        op: &'static str,
        apply: impl FnOnce(&mut CommentRecord),
    ) -> Result<CommentRecord, RepoError> {
        let mut comments = rw_write(&self.comments, SOURCE, op);
        let comment = comments
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("comment"))?;
        apply(comment);
        Ok(comment.clone())
    }
}

#[async_trait]
impl ResourcesRepo for MemoryContentStore {
    async fn list_published(
        &self,
        resource_types: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<ResourceRecord>, RepoError> {
        let resources = rw_read(&self.resources, SOURCE, "list_published");
        let mut published: Vec<ResourceRecord> = resources
            .values()
            .filter(|resource| {
                resource.is_published() && resource_types.contains(&resource.resource_type)
            })
            .cloned()
            .collect();
        published.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        published.truncate(limit);
        Ok(published)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ResourceRecord>, RepoError> {
        Ok(self
            .resource_by_slug(slug)
            .filter(ResourceRecord::is_published))
    }
}

#[async_trait]
impl CommentsRepo for MemoryContentStore {
    async fn list_approved(&self, resource_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let comments = rw_read(&self.comments, SOURCE, "list_approved");
        let mut approved: Vec<CommentRecord> = comments
            .values()
            .filter(|comment| comment.resource_id == resource_id && comment.status.is_visible())
            .cloned()
            .collect();
        approved.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(approved)
    }
}

#[async_trait]
impl SettingsRepo for MemoryContentStore {
    async fn load_site_settings(&self) -> Result<SiteSettingsRecord, RepoError> {
        Ok(rw_read(&self.site, SOURCE, "load_site_settings").clone())
    }
}

#[async_trait]
impl ContentWriteRepo for MemoryContentStore {
    async fn save_resource(&self, resource: ResourceRecord) -> Result<SavedResource, RepoError> {
        let mut resources = rw_write(&self.resources, SOURCE, "save_resource");
        let clash = resources
            .values()
            .any(|existing| existing.slug == resource.slug && existing.id != resource.id);
        if clash {
            return Err(RepoError::Duplicate {
                constraint: "resources_slug_key".to_string(),
            });
        }
        let previous = resources.insert(resource.id, resource.clone());
        Ok(SavedResource {
            record: resource,
            previous,
        })
    }

    async fn delete_resource(&self, id: Uuid) -> Result<ResourceRecord, RepoError> {
        let removed = rw_write(&self.resources, SOURCE, "delete_resource")
            .remove(&id)
            .ok_or_else(|| RepoError::not_found("resource"))?;
        rw_write(&self.comments, SOURCE, "delete_resource.comments")
            .retain(|_, comment| comment.resource_id != id);
        Ok(removed)
    }

    async fn set_resource_terms(
        &self,
        id: Uuid,
        categories: Vec<String>,
        tags: Vec<String>,
    ) -> Result<ResourceRecord, RepoError> {
        let mut resources = rw_write(&self.resources, SOURCE, "set_resource_terms");
        let resource = resources
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("resource"))?;
        resource.categories = categories;
        resource.tags = tags;
        Ok(resource.clone())
    }

    async fn post_comment(&self, comment: CommentRecord) -> Result<CommentRecord, RepoError> {
        if !rw_read(&self.resources, SOURCE, "post_comment.resource").contains_key(&comment.resource_id)
        {
            return Err(RepoError::InvalidInput {
                message: format!("resource {} does not exist", comment.resource_id),
            });
        }

        let mut comments = rw_write(&self.comments, SOURCE, "post_comment");
        if comments.contains_key(&comment.id) {
            return Err(RepoError::Duplicate {
                constraint: "comments_pkey".to_string(),
            });
        }
        comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn edit_comment(&self, id: Uuid, body_html: String) -> Result<CommentRecord, RepoError> {
        self.update_comment(id, "edit_comment", |comment| comment.body_html = body_html)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<CommentRecord, RepoError> {
        rw_write(&self.comments, SOURCE, "delete_comment")
            .remove(&id)
            .ok_or_else(|| RepoError::not_found("comment"))
    }

    async fn set_comment_status(
        &self,
        id: Uuid,
        status: CommentStatus,
    ) -> Result<CommentRecord, RepoError> {
        self.update_comment(id, "set_comment_status", |comment| comment.status = status)
    }
}
