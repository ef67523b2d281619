//! Repository traits describing the content store consumed by the renderers.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, ResourceRecord, SiteSettingsRecord};
use crate::domain::types::CommentStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

#[async_trait]
pub trait ResourcesRepo: Send + Sync {
    /// Published resources whose type is in `resource_types`, newest first.
    async fn list_published(
        &self,
        resource_types: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<ResourceRecord>, RepoError>;

    /// Published resource routed at `slug`.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ResourceRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Approved comments of one resource, oldest first.
    async fn list_approved(&self, resource_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn load_site_settings(&self) -> Result<SiteSettingsRecord, RepoError>;
}

/// A stored resource together with the version it replaced.
#[derive(Debug, Clone)]
pub struct SavedResource {
    pub record: ResourceRecord,
    pub previous: Option<ResourceRecord>,
}

/// Writes that can change what the Markdown feed shows.
///
/// Every method returns the record as it stands after the write (or as it was
/// before removal) so callers can describe the mutation.
#[async_trait]
pub trait ContentWriteRepo: Send + Sync {
    async fn save_resource(&self, resource: ResourceRecord) -> Result<SavedResource, RepoError>;

    async fn delete_resource(&self, id: Uuid) -> Result<ResourceRecord, RepoError>;

    async fn set_resource_terms(
        &self,
        id: Uuid,
        categories: Vec<String>,
        tags: Vec<String>,
    ) -> Result<ResourceRecord, RepoError>;

    async fn post_comment(&self, comment: CommentRecord) -> Result<CommentRecord, RepoError>;

    async fn edit_comment(&self, id: Uuid, body_html: String) -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: Uuid) -> Result<CommentRecord, RepoError>;

    async fn set_comment_status(
        &self,
        id: Uuid,
        status: CommentStatus,
    ) -> Result<CommentRecord, RepoError>;
}
