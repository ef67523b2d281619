//! TOML content archive that seeds the in-memory store.
//!
//! ```toml
//! [site]
//! name = "My Blog"
//!
//! [[resources]]
//! slug = "hello-world"
//! title = "Hello world!"
//! published_at = "2024-01-01T00:00:00Z"
//! body = "<p>Welcome.</p>"
//!
//! [[comments]]
//! resource = "hello-world"
//! author = "A commenter"
//! created_at = "2024-01-02T00:00:00Z"
//! body = "<p>Hi!</p>"
//! ```
//!
//! Timestamps are RFC 3339 strings. Comments reference resources by slug.

use std::collections::HashMap;
use std::{fs, io, path::Path};

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::domain::entities::{
    CommentRecord, DEFAULT_RESOURCE_TYPE, ResourceRecord, SiteSettingsRecord,
};
use crate::domain::error::DomainError;
use crate::domain::slug::validate_slug;
use crate::domain::types::{CommentStatus, ResourceStatus};
use crate::infra::error::InfraError;
use crate::infra::memory::MemoryContentStore;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentArchive {
    #[serde(default)]
    site: Option<SiteSnapshot>,
    #[serde(default)]
    resources: Vec<ResourceSnapshot>,
    #[serde(default)]
    comments: Vec<CommentSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteSnapshot {
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    charset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceSnapshot {
    id: Option<Uuid>,
    slug: String,
    title: String,
    #[serde(default)]
    body: String,
    excerpt: Option<String>,
    #[serde(default = "default_author")]
    author: String,
    #[serde(with = "time::serde::rfc3339")]
    published_at: OffsetDateTime,
    #[serde(default = "default_resource_type", rename = "type")]
    resource_type: String,
    #[serde(default)]
    status: ResourceStatus,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommentSnapshot {
    id: Option<Uuid>,
    resource: String,
    author: String,
    #[serde(default)]
    body: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default)]
    status: CommentStatus,
}

fn default_author() -> String {
    "admin".to_string()
}

fn default_resource_type() -> String {
    DEFAULT_RESOURCE_TYPE.to_string()
}

/// Counts of records loaded from an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub resources: usize,
    pub comments: usize,
}

impl ContentArchive {
    pub fn parse(text: &str, origin: &str) -> Result<Self, AppError> {
        toml::from_str(text)
            .map_err(|err| AppError::from(InfraError::archive(origin, err.to_string())))
    }

    /// Site settings from `base` with any `[site]` values of the archive applied.
    pub fn site_settings(&self, base: SiteSettingsRecord) -> SiteSettingsRecord {
        let Some(site) = &self.site else {
            return base;
        };
        SiteSettingsRecord {
            name: site.name.clone().unwrap_or(base.name),
            description: site.description.clone().unwrap_or(base.description),
            public_site_url: site.url.clone().unwrap_or(base.public_site_url),
            charset: site.charset.clone().unwrap_or(base.charset),
        }
    }

    /// Validate every record and resolve comment references.
    pub fn into_records(self) -> Result<(Vec<ResourceRecord>, Vec<CommentRecord>), AppError> {
        let mut ids_by_slug: HashMap<String, Uuid> = HashMap::new();
        let mut resources = Vec::with_capacity(self.resources.len());

        for snapshot in self.resources {
            validate_slug(&snapshot.slug)?;
            if ids_by_slug.contains_key(&snapshot.slug) {
                return Err(DomainError::invalid(
                    "resource",
                    format!("slug `{}` appears more than once", snapshot.slug),
                )
                .into());
            }

            let id = snapshot.id.unwrap_or_else(Uuid::new_v4);
            ids_by_slug.insert(snapshot.slug.clone(), id);
            resources.push(ResourceRecord {
                id,
                slug: snapshot.slug,
                title: snapshot.title,
                body_html: snapshot.body,
                excerpt_html: snapshot.excerpt,
                author: snapshot.author,
                published_at: snapshot.published_at,
                resource_type: snapshot.resource_type,
                status: snapshot.status,
                categories: snapshot.categories,
                tags: snapshot.tags,
            });
        }

        let mut comments = Vec::with_capacity(self.comments.len());
        for snapshot in self.comments {
            let resource_id = ids_by_slug
                .get(&snapshot.resource)
                .copied()
                .ok_or_else(|| DomainError::not_found("resource", snapshot.resource.clone()))?;
            comments.push(CommentRecord {
                id: snapshot.id.unwrap_or_else(Uuid::new_v4),
                resource_id,
                author: snapshot.author,
                body_html: snapshot.body,
                created_at: snapshot.created_at,
                status: snapshot.status,
            });
        }

        Ok((resources, comments))
    }
}

/// Seed `store` from the archive at `path`.
///
/// A missing archive is not an error: the store keeps `base_site` and no content.
pub fn load_into(
    store: &MemoryContentStore,
    path: &Path,
    base_site: SiteSettingsRecord,
) -> Result<ArchiveSummary, AppError> {
    let origin = path.display().to_string();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(
                target = "postdown::archive",
                path = %origin,
                "Content archive not found; starting with an empty store"
            );
            store.set_site_settings(base_site);
            return Ok(ArchiveSummary::default());
        }
        Err(err) => return Err(InfraError::Io(err).into()),
    };

    let archive = ContentArchive::parse(&text, &origin)?;
    store.set_site_settings(archive.site_settings(base_site));

    let (resources, comments) = archive.into_records()?;
    let summary = ArchiveSummary {
        resources: resources.len(),
        comments: comments.len(),
    };
    for resource in resources {
        store.insert_resource(resource);
    }
    for comment in comments {
        store.insert_comment(comment);
    }

    info!(
        target = "postdown::archive",
        path = %origin,
        resources = summary.resources,
        comments = summary.comments,
        "Content archive loaded"
    );
    Ok(summary)
}
