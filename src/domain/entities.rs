//! Domain entities read by the Markdown renderers.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{CommentStatus, ResourceStatus};

/// Resource type served as Markdown when nothing else is configured.
pub const DEFAULT_RESOURCE_TYPE: &str = "post";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRecord {
    pub id: Uuid,
    pub slug: String,
    /// May carry inline markup; headings use its text only.
    pub title: String,
    pub body_html: String,
    pub excerpt_html: Option<String>,
    pub author: String,
    pub published_at: OffsetDateTime,
    pub resource_type: String,
    pub status: ResourceStatus,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl ResourceRecord {
    pub fn is_published(&self) -> bool {
        self.status == ResourceStatus::Published
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub author: String,
    pub body_html: String,
    pub created_at: OffsetDateTime,
    pub status: CommentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSettingsRecord {
    pub name: String,
    pub description: String,
    pub public_site_url: String,
    pub charset: String,
}

impl Default for SiteSettingsRecord {
    fn default() -> Self {
        Self {
            name: "postdown".to_string(),
            description: String::new(),
            public_site_url: "http://localhost:3000/".to_string(),
            charset: "UTF-8".to_string(),
        }
    }
}

impl SiteSettingsRecord {
    /// Public base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.public_site_url.trim().trim_end_matches('/')
    }

    pub fn resource_url(&self, slug: &str) -> String {
        format!("{}/{slug}/", self.base_url())
    }

    pub fn markdown_feed_url(&self) -> String {
        format!("{}/feed/markdown/", self.base_url())
    }
}
