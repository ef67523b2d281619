//! Single-resource Markdown documents.

use std::sync::Arc;

use tracing::debug;

use crate::application::render::{ContentConverter, RenderError, document};
use crate::application::repos::{CommentsRepo, ResourcesRepo, SettingsRepo};
use crate::domain::entities::ResourceRecord;

/// Renders one resource, optionally followed by its comment thread.
///
/// Output is built fresh on every call; the feed cache is never consulted.
#[derive(Clone)]
pub struct ResourceRenderer {
    resources: Arc<dyn ResourcesRepo>,
    comments: Arc<dyn CommentsRepo>,
    site: Arc<dyn SettingsRepo>,
    converter: ContentConverter,
}

impl ResourceRenderer {
    pub fn new(
        resources: Arc<dyn ResourcesRepo>,
        comments: Arc<dyn CommentsRepo>,
        site: Arc<dyn SettingsRepo>,
        converter: ContentConverter,
    ) -> Self {
        Self {
            resources,
            comments,
            site,
            converter,
        }
    }

    pub async fn find(&self, slug: &str) -> Result<Option<ResourceRecord>, RenderError> {
        Ok(self.resources.find_by_slug(slug).await?)
    }

    pub async fn render_resource(&self, resource: &ResourceRecord) -> Result<String, RenderError> {
        let site = self.site.load_site_settings().await?;
        let out = document::resource_document(resource, &site, &self.converter)?;
        Ok(finish(out))
    }

    pub async fn render_resource_with_comments(
        &self,
        resource: &ResourceRecord,
    ) -> Result<String, RenderError> {
        let site = self.site.load_site_settings().await?;
        let mut out = document::resource_document(resource, &site, &self.converter)?;

        out.push_str("## Comments\n\n");
        let comments = self.comments.list_approved(resource.id).await?;
        debug!(
            target = "postdown::render::resource",
            slug = %resource.slug,
            comments = comments.len(),
            "Rendering comment thread"
        );

        if comments.is_empty() {
            out.push_str(document::NO_COMMENTS);
        }
        for comment in &comments {
            out.push_str(&document::comment_entry(comment, &self.converter)?);
            out.push_str(&format!("\n\n{}\n\n", document::SEPARATOR));
        }

        Ok(finish(out))
    }
}

fn finish(out: String) -> String {
    let mut out = out.trim_end().to_string();
    out.push('\n');
    out
}
