//! RSS 2.0 documents served when Markdown was not negotiated.
//!
//! The site feed advertises the Markdown feed through an
//! `<atom:link rel="alternate" type="text/markdown">` element.

use std::sync::Arc;

use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

use crate::application::feed::FeedSettings;
use crate::application::negotiation::MARKDOWN_MEDIA_TYPE;
use crate::application::render::{ContentConverter, RenderError, document, plain_text};
use crate::application::repos::{CommentsRepo, ResourcesRepo, SettingsRepo};
use crate::domain::entities::{ResourceRecord, SiteSettingsRecord};

#[derive(Clone)]
pub struct SyndicationService {
    resources: Arc<dyn ResourcesRepo>,
    comments: Arc<dyn CommentsRepo>,
    site: Arc<dyn SettingsRepo>,
    converter: ContentConverter,
    feed: Arc<FeedSettings>,
}

impl SyndicationService {
    pub fn new(
        resources: Arc<dyn ResourcesRepo>,
        comments: Arc<dyn CommentsRepo>,
        site: Arc<dyn SettingsRepo>,
        converter: ContentConverter,
        feed: Arc<FeedSettings>,
    ) -> Self {
        Self {
            resources,
            comments,
            site,
            converter,
            feed,
        }
    }

    /// Site-wide RSS feed over the same resources as the Markdown feed.
    pub async fn rss_feed(&self) -> Result<String, RenderError> {
        let site = self.site.load_site_settings().await?;
        let config = self.feed.resolve();
        let resources = self
            .resources
            .list_published(&config.resource_types, config.max_posts)
            .await?;

        let mut items = String::new();
        for resource in &resources {
            let description = document::excerpt_html(resource, &self.converter);
            items.push_str(&item(
                &plain_text(&resource.title, self.converter.options()),
                &site.resource_url(&resource.slug),
                &resource.author,
                resource.published_at,
                &description,
            ));
        }

        let base = site.base_url();
        Ok(channel(
            &site,
            &site.name,
            &format!("{base}/"),
            &format!("{base}/feed/"),
            &items,
        ))
    }

    /// RSS feed of the approved comments on one resource.
    pub async fn comment_rss(&self, resource: &ResourceRecord) -> Result<String, RenderError> {
        let site = self.site.load_site_settings().await?;
        let comments = self.comments.list_approved(resource.id).await?;
        let title = plain_text(&resource.title, self.converter.options());
        let link = site.resource_url(&resource.slug);

        let mut items = String::new();
        for comment in &comments {
            items.push_str(&item(
                &format!("By: {}", comment.author),
                &format!("{link}#comment-{}", comment.id),
                &comment.author,
                comment.created_at,
                &comment.body_html,
            ));
        }

        Ok(channel(
            &site,
            &format!("Comments on: {title}"),
            &link,
            &format!("{link}feed/"),
            &items,
        ))
    }
}

fn item(
    title: &str,
    link: &str,
    author: &str,
    published: OffsetDateTime,
    description_html: &str,
) -> String {
    let pub_date = published
        .format(&Rfc2822)
        .unwrap_or_else(|_| published.to_string());
    format!(
        "    <item>\n      <title>{}</title>\n      <link>{}</link>\n      <guid>{}</guid>\n      <dc:creator>{}</dc:creator>\n      <pubDate>{}</pubDate>\n      <description><![CDATA[{}]]></description>\n    </item>\n",
        xml_escape(title),
        xml_escape(link),
        xml_escape(link),
        xml_escape(author),
        pub_date,
        cdata_safe(description_html),
    )
}

fn channel(
    site: &SiteSettingsRecord,
    title: &str,
    link: &str,
    self_link: &str,
    items: &str,
) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"{}\"?>\n<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\" />\n    <atom:link href=\"{}\" rel=\"alternate\" type=\"{}\" />\n{}  </channel>\n</rss>\n",
        xml_escape(&site.charset),
        xml_escape(title),
        xml_escape(link),
        xml_escape(&site.description),
        xml_escape(self_link),
        xml_escape(&site.markdown_feed_url()),
        MARKDOWN_MEDIA_TYPE,
        items
    )
}

fn cdata_safe(input: &str) -> String {
    input.replace("]]>", "]]]]><![CDATA[>")
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
