//! Aggregate Markdown feed.
//!
//! The feed lists the newest published resources of the configured types,
//! each with its metadata, optional excerpt, converted body and optional
//! comment thread. Assembled text is cached under the fingerprint of the
//! configuration that produced it; see [`crate::cache`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::extensions::Extensions;
use crate::application::render::{ContentConverter, RenderError, document};
use crate::application::repos::{CommentsRepo, ResourcesRepo, SettingsRepo};
use crate::cache::{FeedCache, FeedFingerprint};
use crate::domain::entities::{DEFAULT_RESOURCE_TYPE, ResourceRecord, SiteSettingsRecord};

pub const NO_POSTS: &str = "No posts available.";

const DEFAULT_MAX_POSTS: usize = 10;
const DEFAULT_CACHE_SECS: u64 = 3600;

/// Parameters that fully determine one feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfiguration {
    pub resource_types: BTreeSet<String>,
    pub max_posts: usize,
    pub include_comments: bool,
    pub include_excerpt: bool,
    pub cache_duration: Duration,
}

impl Default for FeedConfiguration {
    fn default() -> Self {
        FeedSettings::new(FeedDefaults::default(), Extensions::new()).resolve()
    }
}

/// Configured feed values before extensions run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDefaults {
    pub resource_types: Vec<String>,
    pub max_posts: usize,
    pub include_comments: bool,
    pub include_excerpt: bool,
    pub cache_duration: Duration,
}

impl Default for FeedDefaults {
    fn default() -> Self {
        Self {
            resource_types: vec![DEFAULT_RESOURCE_TYPE.to_string()],
            max_posts: DEFAULT_MAX_POSTS,
            include_comments: false,
            include_excerpt: false,
            cache_duration: Duration::from_secs(DEFAULT_CACHE_SECS),
        }
    }
}

impl From<&crate::config::FeedDefaultSettings> for FeedDefaults {
    fn from(settings: &crate::config::FeedDefaultSettings) -> Self {
        Self {
            resource_types: settings.resource_types.clone(),
            max_posts: settings.max_posts,
            include_comments: settings.include_comments,
            include_excerpt: settings.include_excerpt,
            cache_duration: Duration::from_secs(settings.cache_seconds),
        }
    }
}

/// Resolves the effective [`FeedConfiguration`] from defaults and extensions.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    defaults: FeedDefaults,
    extensions: Extensions,
}

impl FeedSettings {
    pub fn new(defaults: FeedDefaults, extensions: Extensions) -> Self {
        Self {
            defaults,
            extensions,
        }
    }

    pub fn resolve(&self) -> FeedConfiguration {
        let defaults = &self.defaults;
        let extensions = &self.extensions;

        FeedConfiguration {
            resource_types: extensions
                .feed_resource_types(defaults.resource_types.clone())
                .into_iter()
                .map(|resource_type| resource_type.trim().to_string())
                .filter(|resource_type| !resource_type.is_empty())
                .collect(),
            max_posts: extensions.feed_post_count(defaults.max_posts),
            include_comments: extensions.feed_include_comments(defaults.include_comments),
            include_excerpt: extensions.feed_include_excerpt(defaults.include_excerpt),
            cache_duration: extensions.feed_cache_duration(defaults.cache_duration),
        }
    }
}

#[derive(Clone)]
pub struct FeedService {
    resources: Arc<dyn ResourcesRepo>,
    comments: Arc<dyn CommentsRepo>,
    site: Arc<dyn SettingsRepo>,
    converter: ContentConverter,
    cache: FeedCache,
    settings: Arc<FeedSettings>,
    extensions: Extensions,
}

impl FeedService {
    pub fn new(
        resources: Arc<dyn ResourcesRepo>,
        comments: Arc<dyn CommentsRepo>,
        site: Arc<dyn SettingsRepo>,
        converter: ContentConverter,
        cache: FeedCache,
        settings: Arc<FeedSettings>,
        extensions: Extensions,
    ) -> Self {
        Self {
            resources,
            comments,
            site,
            converter,
            cache,
            settings,
            extensions,
        }
    }

    pub fn configuration(&self) -> FeedConfiguration {
        self.settings.resolve()
    }

    /// The feed for the configuration currently in effect.
    pub async fn markdown_feed(&self) -> Result<String, RenderError> {
        let config = self.configuration();
        self.assemble(&config).await
    }

    /// Cached feed for `config`, assembling and caching it on a miss.
    ///
    /// Nothing is cached when assembly fails.
    pub async fn assemble(&self, config: &FeedConfiguration) -> Result<String, RenderError> {
        let fingerprint = FeedFingerprint::of(config);
        if let Some(cached) = self.cache.get(&fingerprint) {
            return Ok(cached);
        }

        let text = self.build(config).await?;
        let text = self.extensions.markdown_feed(text, config);
        self.cache
            .put(&fingerprint, text.clone(), config.cache_duration);

        info!(
            target = "postdown::feed",
            %fingerprint,
            bytes = text.len(),
            max_posts = config.max_posts,
            "Markdown feed assembled"
        );
        Ok(text)
    }

    async fn build(&self, config: &FeedConfiguration) -> Result<String, RenderError> {
        let site = self.site.load_site_settings().await?;
        let mut out = feed_header(&site, OffsetDateTime::now_utc());

        let resources = self
            .resources
            .list_published(&config.resource_types, config.max_posts)
            .await?;
        debug!(
            target = "postdown::feed",
            count = resources.len(),
            "Loaded feed resources"
        );

        if resources.is_empty() {
            out.push_str(NO_POSTS);
            out.push('\n');
            return Ok(out);
        }

        let mut entries = Vec::with_capacity(resources.len());
        for resource in &resources {
            entries.push(self.entry(resource, &site, config).await?);
        }
        out.push_str(&entries.join(&format!("{}\n\n", document::SEPARATOR)));
        Ok(out)
    }

    async fn entry(
        &self,
        resource: &ResourceRecord,
        site: &SiteSettingsRecord,
        config: &FeedConfiguration,
    ) -> Result<String, RenderError> {
        let mut out = document::resource_header(resource, site, &self.converter);

        if config.include_excerpt {
            let excerpt = document::excerpt_markdown(resource, &self.converter)?;
            if !excerpt.is_empty() {
                out.push_str(&format!("**Excerpt:** {excerpt}\n\n"));
            }
        }

        let body = self.converter.convert(&resource.body_html)?;
        if !body.is_empty() {
            out.push_str(&body);
            out.push_str("\n\n");
        }

        if config.include_comments {
            out.push_str("## Comments\n\n");
            let comments = self.comments.list_approved(resource.id).await?;
            if comments.is_empty() {
                out.push_str(document::NO_COMMENTS);
                out.push_str("\n\n");
            }
            for comment in &comments {
                out.push_str(&document::comment_entry(comment, &self.converter)?);
                out.push_str("\n\n");
            }
        }

        Ok(out)
    }
}

fn feed_header(site: &SiteSettingsRecord, generated_at: OffsetDateTime) -> String {
    let mut out = format!("# {} - Markdown Feed\n\n", site.name);
    let description = site.description.trim();
    if !description.is_empty() {
        out.push_str(description);
        out.push_str("\n\n");
    }
    out.push_str(&format!(
        "**Generated:** {}\n**Feed URL:** {}\n\n{}\n\n",
        document::format_timestamp(generated_at),
        site.markdown_feed_url(),
        document::SEPARATOR
    ));
    out
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::application::render::ConversionOptions;
    use crate::cache::{CacheConfig, MemoryCacheStore};
    use crate::domain::entities::CommentRecord;
    use crate::domain::types::{CommentStatus, ResourceStatus};
    use crate::infra::memory::MemoryContentStore;

    fn resource(slug: &str, title: &str, body: &str, day: u8) -> ResourceRecord {
        ResourceRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: title.to_string(),
            body_html: body.to_string(),
            excerpt_html: None,
            author: "admin".to_string(),
            published_at: datetime!(2024-05-01 12:00 UTC) + time::Duration::days(i64::from(day)),
            resource_type: "post".to_string(),
            status: ResourceStatus::Published,
            categories: Vec::new(),
            tags: vec!["intro".to_string()],
        }
    }

    fn service(store: Arc<MemoryContentStore>, extensions: Extensions) -> FeedService {
        let cache = FeedCache::new(
            Arc::new(MemoryCacheStore::new(&CacheConfig::default())),
            "feed",
        );
        FeedService::new(
            store.clone(),
            store.clone(),
            store,
            ContentConverter::new(ConversionOptions::default(), extensions.clone()),
            cache,
            Arc::new(FeedSettings::new(FeedDefaults::default(), extensions.clone())),
            extensions,
        )
    }

    fn site() -> SiteSettingsRecord {
        SiteSettingsRecord {
            name: "Test Blog".to_string(),
            description: "Just another blog".to_string(),
            public_site_url: "https://example.com".to_string(),
            charset: "UTF-8".to_string(),
        }
    }

    #[test]
    fn resolve_applies_extension_filters() {
        let extensions = Extensions::new()
            .with_feed_resource_types(|_| vec![" page ".to_string(), "post".to_string()])
            .with_feed_post_count(|_| 3)
            .with_feed_include_comments(|_| true)
            .with_feed_include_excerpt(|_| true)
            .with_feed_cache_duration(|_| Duration::from_secs(5));
        let config = FeedSettings::new(FeedDefaults::default(), extensions).resolve();

        assert_eq!(
            config.resource_types,
            BTreeSet::from(["page".to_string(), "post".to_string()])
        );
        assert_eq!(config.max_posts, 3);
        assert!(config.include_comments);
        assert!(config.include_excerpt);
        assert_eq!(config.cache_duration, Duration::from_secs(5));
    }

    #[test]
    fn default_configuration_matches_defaults() {
        let config = FeedConfiguration::default();
        assert_eq!(config.resource_types, BTreeSet::from(["post".to_string()]));
        assert_eq!(config.max_posts, 10);
        assert!(!config.include_comments);
        assert!(!config.include_excerpt);
        assert_eq!(config.cache_duration, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn empty_store_yields_notice() {
        let store = Arc::new(MemoryContentStore::new(site()));
        let feed = service(store, Extensions::new())
            .markdown_feed()
            .await
            .unwrap();

        assert!(feed.starts_with("# Test Blog - Markdown Feed\n\nJust another blog\n\n"));
        assert!(feed.contains("**Feed URL:** https://example.com/feed/markdown/"));
        assert!(feed.trim_end().ends_with(NO_POSTS));
    }

    #[tokio::test]
    async fn feed_lists_newest_first_within_limit() {
        let store = Arc::new(MemoryContentStore::new(site()));
        store.insert_resource(resource("first", "First", "<p>one</p>", 1));
        store.insert_resource(resource("second", "Second", "<p>two</p>", 2));
        store.insert_resource(resource("third", "Third", "<p>three</p>", 3));

        let feed = service(store, Extensions::new().with_feed_post_count(|_| 2))
            .markdown_feed()
            .await
            .unwrap();

        let third = feed.find("# Third").unwrap();
        let second = feed.find("# Second").unwrap();
        assert!(third < second);
        assert!(!feed.contains("# First"));
        assert!(feed.contains("**Tags:** intro"));
        assert!(feed.contains("\n---\n\n# Second"));
        assert!(!feed.contains("\n\n\n"));
    }

    #[tokio::test]
    async fn excerpt_and_comments_are_optional_sections() {
        let store = Arc::new(MemoryContentStore::new(site()));
        let long_body = format!("<p>{}</p>", vec!["word"; 60].join(" "));
        let post = resource("long", "Long", &long_body, 4);
        let post_id = post.id;
        store.insert_resource(post);
        store.insert_resource(resource("quiet", "Quiet", "", 1));
        store.insert_comment(CommentRecord {
            id: Uuid::new_v4(),
            resource_id: post_id,
            author: "Ana".to_string(),
            body_html: "<p>Great</p>".to_string(),
            created_at: datetime!(2024-05-05 09:00 UTC),
            status: CommentStatus::Approved,
        });
        store.insert_comment(CommentRecord {
            id: Uuid::new_v4(),
            resource_id: post_id,
            author: "Bot".to_string(),
            body_html: "<p>Buy now</p>".to_string(),
            created_at: datetime!(2024-05-05 10:00 UTC),
            status: CommentStatus::Spam,
        });

        let plain = service(store.clone(), Extensions::new())
            .markdown_feed()
            .await
            .unwrap();
        assert!(!plain.contains("**Excerpt:**"));
        assert!(!plain.contains("## Comments"));

        let extensions = Extensions::new()
            .with_feed_include_excerpt(|_| true)
            .with_feed_include_comments(|_| true);
        let full = service(store, extensions).markdown_feed().await.unwrap();

        let excerpt = format!("**Excerpt:** {} […]", vec!["word"; 55].join(" "));
        assert!(full.contains(&excerpt), "{full}");
        assert!(full.contains("## Comments\n\n**Ana** — 2024-05-05T09:00:00Z\n\nGreat"));
        assert!(!full.contains("Buy now"));
        assert!(full.contains("# Quiet"));
        assert!(full.contains(document::NO_COMMENTS));
    }

    #[tokio::test]
    async fn derived_excerpt_does_not_reinterpret_escaped_markup() {
        let store = Arc::new(MemoryContentStore::new(site()));
        store.insert_resource(resource(
            "escaped",
            "Escaped",
            "<p>Write &lt;b&gt; then text. Also &lt;script&gt;x&lt;/script&gt; done.</p>",
            1,
        ));

        let extensions = Extensions::new().with_feed_include_excerpt(|_| true);
        let feed = service(store, extensions).markdown_feed().await.unwrap();

        let excerpt = feed
            .lines()
            .find(|line| line.starts_with("**Excerpt:**"))
            .expect("excerpt line");
        assert!(!excerpt.contains("**then"), "{excerpt}");
        assert!(excerpt.ends_with("done."), "{excerpt}");
    }

    #[tokio::test]
    async fn cached_text_is_returned_unchanged() {
        let store = Arc::new(MemoryContentStore::new(site()));
        store.insert_resource(resource("hello", "Hello", "<p>Hi</p>", 1));
        let service = service(store.clone(), Extensions::new());

        let first = service.markdown_feed().await.unwrap();
        store.insert_resource(resource("later", "Later", "<p>New</p>", 2));
        let second = service.markdown_feed().await.unwrap();

        assert_eq!(first, second);
        assert!(!second.contains("# Later"));
    }

    #[tokio::test]
    async fn markdown_feed_extension_output_is_cached() {
        let store = Arc::new(MemoryContentStore::new(site()));
        let extensions =
            Extensions::new().with_markdown_feed(|text, config| {
                format!("{text}\n<!-- {} posts max -->\n", config.max_posts)
            });
        let service = service(store, extensions);

        let first = service.markdown_feed().await.unwrap();
        assert!(first.ends_with("<!-- 10 posts max -->\n"));
        assert_eq!(service.markdown_feed().await.unwrap(), first);
    }

    #[tokio::test]
    async fn conversion_failure_is_not_cached() {
        let store = Arc::new(MemoryContentStore::new(site()));
        let deep = "<div>".repeat(600);
        let broken = resource("deep", "Deep", &deep, 1);
        let broken_id = broken.id;
        store.insert_resource(broken);
        let service = service(store.clone(), Extensions::new());

        assert!(matches!(
            service.markdown_feed().await,
            Err(RenderError::Conversion(_))
        ));

        store.remove_resource(broken_id);
        let feed = service.markdown_feed().await.unwrap();
        assert!(feed.contains(NO_POSTS));
    }
}
