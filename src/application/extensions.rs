//! Named extension points that let an embedding application adjust behaviour.
//!
//! Each point is an optional filter: it receives the value postdown would use
//! and returns the value to use instead. Unset points leave the value alone.

use std::{fmt, sync::Arc, time::Duration};

use super::feed::FeedConfiguration;
use super::render::ConversionOptions;

type Filter<T> = Arc<dyn Fn(T) -> T + Send + Sync>;
type OutputFilter = Arc<dyn Fn(String, &str) -> String + Send + Sync>;
type FeedFilter = Arc<dyn Fn(String, &FeedConfiguration) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub struct Extensions {
    allowed_resource_types: Option<Filter<Vec<String>>>,
    converter_options: Option<Filter<ConversionOptions>>,
    markdown_output: Option<OutputFilter>,
    feed_resource_types: Option<Filter<Vec<String>>>,
    feed_post_count: Option<Filter<usize>>,
    feed_include_comments: Option<Filter<bool>>,
    feed_include_excerpt: Option<Filter<bool>>,
    feed_cache_duration: Option<Filter<Duration>>,
    markdown_feed: Option<FeedFilter>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed_resource_types(
        mut self,
        filter: impl Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.allowed_resource_types = Some(Arc::new(filter));
        self
    }

    pub fn with_converter_options(
        mut self,
        filter: impl Fn(ConversionOptions) -> ConversionOptions + Send + Sync + 'static,
    ) -> Self {
        self.converter_options = Some(Arc::new(filter));
        self
    }

    /// Post-process each converted body; receives the Markdown and the source HTML.
    pub fn with_markdown_output(
        mut self,
        filter: impl Fn(String, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.markdown_output = Some(Arc::new(filter));
        self
    }

    pub fn with_feed_resource_types(
        mut self,
        filter: impl Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.feed_resource_types = Some(Arc::new(filter));
        self
    }

    pub fn with_feed_post_count(
        mut self,
        filter: impl Fn(usize) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.feed_post_count = Some(Arc::new(filter));
        self
    }

    pub fn with_feed_include_comments(
        mut self,
        filter: impl Fn(bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.feed_include_comments = Some(Arc::new(filter));
        self
    }

    pub fn with_feed_include_excerpt(
        mut self,
        filter: impl Fn(bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.feed_include_excerpt = Some(Arc::new(filter));
        self
    }

    pub fn with_feed_cache_duration(
        mut self,
        filter: impl Fn(Duration) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.feed_cache_duration = Some(Arc::new(filter));
        self
    }

    /// Replace the assembled feed text before it is cached.
    pub fn with_markdown_feed(
        mut self,
        filter: impl Fn(String, &FeedConfiguration) -> String + Send + Sync + 'static,
    ) -> Self {
        self.markdown_feed = Some(Arc::new(filter));
        self
    }

    pub fn allowed_resource_types(&self, value: Vec<String>) -> Vec<String> {
        apply(&self.allowed_resource_types, value)
    }

    pub fn converter_options(&self, value: ConversionOptions) -> ConversionOptions {
        apply(&self.converter_options, value)
    }

    pub fn markdown_output(&self, markdown: String, original_html: &str) -> String {
        match &self.markdown_output {
            Some(filter) => filter(markdown, original_html),
            None => markdown,
        }
    }

    pub fn feed_resource_types(&self, value: Vec<String>) -> Vec<String> {
        apply(&self.feed_resource_types, value)
    }

    pub fn feed_post_count(&self, value: usize) -> usize {
        apply(&self.feed_post_count, value)
    }

    pub fn feed_include_comments(&self, value: bool) -> bool {
        apply(&self.feed_include_comments, value)
    }

    pub fn feed_include_excerpt(&self, value: bool) -> bool {
        apply(&self.feed_include_excerpt, value)
    }

    pub fn feed_cache_duration(&self, value: Duration) -> Duration {
        apply(&self.feed_cache_duration, value)
    }

    pub fn markdown_feed(&self, markdown: String, config: &FeedConfiguration) -> String {
        match &self.markdown_feed {
            Some(filter) => filter(markdown, config),
            None => markdown,
        }
    }
}

fn apply<T>(filter: &Option<Filter<T>>, value: T) -> T {
    match filter {
        Some(filter) => filter(value),
        None => value,
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("allowed_resource_types", &self.allowed_resource_types.is_some())
            .field("converter_options", &self.converter_options.is_some())
            .field("markdown_output", &self.markdown_output.is_some())
            .field("feed_resource_types", &self.feed_resource_types.is_some())
            .field("feed_post_count", &self.feed_post_count.is_some())
            .field("feed_include_comments", &self.feed_include_comments.is_some())
            .field("feed_include_excerpt", &self.feed_include_excerpt.is_some())
            .field("feed_cache_duration", &self.feed_cache_duration.is_some())
            .field("markdown_feed", &self.markdown_feed.is_some())
            .finish()
    }
}
