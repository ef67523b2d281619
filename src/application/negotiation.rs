//! Decides whether a request is owed Markdown and which document to build.

use std::collections::BTreeSet;

use crate::domain::entities::DEFAULT_RESOURCE_TYPE;

use super::extensions::Extensions;

pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown";
pub const MARKDOWN_FORMAT: &str = "markdown";

/// True when the `Accept` header mentions `text/markdown` or `format=markdown` was passed.
///
/// The header match is a plain substring test; quality values are not weighed.
pub fn is_markdown_requested(accept: Option<&str>, format: Option<&str>) -> bool {
    accept.is_some_and(|accept| accept.contains(MARKDOWN_MEDIA_TYPE))
        || format == Some(MARKDOWN_FORMAT)
}

/// What the router knows about the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteState {
    /// The route is a feed listing.
    pub is_feed: bool,
    /// The route addresses one resource.
    pub is_singular: bool,
    /// A per-resource feed was asked for.
    pub sub_feed_requested: bool,
    /// Type of the addressed resource, when singular.
    pub resource_type: Option<String>,
}

impl RouteState {
    pub fn feed() -> Self {
        Self {
            is_feed: true,
            ..Self::default()
        }
    }

    pub fn resource(resource_type: impl Into<String>) -> Self {
        Self {
            is_singular: true,
            resource_type: Some(resource_type.into()),
            ..Self::default()
        }
    }

    pub fn comment_feed(resource_type: impl Into<String>) -> Self {
        Self {
            is_feed: true,
            sub_feed_requested: true,
            ..Self::resource(resource_type)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Resource,
    CommentFeed,
    AggregateFeed,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Resource => "resource",
            OutputMode::CommentFeed => "comment_feed",
            OutputMode::AggregateFeed => "aggregate_feed",
        }
    }
}

/// Pick the Markdown document for a route, or `None` to fall through to the host.
pub fn select_mode(route: &RouteState, allowed_types: &BTreeSet<String>) -> Option<OutputMode> {
    if route.is_feed && !route.is_singular {
        return Some(OutputMode::AggregateFeed);
    }
    if route.is_singular && route.sub_feed_requested {
        return Some(OutputMode::CommentFeed);
    }
    if route.is_singular
        && route
            .resource_type
            .as_deref()
            .is_some_and(|resource_type| allowed_types.contains(resource_type))
    {
        return Some(OutputMode::Resource);
    }
    None
}

/// Combines preference detection with mode selection.
#[derive(Debug, Clone)]
pub struct Negotiator {
    allowed_types: Vec<String>,
    extensions: Extensions,
}

impl Negotiator {
    pub fn new(allowed_types: Vec<String>, extensions: Extensions) -> Self {
        Self {
            allowed_types,
            extensions,
        }
    }

    /// Resource types served as single Markdown documents, after extensions.
    pub fn allowed_types(&self) -> BTreeSet<String> {
        self.extensions
            .allowed_resource_types(self.allowed_types.clone())
            .into_iter()
            .map(|resource_type| resource_type.trim().to_string())
            .filter(|resource_type| !resource_type.is_empty())
            .collect()
    }

    pub fn resolve(
        &self,
        accept: Option<&str>,
        format: Option<&str>,
        route: &RouteState,
    ) -> Option<OutputMode> {
        if !is_markdown_requested(accept, format) {
            return None;
        }
        select_mode(route, &self.allowed_types())
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new(vec![DEFAULT_RESOURCE_TYPE.to_string()], Extensions::new())
    }
}
