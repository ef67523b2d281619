//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::render::{ConversionOptions, HeaderStyle};
use crate::domain::entities::{DEFAULT_RESOURCE_TYPE, SiteSettingsRecord};

mod cli;

pub use cli::{CliArgs, Command, ContentOverride, FeedArgs, RenderArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "postdown";
const ENV_PREFIX: &str = "POSTDOWN";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SITE_NAME: &str = "postdown";
const DEFAULT_CHARSET: &str = "UTF-8";
const DEFAULT_ARCHIVE_PATH: &str = "content/site.toml";
const DEFAULT_FEED_MAX_POSTS: u64 = 10;
const DEFAULT_FEED_CACHE_SECS: u64 = 3600;
const DEFAULT_CACHE_NAMESPACE: &str = "postdown_markdown_feed";
const DEFAULT_CACHE_CAPACITY: u64 = 64;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub negotiation: NegotiationSettings,
    pub feed: FeedDefaultSettings,
    pub conversion: ConversionOptions,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Site identity used until the content archive overrides it.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub description: String,
    pub url: Url,
    pub charset: String,
}

impl From<&SiteSettings> for SiteSettingsRecord {
    fn from(site: &SiteSettings) -> Self {
        Self {
            name: site.name.clone(),
            description: site.description.clone(),
            public_site_url: site.url.to_string(),
            charset: site.charset.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub archive: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NegotiationSettings {
    pub allowed_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FeedDefaultSettings {
    pub resource_types: Vec<String>,
    pub max_posts: usize,
    pub include_comments: bool,
    pub include_excerpt: bool,
    pub cache_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub namespace: String,
    pub capacity: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Feed(args)) => raw.apply_feed_overrides(args),
        Some(Command::Render(args)) => raw.apply_content_override(&args.content),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    content: RawContentSettings,
    negotiation: RawNegotiationSettings,
    feed: RawFeedSettings,
    conversion: RawConversionSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.url = Some(url.clone());
        }
        if let Some(max) = overrides.feed_max_posts {
            self.feed.max_posts = Some(max);
        }
        if let Some(seconds) = overrides.feed_cache_seconds {
            self.feed.cache_seconds = Some(seconds);
        }

        self.apply_content_override(&overrides.content);
    }

    fn apply_feed_overrides(&mut self, args: &FeedArgs) {
        if args.include_comments {
            self.feed.include_comments = Some(true);
        }
        if args.include_excerpt {
            self.feed.include_excerpt = Some(true);
        }

        self.apply_content_override(&args.content);
    }

    fn apply_content_override(&mut self, overrides: &ContentOverride) {
        if let Some(path) = overrides.archive.as_ref() {
            self.content.archive = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            content,
            negotiation,
            feed,
            conversion,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            site: build_site_settings(site)?,
            content: build_content_settings(content)?,
            negotiation: build_negotiation_settings(negotiation)?,
            feed: build_feed_settings(feed)?,
            conversion: build_conversion_options(conversion)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let defaults = SiteSettingsRecord::default();

    let raw_url = site.url.unwrap_or(defaults.public_site_url);
    let url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("site.url", format!("invalid url `{raw_url}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "site.url",
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }

    let charset = site
        .charset
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string());
    if charset.is_empty() {
        return Err(LoadError::invalid("site.charset", "must not be empty"));
    }

    Ok(SiteSettings {
        name: site.name.unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        description: site.description.unwrap_or_default(),
        url,
        charset,
    })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let archive = content
        .archive
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_PATH));
    if archive.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "content.archive",
            "path must not be empty",
        ));
    }

    Ok(ContentSettings { archive })
}

fn build_negotiation_settings(
    negotiation: RawNegotiationSettings,
) -> Result<NegotiationSettings, LoadError> {
    let allowed_types = match negotiation.allowed_types {
        Some(list) => non_empty_list(list.into_vec(), "negotiation.allowed_types")?,
        None => vec![DEFAULT_RESOURCE_TYPE.to_string()],
    };

    Ok(NegotiationSettings { allowed_types })
}

fn build_feed_settings(feed: RawFeedSettings) -> Result<FeedDefaultSettings, LoadError> {
    let resource_types = match feed.resource_types {
        Some(list) => non_empty_list(list.into_vec(), "feed.resource_types")?,
        None => vec![DEFAULT_RESOURCE_TYPE.to_string()],
    };

    let max_posts = non_zero_usize(
        feed.max_posts.unwrap_or(DEFAULT_FEED_MAX_POSTS),
        "feed.max_posts",
    )?;

    Ok(FeedDefaultSettings {
        resource_types,
        max_posts,
        include_comments: feed.include_comments.unwrap_or(false),
        include_excerpt: feed.include_excerpt.unwrap_or(false),
        cache_seconds: feed.cache_seconds.unwrap_or(DEFAULT_FEED_CACHE_SECS),
    })
}

fn build_conversion_options(
    conversion: RawConversionSettings,
) -> Result<ConversionOptions, LoadError> {
    let defaults = ConversionOptions::default();

    let header_style = match conversion.header_style {
        Some(style) => HeaderStyle::from_str(&style)
            .map_err(|reason| LoadError::invalid("conversion.header_style", reason))?,
        None => defaults.header_style,
    };

    let remove_nodes = match conversion.remove_nodes {
        Some(list) => list
            .into_vec()
            .iter()
            .flat_map(|entry| ConversionOptions::parse_node_list(entry))
            .collect(),
        None => defaults.remove_nodes,
    };

    Ok(ConversionOptions {
        header_style,
        strip_tags: conversion.strip_tags.unwrap_or(defaults.strip_tags),
        remove_nodes,
        hard_break: conversion.hard_break.unwrap_or(defaults.hard_break),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let namespace = cache
        .namespace
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CACHE_NAMESPACE.to_string());
    if namespace.is_empty() {
        return Err(LoadError::invalid("cache.namespace", "must not be empty"));
    }

    let capacity = non_zero_usize(
        cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        "cache.capacity",
    )?;

    Ok(CacheSettings {
        namespace,
        capacity,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    charset: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    archive: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNegotiationSettings {
    allowed_types: Option<RawList>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    resource_types: Option<RawList>,
    max_posts: Option<u64>,
    include_comments: Option<bool>,
    include_excerpt: Option<bool>,
    cache_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawConversionSettings {
    header_style: Option<String>,
    strip_tags: Option<bool>,
    remove_nodes: Option<RawList>,
    hard_break: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    namespace: Option<String>,
    capacity: Option<u64>,
}

/// A list given either as an array or as one comma-separated string (env vars).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawList {
    Many(Vec<String>),
    One(String),
}

impl RawList {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawList::Many(items) => items,
            RawList::One(joined) => joined.split(',').map(str::to_string).collect(),
        }
    }
}

fn non_empty_list(items: Vec<String>, key: &'static str) -> Result<Vec<String>, LoadError> {
    let items: Vec<String> = items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return Err(LoadError::invalid(key, "must name at least one resource type"));
    }
    Ok(items)
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<usize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    usize::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))
}

#[cfg(test)]
mod tests;
