use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the postdown binary.
#[derive(Debug, Parser)]
#[command(
    name = "postdown",
    version,
    about = "Serve blog content as Markdown to clients that ask for it"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "POSTDOWN_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP surface.
    Serve(Box<ServeArgs>),
    /// Print the aggregate Markdown feed to stdout.
    Feed(FeedArgs),
    /// Print one resource as Markdown to stdout.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FeedArgs {
    #[command(flatten)]
    pub content: ContentOverride,

    /// Append approved comments to every feed entry.
    #[arg(long = "include-comments", action = clap::ArgAction::SetTrue)]
    pub include_comments: bool,

    /// Prefix every feed entry with its excerpt.
    #[arg(long = "include-excerpt", action = clap::ArgAction::SetTrue)]
    pub include_excerpt: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub content: ContentOverride,

    /// Slug of the published resource to render.
    #[arg(value_name = "SLUG")]
    pub slug: String,

    /// Append the approved comment thread.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub comments: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ContentOverride {
    /// Override the content archive path.
    #[arg(long = "content-archive", value_name = "PATH")]
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub content: ContentOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the public site URL used in absolute links.
    #[arg(long = "site-url", value_name = "URL")]
    pub site_url: Option<String>,

    /// Override the number of resources in the aggregate feed.
    #[arg(long = "feed-max-posts", value_name = "COUNT")]
    pub feed_max_posts: Option<u64>,

    /// Override the aggregate feed cache lifetime.
    #[arg(long = "feed-cache-seconds", value_name = "SECONDS")]
    pub feed_cache_seconds: Option<u64>,
}
