use std::path::Path;

use super::*;

#[test]
fn defaults_cover_every_section() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
    assert_eq!(settings.site.charset, "UTF-8");
    assert_eq!(settings.content.archive, Path::new("content/site.toml"));
    assert_eq!(settings.negotiation.allowed_types, vec!["post"]);
    assert_eq!(settings.feed.resource_types, vec!["post"]);
    assert_eq!(settings.feed.max_posts, 10);
    assert_eq!(settings.feed.cache_seconds, 3600);
    assert!(!settings.feed.include_comments);
    assert_eq!(settings.conversion, ConversionOptions::default());
    assert_eq!(settings.cache.namespace, "postdown_markdown_feed");
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.feed.max_posts = Some(3);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        feed_max_posts: Some(7),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.feed.max_posts, 7);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn feed_command_flags_enable_sections() {
    let mut raw = RawSettings::default();
    raw.apply_feed_overrides(&FeedArgs {
        content: ContentOverride {
            archive: Some(PathBuf::from("/tmp/blog.toml")),
        },
        include_comments: true,
        include_excerpt: false,
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.feed.include_comments);
    assert!(!settings.feed.include_excerpt);
    assert_eq!(settings.content.archive, Path::new("/tmp/blog.toml"));
}

#[test]
fn comma_separated_lists_are_split() {
    let mut raw = RawSettings::default();
    raw.feed.resource_types = Some(RawList::One("post, page ,".to_string()));
    raw.conversion.remove_nodes = Some(RawList::One("script,iframe".to_string()));

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.feed.resource_types, vec!["post", "page"]);
    assert_eq!(settings.conversion.remove_nodes, vec!["script", "iframe"]);
}

#[test]
fn setext_header_style_is_accepted() {
    let mut raw = RawSettings::default();
    raw.conversion.header_style = Some("Setext".to_string());
    raw.conversion.hard_break = Some(false);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.conversion.header_style, HeaderStyle::Setext);
    assert!(!settings.conversion.hard_break);
}

#[test]
fn zero_max_posts_is_rejected() {
    let mut raw = RawSettings::default();
    raw.feed.max_posts = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero should be rejected");
    assert!(matches!(err, LoadError::Invalid { key: "feed.max_posts", .. }));
}

#[test]
fn empty_allowed_types_are_rejected() {
    let mut raw = RawSettings::default();
    raw.negotiation.allowed_types = Some(RawList::Many(vec![" ".to_string()]));

    let err = Settings::from_raw(raw).expect_err("empty list should be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "negotiation.allowed_types",
            ..
        }
    ));
}

#[test]
fn site_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.site.url = Some("ftp://example.com/".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp should be rejected");
    assert!(matches!(err, LoadError::Invalid { key: "site.url", .. }));
}

#[test]
fn site_settings_feed_record() {
    let mut raw = RawSettings::default();
    raw.site.name = Some("Field Notes".to_string());
    raw.site.url = Some("https://notes.example.com".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let record = SiteSettingsRecord::from(&settings.site);
    assert_eq!(record.name, "Field Notes");
    assert_eq!(record.markdown_feed_url(), "https://notes.example.com/feed/markdown/");
}

#[test]
fn unknown_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}
