//! Building blocks shared by the single-resource renderer and the feed.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::domain::entities::{CommentRecord, ResourceRecord, SiteSettingsRecord};

use super::content::ContentConverter;
use super::converter::ConversionError;
use super::text::{escape_html, plain_text};

/// Words kept when an excerpt is derived from the body.
pub const EXCERPT_WORDS: usize = 55;
pub const EXCERPT_MORE: &str = " […]";
pub const NO_COMMENTS: &str = "No comments yet.";
pub const SEPARATOR: &str = "---";

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// `# title` with any inline markup in the title reduced to text.
pub fn title_heading(resource: &ResourceRecord, converter: &ContentConverter) -> String {
    format!("# {}", plain_text(&resource.title, converter.options()))
}

/// Bold metadata lines following a resource heading.
pub fn metadata_lines(resource: &ResourceRecord, site: &SiteSettingsRecord) -> Vec<String> {
    let mut lines = vec![
        format!("**Author:** {}", resource.author),
        format!("**Published:** {}", format_timestamp(resource.published_at)),
        format!("**URL:** {}", site.resource_url(&resource.slug)),
    ];
    if !resource.categories.is_empty() {
        lines.push(format!("**Categories:** {}", resource.categories.join(", ")));
    }
    if !resource.tags.is_empty() {
        lines.push(format!("**Tags:** {}", resource.tags.join(", ")));
    }
    lines
}

/// Heading followed by the metadata block, ending in a blank line.
pub fn resource_header(
    resource: &ResourceRecord,
    site: &SiteSettingsRecord,
    converter: &ContentConverter,
) -> String {
    let mut out = title_heading(resource, converter);
    out.push_str("\n\n");
    out.push_str(&metadata_lines(resource, site).join("\n"));
    out.push_str("\n\n");
    out
}

/// Heading, metadata block and converted body of one resource.
pub fn resource_document(
    resource: &ResourceRecord,
    site: &SiteSettingsRecord,
    converter: &ContentConverter,
) -> Result<String, ConversionError> {
    let mut out = resource_header(resource, site, converter);
    let body = converter.convert(&resource.body_html)?;
    if !body.is_empty() {
        out.push_str(&body);
        out.push_str("\n\n");
    }
    Ok(out)
}

/// Bold author and timestamp line followed by the converted comment body.
pub fn comment_entry(
    comment: &CommentRecord,
    converter: &ContentConverter,
) -> Result<String, ConversionError> {
    let mut out = format!(
        "**{}** — {}",
        comment.author,
        format_timestamp(comment.created_at)
    );
    let body = converter.convert(&comment.body_html)?;
    if !body.is_empty() {
        out.push_str("\n\n");
        out.push_str(&body);
    }
    Ok(out)
}

/// Converted explicit excerpt when present, else the first words of the body.
///
/// A derived excerpt is body text, so it is escaped before conversion and the
/// truncation marker is appended afterwards.
pub fn excerpt_markdown(
    resource: &ResourceRecord,
    converter: &ContentConverter,
) -> Result<String, ConversionError> {
    if let Some(explicit) = resource.excerpt_html.as_deref().map(str::trim)
        && !explicit.is_empty()
    {
        return converter.convert(explicit);
    }

    let text = plain_text(&resource.body_html, converter.options());
    let (words, truncated) = leading_words(&text, EXCERPT_WORDS);
    let mut excerpt = converter.convert(&escape_html(&words))?;
    if truncated && !excerpt.is_empty() {
        excerpt.push_str(EXCERPT_MORE);
    }
    Ok(excerpt)
}

/// Excerpt as HTML: the explicit excerpt, else escaped leading body words.
pub fn excerpt_html(resource: &ResourceRecord, converter: &ContentConverter) -> String {
    if let Some(explicit) = resource.excerpt_html.as_deref().map(str::trim)
        && !explicit.is_empty()
    {
        return explicit.to_string();
    }

    let text = plain_text(&resource.body_html, converter.options());
    let (words, truncated) = leading_words(&text, EXCERPT_WORDS);
    let mut excerpt = escape_html(&words);
    if truncated {
        excerpt.push_str(EXCERPT_MORE);
    }
    excerpt
}

/// The first `count` whitespace separated words and whether any were dropped.
pub fn leading_words(text: &str, count: usize) -> (String, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let truncated = words.len() > count;
    (words.into_iter().take(count).collect::<Vec<_>>().join(" "), truncated)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::application::Extensions;
    use crate::application::render::ConversionOptions;
    use crate::domain::types::{CommentStatus, ResourceStatus};

    fn converter() -> ContentConverter {
        ContentConverter::new(ConversionOptions::default(), Extensions::new())
    }

    fn resource() -> ResourceRecord {
        ResourceRecord {
            id: Uuid::nil(),
            slug: "hello-world".to_string(),
            title: "Hello <em>world</em>".to_string(),
            body_html: "<p>Body text.</p>".to_string(),
            excerpt_html: None,
            author: "admin".to_string(),
            published_at: datetime!(2024-05-01 12:00 UTC),
            resource_type: "post".to_string(),
            status: ResourceStatus::Published,
            categories: vec!["Uncategorized".to_string()],
            tags: Vec::new(),
        }
    }

    #[test]
    fn document_has_heading_metadata_and_body() {
        let site = SiteSettingsRecord {
            public_site_url: "https://example.com/".to_string(),
            ..Default::default()
        };
        let doc = resource_document(&resource(), &site, &converter()).unwrap();
        assert_eq!(
            doc,
            "# Hello world\n\n\
             **Author:** admin\n\
             **Published:** 2024-05-01T12:00:00Z\n\
             **URL:** https://example.com/hello-world/\n\
             **Categories:** Uncategorized\n\n\
             Body text.\n\n"
        );
    }

    #[test]
    fn comment_entry_shows_author_and_time() {
        let comment = CommentRecord {
            id: Uuid::nil(),
            resource_id: Uuid::nil(),
            author: "Ana".to_string(),
            body_html: "<p>Nice <b>post</b></p>".to_string(),
            created_at: datetime!(2024-05-02 08:30 UTC),
            status: CommentStatus::Approved,
        };
        assert_eq!(
            comment_entry(&comment, &converter()).unwrap(),
            "**Ana** — 2024-05-02T08:30:00Z\n\nNice **post**"
        );
    }

    #[test]
    fn leading_words_reports_truncation() {
        assert_eq!(leading_words("one two  three", 5), ("one two three".to_string(), false));
        assert_eq!(leading_words("one two three", 2), ("one two".to_string(), true));
    }

    #[test]
    fn excerpt_prefers_explicit_value() {
        let mut record = resource();
        assert_eq!(excerpt_markdown(&record, &converter()).unwrap(), "Body text.");
        record.excerpt_html = Some("<p>Teaser <strong>now</strong></p>".to_string());
        assert_eq!(
            excerpt_markdown(&record, &converter()).unwrap(),
            "Teaser **now**"
        );
    }

    #[test]
    fn excerpt_html_escapes_derived_text() {
        let mut record = resource();
        record.body_html = "<p>a &lt;b&gt; c</p>".to_string();
        assert_eq!(excerpt_html(&record, &converter()), "a &lt;b&gt; c");
    }

    #[test]
    fn derived_excerpt_keeps_escaped_markup_literal() {
        let mut record = resource();
        record.body_html =
            "<p>Write &lt;b&gt; then text. Also &lt;script&gt;x&lt;/script&gt; done.</p>".to_string();
        let excerpt = excerpt_markdown(&record, &converter()).unwrap();
        assert!(!excerpt.contains("**"), "{excerpt:?}");
        assert!(excerpt.contains("then text"), "{excerpt:?}");
        assert!(excerpt.contains('x'), "{excerpt:?}");
        assert!(excerpt.ends_with("done."), "{excerpt:?}");
    }
}
