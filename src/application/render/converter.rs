//! HTML to Markdown conversion backed by `htmd`.
//!
//! [`ConversionOptions`] map onto the converter as follows:
//!
//! - `header_style` selects ATX (`#`) or setext headings
//! - `remove_nodes` become skipped tags, dropped together with their content
//! - `strip_tags` keeps only the content of elements without a Markdown form;
//!   when unset those elements are emitted as HTML
//! - `hard_break` turns `<br>` into a bare newline instead of two trailing spaces

use htmd::options::{BrStyle, CodeBlockStyle, HeadingStyle, Options, TranslationMode};
use thiserror::Error;

use super::options::{ConversionOptions, HeaderStyle};
use super::text::nesting_depth;

/// Deepest element nesting accepted; the `htmd` walk recurses per element.
pub const MAX_NESTING_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("markup nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("html to markdown conversion failed: {message}")]
    Converter { message: String },
}

/// Converts HTML fragments to Markdown under a fixed [`ConversionOptions`].
pub struct HtmlToMarkdown {
    options: ConversionOptions,
    inner: htmd::HtmlToMarkdown,
}

impl HtmlToMarkdown {
    pub fn new(options: ConversionOptions) -> Self {
        let skipped: Vec<&str> = options.remove_nodes.iter().map(String::as_str).collect();
        let inner = htmd::HtmlToMarkdown::builder()
            .skip_tags(skipped)
            .options(Options {
                heading_style: match options.header_style {
                    HeaderStyle::Atx => HeadingStyle::Atx,
                    HeaderStyle::Setext => HeadingStyle::Setex,
                },
                br_style: BrStyle::TwoSpaces,
                code_block_style: CodeBlockStyle::Fenced,
                translation_mode: if options.strip_tags {
                    TranslationMode::Pure
                } else {
                    TranslationMode::Faithful
                },
                ..Options::default()
            })
            .build();
        Self { options, inner }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn convert(&self, html: &str) -> Result<String, ConversionError> {
        if nesting_depth(html) > MAX_NESTING_DEPTH {
            return Err(ConversionError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }

        let markdown = self
            .inner
            .convert(html)
            .map_err(|err| ConversionError::Converter {
                message: err.to_string(),
            })?;

        if self.options.hard_break {
            Ok(markdown.replace("  \n", "\n"))
        } else {
            Ok(markdown)
        }
    }
}

impl Default for HtmlToMarkdown {
    fn default() -> Self {
        Self::new(ConversionOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        HtmlToMarkdown::default()
            .convert(html)
            .expect("conversion should succeed")
    }

    fn convert_with(options: ConversionOptions, html: &str) -> String {
        HtmlToMarkdown::new(options)
            .convert(html)
            .expect("conversion should succeed")
    }

    #[test]
    fn headings_use_atx_markers() {
        let output = convert("<h1>Title</h1><h3>Deeper</h3>");
        assert!(output.starts_with("# Title"), "{output:?}");
        assert!(output.contains("### Deeper"), "{output:?}");
    }

    #[test]
    fn setext_style_underlines_top_level_headings() {
        let options = ConversionOptions {
            header_style: HeaderStyle::Setext,
            ..Default::default()
        };
        let output = convert_with(options, "<h1>Title</h1>");
        assert!(output.starts_with("Title\n="), "{output:?}");
        assert!(!output.contains("# Title"));
    }

    #[test]
    fn line_breaks_follow_hard_break_option() {
        assert_eq!(convert("<p>one<br>two</p>"), "one\ntwo");

        let soft = ConversionOptions {
            hard_break: false,
            ..Default::default()
        };
        assert_eq!(convert_with(soft, "<p>one<br>two</p>"), "one  \ntwo");
    }

    #[test]
    fn script_and_style_are_removed_with_content() {
        let output = convert(
            "<p>Visible</p><script>alert('x')</script><style>p { color: red; }</style><p>Also</p>",
        );
        assert!(output.contains("Visible"));
        assert!(output.contains("Also"));
        assert!(!output.contains("alert"));
        assert!(!output.contains("color"));
    }

    #[test]
    fn custom_remove_nodes_are_honoured() {
        let options = ConversionOptions {
            remove_nodes: vec!["aside".to_string()],
            ..Default::default()
        };
        let output = convert_with(options, "<p>Body</p><aside>Sidebar</aside>");
        assert!(output.contains("Body"));
        assert!(!output.contains("Sidebar"));
    }

    #[test]
    fn strong_and_links_render_as_markdown() {
        let output = convert(r#"<p>Some <strong>bold</strong> and <a href="https://example.com">a link</a>.</p>"#);
        assert!(output.contains("**bold**"), "{output:?}");
        assert!(output.contains("[a link](https://example.com)"), "{output:?}");
    }

    #[test]
    fn block_syntax_in_text_is_escaped() {
        let output = convert("<p># Not a heading</p><p>1. not a list</p>");
        assert!(output.contains("Not a heading"), "{output:?}");
        for line in output.lines() {
            assert!(!line.starts_with("# "), "{output:?}");
            assert!(!line.starts_with("1. "), "{output:?}");
        }
    }

    #[test]
    fn preformatted_code_is_fenced() {
        let html = "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>";
        let output = convert(html);
        assert!(output.starts_with("```"), "{output:?}");
        assert!(output.contains("fn main() {}"));
    }

    #[test]
    fn strip_tags_keeps_content_of_unknown_elements() {
        assert_eq!(convert("<div><p>In <span class=\"x\">span</span></p></div>"), "In span");
    }

    #[test]
    fn disabling_strip_tags_preserves_unknown_tags() {
        let options = ConversionOptions {
            strip_tags: false,
            ..Default::default()
        };
        let output = convert_with(options, "<p>In <span>span</span></p>");
        assert!(output.contains("<span>"), "{output:?}");
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let depth = MAX_NESTING_DEPTH + 10;
        let html = format!("{}deep{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let result = HtmlToMarkdown::default().convert(&html);
        assert_eq!(
            result,
            Err(ConversionError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH
            })
        );
    }
}
