//! Content conversion entry point shared by every Markdown surface.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::application::extensions::Extensions;

use super::converter::{ConversionError, HtmlToMarkdown};
use super::options::ConversionOptions;

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank-line pattern is valid"));

/// Converts stored HTML bodies to Markdown under the configured rule set.
#[derive(Debug, Clone)]
pub struct ContentConverter {
    options: ConversionOptions,
    extensions: Extensions,
}

impl ContentConverter {
    pub fn new(options: ConversionOptions, extensions: Extensions) -> Self {
        Self {
            options,
            extensions,
        }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn convert(&self, html: &str) -> Result<String, ConversionError> {
        self.convert_with(html, &self.options)
    }

    /// Convert with explicit options; the `converter_options` extension still applies.
    pub fn convert_with(
        &self,
        html: &str,
        options: &ConversionOptions,
    ) -> Result<String, ConversionError> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }

        let options = self.extensions.converter_options(options.clone());
        let markdown = HtmlToMarkdown::new(options).convert(html)?;
        let markdown = collapse_blank_lines(&markdown);

        debug!(
            target = "postdown::render::content",
            html_len = html.len(),
            markdown_len = markdown.len(),
            "Converted HTML body"
        );

        Ok(self.extensions.markdown_output(markdown, html))
    }
}

/// Collapse every run of three or more newlines to exactly two.
pub fn collapse_blank_lines(markdown: &str) -> String {
    BLANK_LINE_RUNS.replace_all(markdown, "\n\n").into_owned()
}
