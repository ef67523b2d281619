//! Conversion options for the HTML to Markdown converter.

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Heading syntax emitted for `h1`..`h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// `# Heading`
    #[default]
    Atx,
    /// Underlined `h1`/`h2`; deeper levels fall back to ATX.
    Setext,
}

impl HeaderStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            HeaderStyle::Atx => "atx",
            HeaderStyle::Setext => "setext",
        }
    }
}

impl fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "atx" => Ok(HeaderStyle::Atx),
            "setext" => Ok(HeaderStyle::Setext),
            other => Err(format!("unknown header style `{other}`")),
        }
    }
}

/// Rule set applied by [`super::HtmlToMarkdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub header_style: HeaderStyle,
    /// Drop tags that have no Markdown equivalent and keep their content.
    pub strip_tags: bool,
    /// Elements removed together with everything inside them.
    pub remove_nodes: Vec<String>,
    /// Emit `<br>` as a bare newline instead of two trailing spaces.
    pub hard_break: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            header_style: HeaderStyle::Atx,
            strip_tags: true,
            remove_nodes: vec!["script".to_string(), "style".to_string()],
            hard_break: true,
        }
    }
}

impl ConversionOptions {
    pub fn removes(&self, tag: &str) -> bool {
        self.remove_nodes
            .iter()
            .any(|name| name.eq_ignore_ascii_case(tag))
    }

    /// Parse a whitespace or comma separated element list such as `"script style"`.
    pub fn parse_node_list(raw: &str) -> Vec<String> {
        raw.split(|ch: char| ch.is_whitespace() || ch == ',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_ascii_lowercase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rule_set() {
        let options = ConversionOptions::default();
        assert_eq!(options.header_style, HeaderStyle::Atx);
        assert!(options.strip_tags);
        assert!(options.hard_break);
        assert!(options.removes("script"));
        assert!(options.removes("STYLE"));
        assert!(!options.removes("iframe"));
    }

    #[test]
    fn node_list_accepts_spaces_and_commas() {
        assert_eq!(
            ConversionOptions::parse_node_list(" script  style,iframe ,"),
            vec!["script", "style", "iframe"]
        );
    }

    #[test]
    fn header_style_parses_case_insensitively() {
        assert_eq!("ATX".parse::<HeaderStyle>(), Ok(HeaderStyle::Atx));
        assert_eq!("setext".parse::<HeaderStyle>(), Ok(HeaderStyle::Setext));
        assert!("underline".parse::<HeaderStyle>().is_err());
    }
}
