//! Plain-text views of HTML fragments.

use ego_tree::iter::Edge;
use scraper::{Html, node::Node};

use super::options::ConversionOptions;

/// Extract readable text from an HTML fragment, skipping removed elements.
///
/// Block boundaries and `<br>` become single spaces.
pub fn plain_text(html: &str, options: &ConversionOptions) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    let mut skipping = 0usize;

    for edge in fragment.root_element().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) if options.removes(element.name()) => skipping += 1,
                Node::Element(element) if skipping == 0 && is_break(element.name()) => {
                    text.push(' ');
                }
                Node::Text(value) if skipping == 0 => text.push_str(value),
                _ => {}
            },
            Edge::Close(node) => match node.value() {
                Node::Element(element) if options.removes(element.name()) => {
                    skipping = skipping.saturating_sub(1);
                }
                Node::Element(element) if skipping == 0 && is_break(element.name()) => {
                    text.push(' ');
                }
                _ => {}
            },
        }
    }

    collapse_whitespace(&text).trim().to_string()
}

/// Deepest element nesting in `html`, counting the implied root.
pub fn nesting_depth(html: &str) -> usize {
    let fragment = Html::parse_fragment(html);
    let mut depth = 0usize;
    let mut deepest = 0usize;

    for edge in fragment.root_element().traverse() {
        match edge {
            Edge::Open(node) if node.value().is_element() => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            Edge::Close(node) if node.value().is_element() => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    deepest
}

/// Escape text so it survives another pass through an HTML parser.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn is_break(name: &str) -> bool {
    matches!(
        name,
        "br" | "td"
            | "th"
            | "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "figcaption"
            | "figure"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "tr"
            | "ul"
    )
}

fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !collapsed.ends_with(' ') {
                collapsed.push(' ');
            }
        } else {
            collapsed.push(ch);
        }
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_skips_removed_nodes_and_separates_blocks() {
        let options = ConversionOptions::default();
        assert_eq!(
            plain_text("<p>Hello <b>world</b></p><script>x()</script><p>again</p>", &options),
            "Hello world again"
        );
        assert_eq!(plain_text("Title with <em>markup</em>", &options), "Title with markup");
    }

    #[test]
    fn plain_text_decodes_entities() {
        let options = ConversionOptions::default();
        assert_eq!(plain_text("<p>Fish &amp; chips &lt;3</p>", &options), "Fish & chips <3");
    }

    #[test]
    fn depth_counts_nested_elements() {
        let shallow = nesting_depth("<p>one</p><p>two</p>");
        let deep = nesting_depth(&format!("{}x{}", "<div>".repeat(40), "</div>".repeat(40)));
        assert!(deep >= shallow + 39, "{shallow} {deep}");
    }

    #[test]
    fn escaped_text_reparses_to_itself() {
        let text = "Write <b> & then </b>";
        let options = ConversionOptions::default();
        assert_eq!(escape_html(text), "Write &lt;b&gt; &amp; then &lt;/b&gt;");
        assert_eq!(plain_text(&escape_html(text), &options), text);
    }
}
