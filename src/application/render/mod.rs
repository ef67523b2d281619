//! HTML to Markdown rendering.
//!
//! [`HtmlToMarkdown`] wraps the `htmd` converter. [`ContentConverter`] wraps it
//! with input normalisation, newline collapsing and the conversion extension
//! points; every stored HTML body goes through it. The `document` helpers lay
//! out headings, metadata and comments for the resource renderer and the feed.

mod content;
mod converter;
pub mod document;
mod options;
mod text;
mod types;

pub use content::{ContentConverter, collapse_blank_lines};
pub use converter::{ConversionError, HtmlToMarkdown, MAX_NESTING_DEPTH};
pub use options::{ConversionOptions, HeaderStyle};
pub use text::plain_text;
pub use types::RenderError;
