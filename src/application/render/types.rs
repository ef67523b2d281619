use thiserror::Error;

use crate::application::repos::RepoError;

use super::converter::ConversionError;

/// Failure while producing a Markdown document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to convert HTML to Markdown: {0}")]
    Conversion(#[from] ConversionError),
    #[error("failed to load content: {0}")]
    Repo(#[from] RepoError),
}
