//! Slug validation for resources addressed by URL path.

use super::error::DomainError;

const MAX_SLUG_LEN: usize = 200;

/// Path segments that are routed to feeds rather than resources.
const RESERVED: &[&str] = &["feed"];

/// Check that a slug is a single lowercase URL path segment.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    if slug.is_empty() {
        return Err(DomainError::validation("slug must not be empty"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(DomainError::validation(format!(
            "slug exceeds {MAX_SLUG_LEN} bytes"
        )));
    }
    if RESERVED.contains(&slug) {
        return Err(DomainError::validation(format!("slug `{slug}` is reserved")));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(DomainError::validation(format!(
            "slug `{slug}` must not start or end with `-`"
        )));
    }
    if let Some(bad) = slug
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '-'))
    {
        return Err(DomainError::validation(format!(
            "slug `{slug}` contains `{bad}`; only a-z, 0-9 and `-` are allowed"
        )));
    }
    Ok(())
}
