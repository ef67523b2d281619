//! Cache key derivation.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::application::feed::FeedConfiguration;

/// SHA-256 digest identifying one feed configuration.
///
/// Resource types are hashed in sorted order without duplicates, so two
/// configurations with equal fields always share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedFingerprint(String);

impl FeedFingerprint {
    pub fn of(config: &FeedConfiguration) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"resource_types=");
        for resource_type in &config.resource_types {
            hasher.update(resource_type.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(
            format!(
                ";max_posts={};include_comments={};include_excerpt={};cache_duration_ns={}",
                config.max_posts,
                config.include_comments,
                config.include_excerpt,
                config.cache_duration.as_nanos()
            )
            .as_bytes(),
        );
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage key of `key` inside `namespace`.
pub fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

/// Prefix shared by every key of `namespace`.
pub(crate) fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}:")
}
