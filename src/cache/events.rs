//! Content mutations that may affect cached feeds.

use uuid::Uuid;

use crate::application::feed::FeedConfiguration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    /// A resource was created or updated. `previous_type` is set on updates.
    ResourceSaved {
        resource_id: Uuid,
        resource_type: String,
        previous_type: Option<String>,
    },
    ResourceDeleted {
        resource_id: Uuid,
        resource_type: String,
    },
    CommentPosted {
        comment_id: Uuid,
        resource_id: Uuid,
    },
    CommentEdited {
        comment_id: Uuid,
        resource_id: Uuid,
    },
    CommentDeleted {
        comment_id: Uuid,
        resource_id: Uuid,
    },
    /// Moderation moved a comment between pending, approved, spam or trash.
    CommentStatusChanged {
        comment_id: Uuid,
        resource_id: Uuid,
    },
    /// Only the categories or tags of a resource changed.
    ResourceTermsChanged { resource_id: Uuid },
}

impl MutationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MutationEvent::ResourceSaved { .. } => "resource_saved",
            MutationEvent::ResourceDeleted { .. } => "resource_deleted",
            MutationEvent::CommentPosted { .. } => "comment_posted",
            MutationEvent::CommentEdited { .. } => "comment_edited",
            MutationEvent::CommentDeleted { .. } => "comment_deleted",
            MutationEvent::CommentStatusChanged { .. } => "comment_status_changed",
            MutationEvent::ResourceTermsChanged { .. } => "resource_terms_changed",
        }
    }

    /// Whether a feed built from `config` can show what this event changed.
    ///
    /// Term-only edits never qualify even though the feed prints terms.
    pub fn affects_feed(&self, config: &FeedConfiguration) -> bool {
        match self {
            MutationEvent::ResourceSaved {
                resource_type,
                previous_type,
                ..
            } => {
                config.resource_types.contains(resource_type)
                    || previous_type
                        .as_ref()
                        .is_some_and(|old| config.resource_types.contains(old))
            }
            MutationEvent::ResourceDeleted { resource_type, .. } => {
                config.resource_types.contains(resource_type)
            }
            MutationEvent::CommentPosted { .. }
            | MutationEvent::CommentEdited { .. }
            | MutationEvent::CommentDeleted { .. }
            | MutationEvent::CommentStatusChanged { .. } => config.include_comments,
            MutationEvent::ResourceTermsChanged { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(resource_type: &str) -> MutationEvent {
        MutationEvent::ResourceSaved {
            resource_id: Uuid::nil(),
            resource_type: resource_type.to_string(),
            previous_type: None,
        }
    }

    fn comment() -> MutationEvent {
        MutationEvent::CommentPosted {
            comment_id: Uuid::nil(),
            resource_id: Uuid::nil(),
        }
    }

    #[test]
    fn resource_events_follow_feed_types() {
        let config = FeedConfiguration::default();
        assert!(saved("post").affects_feed(&config));
        assert!(!saved("page").affects_feed(&config));
    }

    #[test]
    fn retyped_resources_count_for_either_type() {
        let config = FeedConfiguration::default();
        let moved_out = MutationEvent::ResourceSaved {
            resource_id: Uuid::nil(),
            resource_type: "page".to_string(),
            previous_type: Some("post".to_string()),
        };
        let stayed_out = MutationEvent::ResourceSaved {
            resource_id: Uuid::nil(),
            resource_type: "page".to_string(),
            previous_type: Some("attachment".to_string()),
        };
        assert!(moved_out.affects_feed(&config));
        assert!(!stayed_out.affects_feed(&config));
    }

    #[test]
    fn comment_events_require_comments_in_feed() {
        let mut config = FeedConfiguration::default();
        assert!(!comment().affects_feed(&config));
        config.include_comments = true;
        assert!(comment().affects_feed(&config));
    }

    #[test]
    fn term_changes_never_affect_feed() {
        let config = FeedConfiguration {
            include_comments: true,
            ..Default::default()
        };
        let event = MutationEvent::ResourceTermsChanged {
            resource_id: Uuid::nil(),
        };
        assert!(!event.affects_feed(&config));
    }
}
