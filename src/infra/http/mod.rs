//! HTTP surface: negotiated Markdown, RSS and minimal HTML routes.

mod middleware;
mod public;

pub use public::{HttpState, build_router};
