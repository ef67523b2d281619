//! Application services layer.

pub mod archive;
pub mod content;
pub mod error;
pub mod extensions;
pub mod feed;
pub mod negotiation;
pub mod render;
pub mod repos;
pub mod resource;
pub mod syndication;

pub use extensions::Extensions;
