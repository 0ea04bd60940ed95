//! Domain services shared across route handlers.

pub mod content;
pub mod overview;
pub mod slug;
