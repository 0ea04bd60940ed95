//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod health;
pub mod helpers;
pub mod page;
pub mod post;
pub mod site;
pub mod template;
