//! Database models.

pub mod page;
pub mod post;
pub mod site;
pub mod template;
pub mod user;

pub use page::Page;
pub use post::Post;
pub use site::Site;
pub use template::Template;
pub use user::{Role, User};
