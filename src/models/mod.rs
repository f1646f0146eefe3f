//! Data models
//!
//! Plain data structures shared by the repositories, services and handlers.

mod category;
mod comment;
mod location;
mod pagination;
mod post;
mod session;
mod user;

pub use category::{Category, CategoryInput, CATEGORY_TITLE_MAX_LEN};
pub use comment::{Comment, CommentWithMeta};
pub use location::{Location, LocationInput, LOCATION_NAME_MAX_LEN};
pub use pagination::{ListParams, PagedResult};
pub use post::{
    Post, PostCategory, PostFilter, PostInput, PostLocation, PostScope, PostWithMeta,
    POSTS_PER_PAGE, POST_TITLE_MAX_LEN,
};
pub use session::Session;
pub use user::{UpdateProfileInput, User};
