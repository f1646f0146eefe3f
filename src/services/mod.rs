//! Services layer - Business logic
//!
//! Services validate input, apply the visibility and ownership rules and
//! coordinate repositories. Handlers never talk to repositories directly.

pub mod access;
pub mod category;
pub mod comment;
pub mod location;
pub mod media;
pub mod password;
pub mod post;
pub mod user;

pub use access::{authorize_mutation, Authorization};
pub use category::{CategoryService, CategoryServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use location::{LocationService, LocationServiceError};
pub use media::{MediaError, MediaStore};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError, PublicationFilter};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
