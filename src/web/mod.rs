//! HTML handlers for the blog surface

mod posts;

pub use posts::posts_router;
