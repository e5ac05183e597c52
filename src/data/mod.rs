//! Data layer
//!
//! SQLite persistence for posts.

mod database;
mod models;

pub use database::Database;
pub use models::Post;
