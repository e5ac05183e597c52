//! Data models
//!
//! Rust structs representing database entities.

use serde::{Deserialize, Serialize};

/// A blog post
///
/// The id is assigned by SQLite (AUTOINCREMENT) and never changes.
/// Posts are never updated or deleted by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
}
