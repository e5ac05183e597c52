//! Post listing and creation handlers

use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::data::Post;
use crate::error::AppError;

/// Create post router
///
/// Routes:
/// - GET / - Post listing
/// - GET /create/ - Post creation form
/// - POST /create/ - Create a post, redirect to /
pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/create/", get(create_form).post(create_post))
}

/// GET /
///
/// Renders every post, most recent first. No pagination by design;
/// this instance is expected to stay small.
async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let posts = state.db.list_posts().await?;
    Ok(Html(render_posts(&posts)))
}

/// GET /create/
///
/// Renders an empty post form.
async fn create_form() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>New post</title></head>
<body>
    <h1>New post</h1>
    <form action="/create/" method="post">
        <p><input type="text" name="title" placeholder="Title" /></p>
        <p><textarea name="text" placeholder="Text"></textarea></p>
        <p><button type="submit">Publish</button></p>
    </form>
</body>
</html>"#,
    )
}

/// Form fields for post creation
///
/// Both fields are required; a submission missing either is rejected
/// by the `Form` extractor as a client error before this handler runs.
#[derive(Debug, Deserialize)]
struct CreatePostForm {
    title: String,
    text: String,
}

/// POST /create/
///
/// Persists the post and redirects to the listing so a refresh cannot
/// resubmit the form.
async fn create_post(
    State(state): State<AppState>,
    Form(form): Form<CreatePostForm>,
) -> Result<impl IntoResponse, AppError> {
    let id = state.db.create_post(&form.title, &form.text).await?;
    tracing::info!(post_id = id, "Post created");

    Ok(Redirect::to("/"))
}

/// Render the post listing page
///
/// Titles and bodies are HTML-escaped on the way out; the stored text
/// itself is never mutated.
fn render_posts(posts: &[Post]) -> String {
    let mut items = String::new();
    for post in posts {
        items.push_str(&format!(
            "    <article>\n        <h2>{}</h2>\n        <p>{}</p>\n    </article>\n",
            html_escape::encode_text(&post.title),
            html_escape::encode_text(&post.text),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Posts</title></head>
<body>
    <h1>Posts</h1>
    <p><a href="/create/">New post</a></p>
{items}</body>
</html>"#
    )
}
