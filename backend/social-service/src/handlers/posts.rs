use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::context::CurrentUser;
use crate::app_state::AppState;
use crate::error::Result;
use crate::services::{CommentDraft, PostDraft, PostEdit};

/// GET /all-posts
pub async fn feed(state: web::Data<AppState>, viewer: Option<CurrentUser>) -> Result<HttpResponse> {
    let posts = state.engagement.feed(viewer.map(|v| v.id())).await?;
    Ok(HttpResponse::Ok().json(json!({ "posts": posts })))
}

/// POST /post
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    draft: web::Json<PostDraft>,
) -> Result<HttpResponse> {
    let post = state
        .engagement
        .create_post(user.id(), draft.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "post": post })))
}

/// POST /post/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state
        .engagement
        .toggle_like(path.into_inner(), user.id())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /post/{id}/comment
pub async fn add_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    draft: web::Json<CommentDraft>,
) -> Result<HttpResponse> {
    let comment = state
        .engagement
        .add_comment(path.into_inner(), user.id(), draft.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "comment": comment })))
}

/// POST /post/{id}/edit
pub async fn edit_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    edit: web::Json<PostEdit>,
) -> Result<HttpResponse> {
    let post = state
        .engagement
        .edit_post(path.into_inner(), user.id(), edit.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "post": post })))
}

/// POST /post/{id}/delete
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .engagement
        .delete_post(path.into_inner(), user.id())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /post/{post_id}/comment/{comment_id}/like
pub async fn toggle_comment_like(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .engagement
        .toggle_comment_like(post_id, comment_id, user.id())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /post/{post_id}/comment/{comment_id}/delete
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    state
        .engagement
        .delete_comment(post_id, comment_id, user.id())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
