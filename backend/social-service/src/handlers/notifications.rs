use actix_web::{web, HttpResponse};
use serde_json::json;

use super::context::CurrentUser;
use crate::app_state::AppState;
use crate::error::Result;

/// GET /notifications
///
/// Returns the list as stored, then marks everything read: viewing the page
/// counts as having seen all of them.
pub async fn list(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let notifications = state.notifications.list_for_user(user.id()).await?;
    state.notifications.mark_all_read(user.id()).await?;

    Ok(HttpResponse::Ok().json(json!({ "notifications": notifications })))
}

/// POST /notifications/read
pub async fn mark_all_read(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let marked = state.notifications.mark_all_read(user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

/// POST /notifications/clear
pub async fn clear(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let cleared = state.notifications.clear_all(user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "cleared": cleared })))
}

/// GET /notifications/unread-count
pub async fn unread_count(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let unread = state.notifications.unread_count(user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "unread": unread })))
}
