use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::context::CurrentUser;
use crate::app_state::AppState;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct ProfilePicRequest {
    #[serde(default)]
    pub profile_pic: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// POST /updateProfilePic
pub async fn update_profile_pic(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<ProfilePicRequest>,
) -> Result<HttpResponse> {
    let user = state
        .accounts
        .update_profile_pic(user.id(), &req.profile_pic)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

/// GET /profile
pub async fn own_profile(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let profile = state.graph.profile(user.id(), Some(user.id())).await?;
    let unread = state.notifications.unread_count(user.id()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "user": user.0,
        "profile": profile,
        "unread_notifications": unread,
    })))
}

/// GET /search?q=
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    // Blank queries redirect; anything else is matched as typed
    if query.q.trim().is_empty() {
        return Ok(HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/all-posts"))
            .finish());
    }

    let users = state.graph.search(&query.q).await?;
    Ok(HttpResponse::Ok().json(json!({ "query": query.q, "users": users })))
}

/// GET /user/{id}
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let profile = state
        .graph
        .profile(path.into_inner(), viewer.map(|v| v.id()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}

/// POST /user/{id}/follow
pub async fn follow(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state.graph.follow(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "following": outcome.is_following() })))
}

/// GET /user/{id}/followers
pub async fn followers(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let followers = state.graph.followers(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "followers": followers })))
}
