use actix_middleware::LOGIN_PATH;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{http::header, web, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;
use crate::error::Result;
use crate::services::{LoginRequest, RegisterRequest};

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build(state.cookie_name().to_string(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(state.session_ttl_secs()))
        .finish()
}

/// POST /register
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let session = state.accounts.register(req.into_inner()).await?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&state, session.token))
        .json(json!({ "user": session.user })))
}

/// GET /login
///
/// Landing point for redirected browsers; credentials go to `POST /login`.
pub async fn login_page() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Please log in." }))
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let session = state.accounts.login(req.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&state, session.token))
        .json(json!({ "user": session.user })))
}

/// GET /logout
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    let mut cookie = Cookie::build(state.cookie_name().to_string(), "")
        .path("/")
        .finish();
    cookie.make_removal();

    HttpResponse::SeeOther()
        .cookie(cookie)
        .insert_header((header::LOCATION, LOGIN_PATH))
        .finish()
}
