pub mod auth;
pub mod context;
pub mod notifications;
pub mod posts;
pub mod users;

use actix_web::{web, HttpResponse};

pub use context::CurrentUser;

/// Liveness probe
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "social-service",
    }))
}

/// Register every application route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        // Accounts
        .route("/register", web::post().to(auth::register))
        .route("/login", web::get().to(auth::login_page))
        .route("/login", web::post().to(auth::login))
        .route("/logout", web::get().to(auth::logout))
        .route("/updateProfilePic", web::post().to(users::update_profile_pic))
        .route("/profile", web::get().to(users::own_profile))
        // Posts
        .route("/all-posts", web::get().to(posts::feed))
        .route("/post", web::post().to(posts::create_post))
        .route("/post/{id}/like", web::post().to(posts::toggle_like))
        .route("/post/{id}/comment", web::post().to(posts::add_comment))
        .route("/post/{id}/edit", web::post().to(posts::edit_post))
        .route("/post/{id}/delete", web::post().to(posts::delete_post))
        .route(
            "/post/{post_id}/comment/{comment_id}/like",
            web::post().to(posts::toggle_comment_like),
        )
        .route(
            "/post/{post_id}/comment/{comment_id}/delete",
            web::post().to(posts::delete_comment),
        )
        // Social graph
        .route("/search", web::get().to(users::search))
        .route("/user/{id}", web::get().to(users::profile))
        .route("/user/{id}/follow", web::post().to(users::follow))
        .route("/user/{id}/followers", web::get().to(users::followers))
        // Notifications
        .route("/notifications", web::get().to(notifications::list))
        .route("/notifications/read", web::post().to(notifications::mark_all_read))
        .route("/notifications/clear", web::post().to(notifications::clear))
        .route(
            "/notifications/unread-count",
            web::get().to(notifications::unread_count),
        );
}
