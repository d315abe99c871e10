mod common;

use actix_middleware::SessionGuard;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use social_service::handlers;
use social_service::metrics::MetricsMiddleware;
use social_service::AppState;

macro_rules! init_app {
    ($state:expr) => {{
        let state: AppState = $state;
        let signer = state.signer();
        let cookie_name = state.cookie_name().to_string();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(MetricsMiddleware)
                .wrap(SessionGuard::new(signer, cookie_name))
                .configure(handlers::configure),
        )
        .await
    }};
}

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "authToken")
        .expect("session cookie")
        .into_owned()
}

fn register_body(name: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "password": common::PASSWORD,
        "age": 30,
    })
}

#[actix_rt::test]
async fn protected_routes_redirect_to_login_without_session() {
    let app = init_app!(common::memory_state());

    for (method, uri) in [
        ("GET", "/profile"),
        ("GET", "/notifications"),
        ("POST", "/post"),
        ("POST", "/notifications/clear"),
    ] {
        let req = match method {
            "GET" => test::TestRequest::get().uri(uri),
            _ => test::TestRequest::post().uri(uri).set_json(json!({})),
        }
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{} {}", method, uri);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    }
}

#[actix_rt::test]
async fn forged_cookie_is_treated_as_anonymous() {
    let app = init_app!(common::memory_state());

    let req = test::TestRequest::get()
        .uri("/profile")
        .cookie(Cookie::new("authToken", "not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // Optional-viewer routes still work
    let req = test::TestRequest::get()
        .uri("/all-posts")
        .cookie(Cookie::new("authToken", "not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn register_login_and_post_flow() {
    let app = init_app!(common::memory_state());

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(register_body("Bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bob_cookie = session_cookie(&resp);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "bob@example.com");
    assert!(body["user"].get("password_hash").is_none());
    let bob_id = body["user"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "bob@example.com", "password": common::PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login_cookie = session_cookie(&resp);

    let req = test::TestRequest::post()
        .uri("/post")
        .cookie(login_cookie.clone())
        .set_json(json!({ "title": "Hello", "body": "World" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let post_id = body["post"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["post"]["owner_id"], bob_id.as_str());

    let req = test::TestRequest::post()
        .uri("/post")
        .cookie(bob_cookie.clone())
        .set_json(json!({ "title": "", "body": "World" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let req = test::TestRequest::get().uri("/all-posts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["id"], post_id.as_str());
    assert_eq!(body["posts"][0]["owner"]["name"], "Bob");

    let req = test::TestRequest::get()
        .uri(&format!("/user/{}", bob_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["profile"]["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["profile"]["is_following"], false);
}

#[actix_rt::test]
async fn like_follow_and_notifications_over_http() {
    let app = init_app!(common::memory_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(register_body("Bob"))
            .to_request(),
    )
    .await;
    let bob = session_cookie(&resp);
    let body: Value = test::read_body_json(resp).await;
    let bob_id = body["user"]["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(register_body("Carol"))
            .to_request(),
    )
    .await;
    let carol = session_cookie(&resp);

    let req = test::TestRequest::post()
        .uri(&format!("/user/{}/follow", bob_id))
        .cookie(carol.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["following"], true);

    let req = test::TestRequest::post()
        .uri(&format!("/user/{}/follow", bob_id))
        .cookie(bob.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/post")
        .cookie(bob.clone())
        .set_json(json!({ "title": "Hello", "body": "World" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = body["post"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/like", post_id))
        .cookie(carol.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "liked": true, "like_count": 1 }));

    let req = test::TestRequest::get()
        .uri("/notifications/unread-count")
        .cookie(bob.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["unread"], 2);

    // Viewing lists the notifications as they were, then marks them read
    let req = test::TestRequest::get()
        .uri("/notifications")
        .cookie(bob.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let listed = body["notifications"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["kind"], "like");
    assert_eq!(listed[1]["kind"], "follow");
    assert!(listed.iter().all(|n| n["read"] == false));

    let req = test::TestRequest::get()
        .uri("/notifications/unread-count")
        .cookie(bob.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["unread"], 0);

    // Carol follows Bob, so she got his post
    let req = test::TestRequest::get()
        .uri("/notifications")
        .cookie(carol.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["notifications"][0]["kind"], "post");
    assert_eq!(body["notifications"][0]["post_title"], "Hello");

    let req = test::TestRequest::post()
        .uri("/notifications/clear")
        .cookie(bob.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["cleared"], 2);
}

#[actix_rt::test]
async fn non_owner_delete_is_forbidden() {
    let app = init_app!(common::memory_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(register_body("Bob"))
            .to_request(),
    )
    .await;
    let bob = session_cookie(&resp);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(register_body("Eve"))
            .to_request(),
    )
    .await;
    let eve = session_cookie(&resp);

    let req = test::TestRequest::post()
        .uri("/post")
        .cookie(bob.clone())
        .set_json(json!({ "title": "Hello", "body": "World" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = body["post"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/delete", post_id))
        .cookie(eve)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/delete", post_id))
        .cookie(bob)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/all-posts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["posts"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn account_errors_map_to_status_codes() {
    let app = init_app!(common::memory_state());

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(register_body("Bob"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(register_body("Bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "bob@example.com", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_CREDENTIALS");

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "whatever1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn search_logout_and_health() {
    let app = init_app!(common::memory_state());

    let req = test::TestRequest::get().uri("/search?q=").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/all-posts");

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(register_body("Margaret"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/search?q=GAR").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["name"], "Margaret");

    let req = test::TestRequest::get().uri("/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    let removal = session_cookie(&resp);
    assert_eq!(removal.value(), "");

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn search_term_is_matched_as_typed() {
    let h = common::Harness::new();
    h.seed_user("Ada Lovelace").await;
    h.seed_user("Adam").await;
    let app = init_app!(h.state.clone());

    let req = test::TestRequest::get().uri("/search?q=ada%20").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["query"], "ada ");
    let names: Vec<_> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Ada Lovelace"]);

    let req = test::TestRequest::get().uri("/search?q=%20%20").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/all-posts");
}
