#![allow(dead_code)]

use social_service::config::AuthConfig;
use social_service::domain::models::{NewUser, User, DEFAULT_PROFILE_PIC};
use social_service::services::RegisterRequest;
use social_service::{AppState, Repositories};

pub const TEST_SECRET: &str = "test-secret-key-that-is-at-least-32-bytes";
pub const PASSWORD: &str = "password123";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        session_ttl_secs: 3600,
        cookie_name: "authToken".to_string(),
        default_profile_pic: DEFAULT_PROFILE_PIC.to_string(),
    }
}

pub fn memory_state() -> AppState {
    AppState::in_memory(&auth_config()).expect("in-memory state")
}

pub fn state_with(repos: Repositories) -> AppState {
    AppState::new(repos, &auth_config()).expect("state")
}

pub fn register_request(name: &str) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: PASSWORD.to_string(),
        age: 30,
    }
}

pub async fn register(state: &AppState, name: &str) -> User {
    state
        .accounts
        .register(register_request(name))
        .await
        .expect("register user")
        .user
}

/// Services plus direct access to the storage they share
pub struct Harness {
    pub repos: Repositories,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_repos(Repositories::in_memory())
    }

    pub fn with_repos(repos: Repositories) -> Self {
        let state = state_with(repos.clone());
        Self { repos, state }
    }

    /// Insert a user without paying for password hashing
    pub async fn seed_user(&self, name: &str) -> User {
        self.repos
            .users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                age: 30,
                password_hash: "not-a-real-hash".to_string(),
                profile_pic: DEFAULT_PROFILE_PIC.to_string(),
            })
            .await
            .expect("seed user")
    }
}
