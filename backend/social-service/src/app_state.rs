use crypto_core::TokenSigner;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::Result;
use crate::repository::{InMemoryStore, NotificationRepository, PostRepository, UserRepository};
use crate::services::{AccountService, EngagementService, NotificationService, SocialGraphService};

/// The three storage seams the services are built on
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// All three seams backed by one process-local store
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            notifications: store,
        }
    }
}

/// Shared application state, registered once as `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub graph: SocialGraphService,
    pub engagement: EngagementService,
    pub notifications: NotificationService,
    signer: Arc<TokenSigner>,
    cookie_name: String,
    session_ttl_secs: i64,
}

impl AppState {
    pub fn new(repos: Repositories, auth: &AuthConfig) -> Result<Self> {
        let signer = Arc::new(TokenSigner::new(&auth.jwt_secret, auth.session_ttl_secs)?);

        let notifications = NotificationService::new(
            repos.notifications.clone(),
            repos.users.clone(),
            repos.posts.clone(),
        );
        let engagement = EngagementService::new(
            repos.posts.clone(),
            repos.users.clone(),
            notifications.clone(),
        );
        let graph = SocialGraphService::new(
            repos.users.clone(),
            engagement.clone(),
            notifications.clone(),
        );
        let accounts = AccountService::new(
            repos.users,
            signer.clone(),
            auth.default_profile_pic.clone(),
        );

        Ok(Self {
            accounts,
            graph,
            engagement,
            notifications,
            signer,
            cookie_name: auth.cookie_name.clone(),
            session_ttl_secs: auth.session_ttl_secs,
        })
    }

    pub fn in_memory(auth: &AuthConfig) -> Result<Self> {
        Self::new(Repositories::in_memory(), auth)
    }

    pub fn signer(&self) -> Arc<TokenSigner> {
        self.signer.clone()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_secs
    }
}
