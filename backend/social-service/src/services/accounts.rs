use crypto_core::{hash_password, verify_password, TokenSigner};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::{NewUser, User};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150."))]
    pub age: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// A user together with a freshly signed session token
#[derive(Debug, Clone)]
pub struct AccountSession {
    pub user: User,
    pub token: String,
}

/// Registration, login and account settings
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    signer: Arc<TokenSigner>,
    default_profile_pic: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        signer: Arc<TokenSigner>,
        default_profile_pic: impl Into<String>,
    ) -> Self {
        Self {
            users,
            signer,
            default_profile_pic: default_profile_pic.into(),
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AccountSession> {
        req.validate()?;

        let email = normalize_email(&req.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "A user with this email already exists.".to_string(),
            ));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(NewUser {
                name: req.name.trim().to_string(),
                email,
                age: req.age,
                password_hash,
                profile_pic: self.default_profile_pic.clone(),
            })
            .await?;
        info!(user_id = %user.id, "User registered");

        let token = self.signer.issue(user.id)?;
        Ok(AccountSession { user, token })
    }

    /// Unknown email and wrong password fail the same way
    pub async fn login(&self, req: LoginRequest) -> Result<AccountSession> {
        req.validate().map_err(|_| AppError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&normalize_email(&req.email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        let token = self.signer.issue(user.id)?;
        Ok(AccountSession { user, token })
    }

    /// Resolve a session's user id to the stored account
    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Session user no longer exists".to_string()))
    }

    /// Point the profile picture at an already stored image
    pub async fn update_profile_pic(&self, user_id: Uuid, reference: &str) -> Result<User> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AppError::Validation("No file uploaded".to_string()));
        }

        if !self.users.set_profile_pic(user_id, reference).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.current_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DEFAULT_PROFILE_PIC;
    use crate::repository::InMemoryStore;

    fn service() -> AccountService {
        let signer = TokenSigner::new(&"k".repeat(32), 3600).unwrap();
        AccountService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(signer),
            DEFAULT_PROFILE_PIC,
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            age: 36,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let accounts = service();
        let registered = accounts
            .register(register_request("Ada@Example.com"))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "ada@example.com");
        assert_eq!(registered.user.profile_pic, DEFAULT_PROFILE_PIC);
        assert_ne!(registered.user.password_hash, "correct horse");

        let session = accounts
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.id, registered.user.id);
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let accounts = service();

        let mut req = register_request("not-an-email");
        assert!(matches!(
            accounts.register(req.clone()).await.unwrap_err(),
            AppError::Validation(_)
        ));

        req = register_request("ada@example.com");
        req.password = "short".to_string();
        assert!(matches!(
            accounts.register(req.clone()).await.unwrap_err(),
            AppError::Validation(_)
        ));

        req = register_request("ada@example.com");
        req.age = 151;
        assert!(matches!(
            accounts.register(req).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_update_profile_pic_requires_reference() {
        let accounts = service();
        let user = accounts
            .register(register_request("ada@example.com"))
            .await
            .unwrap()
            .user;

        let err = accounts.update_profile_pic(user.id, "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == "No file uploaded"));

        let updated = accounts
            .update_profile_pic(user.id, "/uploads/ada.png")
            .await
            .unwrap();
        assert_eq!(updated.profile_pic, "/uploads/ada.png");
    }

    #[tokio::test]
    async fn test_current_user_missing_is_unauthenticated() {
        let accounts = service();
        let err = accounts.current_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
