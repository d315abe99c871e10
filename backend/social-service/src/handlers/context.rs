//! Per-request caller context built on the session guard's `UserId`

use actix_middleware::UserId;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::domain::models::User;
use crate::error::AppError;

/// The signed-in caller, resolved to a stored account.
///
/// Extraction fails with `Unauthenticated` (a redirect to the login page)
/// when there is no valid session or its user is gone. Use
/// `Option<CurrentUser>` where a viewer is optional.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user_id = req.extensions().get::<UserId>().map(|u| u.0);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let user_id =
                user_id.ok_or_else(|| AppError::Unauthenticated("No valid session".to_string()))?;
            let state = state.ok_or_else(|| {
                AppError::Internal("Application state is not registered".to_string())
            })?;

            let user = state.accounts.current_user(user_id).await?;
            Ok(CurrentUser(user))
        })
    }
}
