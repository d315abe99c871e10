//! Cookie session guard
//!
//! Decodes the session cookie once per request and, when the token is valid,
//! stores the caller's `UserId` in the request extensions. Requests without a
//! valid cookie pass through anonymously; routes that require a session
//! extract `UserId` (or a richer context built on it) and are redirected to
//! the login page otherwise.
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use crypto_core::TokenSigner;
use futures::future::{ready, Ready};
use std::sync::Arc;
use uuid::Uuid;

/// Where unauthenticated callers are sent
pub const LOGIN_PATH: &str = "/login";

/// User ID extracted from the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Rejection for routes that need a session; renders as a redirect to login.
#[derive(Debug, thiserror::Error)]
#[error("authentication required")]
pub struct SessionRequired;

impl ResponseError for SessionRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::SEE_OTHER
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, LOGIN_PATH))
            .finish()
    }
}

/// Session guard middleware factory
#[derive(Clone)]
pub struct SessionGuard {
    signer: Arc<TokenSigner>,
    cookie_name: String,
}

impl SessionGuard {
    pub fn new(signer: Arc<TokenSigner>, cookie_name: impl Into<String>) -> Self {
        Self {
            signer,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGuardService {
            service,
            signer: self.signer.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionGuardService<S> {
    service: S,
    signer: Arc<TokenSigner>,
    cookie_name: String,
}

impl<S, B> Service<ServiceRequest> for SessionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Copy the token out first; no extension borrow may be alive when we insert.
        let token = req
            .cookie(&self.cookie_name)
            .map(|cookie| cookie.value().to_string());

        if let Some(token) = token {
            match self.signer.user_id(&token) {
                Ok(user_id) => {
                    req.extensions_mut().insert(UserId(user_id));
                }
                Err(e) => {
                    tracing::debug!(error = %e, path = %req.path(), "Session cookie rejected");
                }
            }
        }

        self.service.call(req)
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<UserId>().copied() {
            Some(user_id) => ready(Ok(user_id)),
            None => ready(Err(SessionRequired.into())),
        }
    }
}
