//! # Actix Middleware Library
//!
//! Middleware components shared by the social backend's Actix services
//!
//! ## Modules
//! - `session`: cookie session guard that resolves the caller's `UserId`

pub mod session;

pub use session::{SessionGuard, SessionRequired, UserId, LOGIN_PATH};
