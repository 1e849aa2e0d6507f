//! Error types.
//!
//! - [`ConfigError`] - policy and principal configuration problems, fatal at startup
//! - [`AuthError`] - HTTP-facing authentication/authorization errors
//! - [`AuthFailure`] - outcome of a failed login attempt

pub use auth_error::{AuthError, AuthFailure};
pub use config_error::ConfigError;

mod auth_error;
mod config_error;
