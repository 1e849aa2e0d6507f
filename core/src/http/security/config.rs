//! Configuration traits for authentication and authorization.
//!
//! # Spring Equivalent
//! `SecurityContextRepository` and `AuthorizationManager` interfaces

use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::Error;
use futures_util::future::LocalBoxFuture;

use crate::http::security::user::Principal;

/// Recovers the principal of an incoming request.
///
/// # Spring Equivalent
/// `SecurityContextRepository.loadContext`
pub trait Authenticator {
    /// Returns the principal bound to the request, `None` when anonymous.
    fn get_principal(&self, req: &ServiceRequest) -> Option<Principal>;
}

/// Decides whether a request may reach the inner service.
///
/// # Spring Equivalent
/// `AuthorizationManager` / `ExceptionTranslationFilter`
///
/// `process` resolves to:
/// - `EitherBody::left()` when forwarding to the inner service
/// - `EitherBody::right()` for responses produced here (redirects, forbidden)
pub trait Authorizer<B> {
    /// True when the request skips security processing entirely,
    /// including authentication.
    fn bypasses(&self, _req: &ServiceRequest) -> bool {
        false
    }

    /// Processes the authorization decision.
    ///
    /// # Arguments
    /// * `req` - The incoming request
    /// * `principal` - The authenticated principal, if any
    /// * `next` - Closure to call the next service in the chain
    fn process(
        &self,
        req: ServiceRequest,
        principal: Option<&Principal>,
        next: impl FnOnce(ServiceRequest) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>
            + 'static,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>;
}
