//! Security middleware for Actix Web.
//!
//! # Spring Equivalent
//! `SecurityFilterChain` / `FilterChainProxy`

use std::rc::Rc;

use actix_service::{Service, Transform};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::{Error, HttpMessage};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::trace;

use crate::http::security::config::{Authenticator, Authorizer};

/// Security middleware factory.
///
/// Requests go through bypass check, authentication, then authorization.
/// Bypassed requests are forwarded without looking at the session.
///
/// Session-backed authenticators need `SessionMiddleware` registered after
/// this transform, so that it wraps it.
///
/// # Example
/// ```ignore
/// App::new()
///     .wrap(SecurityTransform::new(
///         SessionAuthenticator::new(session_config.clone()),
///         RequestMatcherAuthorizer::new(policy.clone()),
///     ))
///     .wrap(SessionMiddleware::new(CookieSessionStore::default(), key.clone()))
/// ```
#[derive(Clone)]
pub struct SecurityTransform<Auth, Autho> {
    authenticator: Auth,
    authorizer: Autho,
}

impl<Auth, Autho> SecurityTransform<Auth, Autho> {
    pub fn new(authenticator: Auth, authorizer: Autho) -> Self {
        SecurityTransform {
            authenticator,
            authorizer,
        }
    }
}

impl<S, B, Auth, Autho> Transform<S, ServiceRequest> for SecurityTransform<Auth, Autho>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    Auth: Authenticator + Clone + 'static,
    Autho: Authorizer<B> + Clone + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SecurityService<Auth, Autho, S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SecurityService {
            authenticator: self.authenticator.clone(),
            authorizer: self.authorizer.clone(),
            service: Rc::new(service),
        })
    }
}

/// Security middleware service.
///
/// # Spring Equivalent
/// `FilterChainProxy`
pub struct SecurityService<Auth, Autho, S> {
    authenticator: Auth,
    authorizer: Autho,
    service: Rc<S>,
}

impl<Auth, Autho, S, B> Service<ServiceRequest> for SecurityService<Auth, Autho, S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    Auth: Authenticator,
    Autho: Authorizer<B>,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        // Step 1: static resources skip security altogether
        if self.authorizer.bypasses(&req) {
            trace!("{} bypasses security", req.path());
            let fut = service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            });
        }

        // Step 2: authenticate, handlers see the principal without password
        let principal = self.authenticator.get_principal(&req);
        if let Some(ref p) = principal {
            req.extensions_mut().insert(p.erase_credentials());
        }

        // Step 3: authorize
        let next = move |req: ServiceRequest| -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>> {
            Box::pin(service.call(req))
        };
        self.authorizer.process(req, principal.as_ref(), next)
    }
}
